pub mod domain;
pub mod error;
pub mod export;
pub mod render;
pub mod session;
pub mod validate;
