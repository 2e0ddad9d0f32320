use sb_core::error::AppError;

/// A single blocking text-generation call: one prompt in, one text blob out.
pub trait Llm: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

pub mod gemini_llm;
