use serde::{Deserialize, Serialize};
use std::fmt;

/// Empty or missing required input. Surfaced as HTTP 400.
pub const VALIDATION_REQUIRED: &str = "VALIDATION_REQUIRED";
/// The generation provider call itself failed. Surfaced as HTTP 500.
pub const AI_GENERATION_FAILED: &str = "AI_GENERATION_FAILED";
/// The provider answered, but no JSON could be extracted from the text.
pub const AI_PARSE_FAILED: &str = "AI_PARSE_FAILED";
/// Export attempted with nothing selected.
pub const EXPORT_EMPTY_SELECTION: &str = "EXPORT_EMPTY_SELECTION";
/// A generation or refinement request is already outstanding.
pub const REQUEST_IN_FLIGHT: &str = "REQUEST_IN_FLIGHT";
/// Request body could not be decoded.
pub const REQUEST_BODY_INVALID: &str = "REQUEST_BODY_INVALID";

/// Single structured error shape used across backend layers and exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// True for errors caused by the caller's input rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code.as_str(),
            VALIDATION_REQUIRED | EXPORT_EMPTY_SELECTION | REQUEST_BODY_INVALID | REQUEST_IN_FLIGHT
        )
    }

    /// Short user-facing text: the message, followed by details when present.
    pub fn user_message(&self) -> String {
        match self.details.as_deref() {
            Some(d) if !d.is_empty() => format!("{}: {}", self.message, d),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
