use crate::error::{AppError, VALIDATION_REQUIRED};

/// Require a non-blank text input, returning it trimmed.
///
/// `label` is the human-facing name used in the error message.
pub fn require_non_blank(field: &str, label: &str, value: Option<&str>) -> Result<String, AppError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(
            AppError::new(VALIDATION_REQUIRED, format!("{label} is required"))
                .with_details(format!("field={field}")),
        );
    }
    Ok(trimmed.to_string())
}

pub fn require_outcome(outcome: Option<&str>) -> Result<String, AppError> {
    require_non_blank("outcome", "Learning outcome", outcome)
}

pub fn require_draft(draft: Option<&str>) -> Result<String, AppError> {
    require_non_blank("draft", "Learning outcome draft", draft)
}
