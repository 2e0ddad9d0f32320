//! JSON extraction from free-form model output.
//!
//! Provider formatting is outside our control, so extraction is an explicit pipeline:
//!
//! 1. a fenced block labeled `json` (```` ```json ... ``` ````); when present its interior is
//!    authoritative and a parse error there is final,
//! 2. the whole response as bare JSON,
//! 3. the span from the first `{` to the last `}` (then `[` to `]`), for prose-wrapped replies.

use std::fmt;

use serde_json::Value;

use sb_core::error::{AppError, AI_PARSE_FAILED};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSource {
    Fenced,
    Bare,
    Embedded,
}

impl fmt::Display for JsonSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JsonSource::Fenced => "fenced code block",
            JsonSource::Bare => "bare response",
            JsonSource::Embedded => "embedded span",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractFailure {
    /// Nothing resembling JSON in the response.
    NoJson,
    InvalidFenced(String),
    InvalidBare(String),
    InvalidEmbedded(String),
}

impl fmt::Display for ExtractFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractFailure::NoJson => f.write_str("model response contained no JSON"),
            ExtractFailure::InvalidFenced(e) => write!(f, "fenced JSON block is invalid: {e}"),
            ExtractFailure::InvalidBare(e) => write!(f, "response is not valid JSON: {e}"),
            ExtractFailure::InvalidEmbedded(e) => write!(f, "embedded JSON is invalid: {e}"),
        }
    }
}

impl ExtractFailure {
    pub fn into_app_error(self, message: &str) -> AppError {
        AppError::new(AI_PARSE_FAILED, message).with_details(self.to_string())
    }
}

/// Interior of the first ```` ```json ```` block, if the response has one.
pub fn fenced_json_block(raw: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets stable.
    let lower = raw.to_ascii_lowercase();
    let start = lower.find(JSON_FENCE)? + JSON_FENCE.len();
    let label_end = raw[start..].find('\n')? + start + 1;
    let body = &raw[label_end..];
    let end = body.find(FENCE)?;
    Some(body[..end].trim())
}

/// Span from the first `open` to the last `close`.
fn delimited_span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Object spans are tried before array spans so a bracketed aside ahead of the object does not
/// swallow it.
fn parse_embedded(raw: &str) -> Option<Result<Value, serde_json::Error>> {
    let mut first_err = None;
    for (open, close) in [('{', '}'), ('[', ']')] {
        let Some(span) = delimited_span(raw, open, close) else {
            continue;
        };
        match serde_json::from_str(span) {
            Ok(v) => return Some(Ok(v)),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    first_err.map(Err)
}

/// Run the extraction pipeline over a raw model response.
pub fn extract_json(raw: &str) -> Result<(Value, JsonSource), ExtractFailure> {
    if let Some(block) = fenced_json_block(raw) {
        return serde_json::from_str(block)
            .map(|v| (v, JsonSource::Fenced))
            .map_err(|e| ExtractFailure::InvalidFenced(e.to_string()));
    }

    let trimmed = raw.trim();
    let bare_err = match serde_json::from_str(trimmed) {
        Ok(v) => return Ok((v, JsonSource::Bare)),
        Err(e) => e,
    };

    match parse_embedded(trimmed) {
        Some(Ok(v)) => Ok((v, JsonSource::Embedded)),
        Some(Err(e)) => Err(ExtractFailure::InvalidEmbedded(e.to_string())),
        None if trimmed.starts_with(['{', '[']) => {
            Err(ExtractFailure::InvalidBare(bare_err.to_string()))
        }
        None => Err(ExtractFailure::NoJson),
    }
}
