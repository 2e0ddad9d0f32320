use sb_core::error::{AppError, AI_GENERATION_FAILED};
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::gemini::GeminiClient;

#[derive(Debug, Clone)]
pub struct GeminiLlm {
    client: GeminiClient,
}

impl GeminiLlm {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn request_body(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: [Content {
            parts: [Part { text: prompt }],
        }],
    }
}

/// Concatenated text of the first candidate.
fn response_text(resp: GenerateResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl Llm for GeminiLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let Some(api_key) = self.client.api_key() else {
            return Err(AppError::new(
                AI_GENERATION_FAILED,
                "Generation provider API key is not configured",
            )
            .with_details("set GOOGLE_GEMINI_API_KEY"));
        };

        let url = self.client.generate_content_url(model);
        let body = serde_json::to_value(request_body(prompt)).map_err(|e| {
            AppError::new(AI_GENERATION_FAILED, "Failed to encode generation request")
                .with_details(e.to_string())
        })?;

        // Single best-effort call: no timeout and no retry.
        let resp = ureq::post(&url)
            .set("x-goog-api-key", api_key)
            .send_json(body);

        match resp {
            Ok(r) => {
                let v: GenerateResponse = r.into_json().map_err(|e| {
                    AppError::new(AI_GENERATION_FAILED, "Failed to decode generation response")
                        .with_details(e.to_string())
                })?;
                response_text(v).ok_or_else(|| {
                    AppError::new(AI_GENERATION_FAILED, "Generation response was empty")
                })
            }
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                Err(
                    AppError::new(AI_GENERATION_FAILED, "Generation request failed")
                        .with_details(format!("status={status}; body={}", truncate(&body, 300)))
                        .with_retryable(status == 429 || status >= 500),
                )
            }
            Err(e) => Err(
                AppError::new(AI_GENERATION_FAILED, "Failed to call generation provider")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_generate_content_shape() {
        let v = serde_json::to_value(request_body("hello")).expect("encode");
        assert_eq!(v, serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]}));
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"```json\n"},{"text":"{}\n```"}]}},
                              {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .expect("decode");
        assert_eq!(response_text(resp).as_deref(), Some("```json\n{}\n```"));
    }

    #[test]
    fn blocked_or_empty_responses_have_no_text() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).expect("decode");
        assert_eq!(response_text(blocked), None);

        let empty: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .expect("decode");
        assert_eq!(response_text(empty), None);
    }

    #[test]
    fn missing_api_key_fails_without_network() {
        let client = GeminiClient::new("https://generativelanguage.googleapis.com", None)
            .expect("client");
        let err = GeminiLlm::new(client)
            .generate("gemini-2.0-flash", "prompt")
            .expect_err("no key");
        assert_eq!(err.code, AI_GENERATION_FAILED);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
