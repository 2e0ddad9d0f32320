use std::fmt;

use sb_core::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiClient {
    /// Create a client for the Gemini REST API.
    ///
    /// The base URL must be `https://`, or plain `http://127.0.0.1` for local stubs. A missing API
    /// key is accepted here; calls fail until one is configured.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let host = if let Some(rest) = base_url.strip_prefix("https://") {
            rest
        } else if let Some(rest) = base_url.strip_prefix("http://") {
            let local = rest == "127.0.0.1" || rest.starts_with("127.0.0.1:");
            if !local {
                return Err(AppError::new(
                    "AI_BASE_URL_INVALID",
                    "Plain http is only allowed for 127.0.0.1",
                )
                .with_details(format!("base_url={base_url}")));
            }
            rest
        } else {
            return Err(AppError::new(
                "AI_BASE_URL_INVALID",
                "Provider base URL must start with https://",
            )
            .with_details(format!("base_url={base_url}")));
        };

        // Harden against userinfo and path smuggling; only scheme://host[:port] is accepted.
        if host.is_empty() || host.contains(['@', '/', '?', '#']) {
            return Err(AppError::new(
                "AI_BASE_URL_INVALID",
                "Provider base URL must be scheme://host[:port]",
            )
            .with_details(format!("base_url={base_url}")));
        }
        if let Some((_, port)) = host.rsplit_once(':') {
            if !matches!(port.parse::<u16>(), Ok(p) if p > 0) {
                return Err(AppError::new(
                    "AI_BASE_URL_INVALID",
                    "Provider base URL has an invalid port",
                )
                .with_details(format!("base_url={base_url}")));
            }
        }

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Ok(Self { base_url, api_key })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn generate_content_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}
