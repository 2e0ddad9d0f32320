pub mod cards;
pub mod extract;
pub mod gemini;
pub mod images;
pub mod llm;

#[cfg(test)]
mod tests {
    use super::gemini::GeminiClient;

    #[test]
    fn enforces_https_or_loopback_base_url() {
        assert!(GeminiClient::new("https://generativelanguage.googleapis.com", None).is_ok());
        assert!(GeminiClient::new("https://generativelanguage.googleapis.com/", None).is_ok()); // trailing slash is trimmed
        assert!(GeminiClient::new("http://127.0.0.1:8089", None).is_ok());
        assert!(GeminiClient::new("http://127.0.0.1", None).is_ok());

        assert!(GeminiClient::new("http://generativelanguage.googleapis.com", None).is_err());
        assert!(GeminiClient::new("http://localhost:8089", None).is_err());
        assert!(GeminiClient::new("ftp://example.com", None).is_err());

        // Harden against prefix-based bypasses.
        assert!(GeminiClient::new("http://127.0.0.1.evil.com:8089", None).is_err());
        assert!(GeminiClient::new("http://127.0.0.1@evil.com:8089", None).is_err());
        assert!(GeminiClient::new("https://example.com/v1beta", None).is_err());
        assert!(GeminiClient::new("http://127.0.0.1:", None).is_err());
        assert!(GeminiClient::new("http://127.0.0.1:0", None).is_err());
        assert!(GeminiClient::new("http://127.0.0.1:99999", None).is_err());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let client = GeminiClient::new("https://generativelanguage.googleapis.com", Some("  ".into()))
            .expect("client");
        assert!(!client.has_api_key());
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let client = GeminiClient::new(
            "https://generativelanguage.googleapis.com",
            Some("secret-key".into()),
        )
        .expect("client");
        assert!(!format!("{client:?}").contains("secret-key"));
        assert_eq!(
            client.generate_content_url("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
