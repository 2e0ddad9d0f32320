use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use sb_ai::gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub image_lookup: bool,
    pub client_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_lookup: true,
            client_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values keep the default and log a
    /// warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(raw) = get("HOST") {
            match raw.parse() {
                Ok(host) => cfg.host = host,
                Err(_) => log::warn!("Ignoring invalid HOST {raw:?}; using {}", cfg.host),
            }
        }
        if let Some(raw) = get("PORT") {
            match raw.parse() {
                Ok(port) => cfg.port = port,
                Err(_) => log::warn!("Ignoring invalid PORT {raw:?}; using {}", cfg.port),
            }
        }
        if let Some(raw) = get("SOURCEBOOK_IMAGE_LOOKUP") {
            match parse_switch(&raw) {
                Some(on) => cfg.image_lookup = on,
                None => log::warn!("Ignoring invalid SOURCEBOOK_IMAGE_LOOKUP {raw:?}; lookup stays on"),
            }
        }

        cfg.api_key = get("GOOGLE_GEMINI_API_KEY");
        if let Some(model) = get("GEMINI_MODEL") {
            cfg.model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            match GeminiClient::new(&url, None) {
                Ok(_) => cfg.base_url = url,
                Err(e) => log::warn!(
                    "Ignoring invalid GEMINI_BASE_URL {url:?} ({}); using {}",
                    e.user_message(),
                    cfg.base_url
                ),
            }
        }
        cfg.client_dir = get("SOURCEBOOK_CLIENT_DIR").map(PathBuf::from);
        cfg
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.socket_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("GOOGLE_GEMINI_API_KEY", " abc "),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9000"),
            ("SOURCEBOOK_IMAGE_LOOKUP", "OFF"),
            ("SOURCEBOOK_CLIENT_DIR", "client/dist"),
        ]);
        assert_eq!(cfg.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.model, "gemini-1.5-pro");
        assert_eq!(cfg.base_url, "http://127.0.0.1:9000");
        assert!(!cfg.image_lookup);
        assert_eq!(cfg.client_dir, Some(PathBuf::from("client/dist")));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = config_from(&[
            ("HOST", "not-an-ip"),
            ("PORT", "70000"),
            ("SOURCEBOOK_IMAGE_LOOKUP", "maybe"),
            ("GOOGLE_GEMINI_API_KEY", "   "),
            ("GEMINI_BASE_URL", "http://example.com"),
        ]);
        assert_eq!(cfg, Config::default());
    }
}
