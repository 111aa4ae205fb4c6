use crate::i18n::Language;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    /// `None` is a configuration error reported per fetch, not at startup.
    pub api_base_url: Option<String>,
    pub default_language: Language,
    pub language_store_path: Option<PathBuf>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/**
 * normalize_base_url
 * Trims whitespace and trailing slashes so paths can be appended with a single `/`.
 */
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn secs_var(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

impl Config {
    pub fn from_env() -> Self {
        let api_base_url = env::var("API_BASE_URL")
            .ok()
            .map(|v| normalize_base_url(&v))
            .filter(|v| !v.is_empty());
        if api_base_url.is_none() {
            log::warn!("API_BASE_URL is not set; every catalog request will fail");
        }

        let default_language = env::var("DEFAULT_LANGUAGE")
            .ok()
            .and_then(|v| Language::from_code(&v))
            .unwrap_or_default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8080".to_string()),
            api_base_url,
            default_language,
            language_store_path: env::var("LANGUAGE_STORE_PATH").ok().map(PathBuf::from),
            connect_timeout: secs_var("API_CONNECT_TIMEOUT_SECS", 3),
            request_timeout: secs_var("API_TIMEOUT_SECS", 8),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
