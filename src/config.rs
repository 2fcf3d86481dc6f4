//! Process configuration from the environment

use crate::i18n::Language;
use crate::runtime::DEFAULT_IDLE_TIMEOUT;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ANALYSIS_API_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL hosting `/image-description` and `/social-posts`
    pub analysis_base_url: String,
    /// Language for sessions that do not pick one
    pub default_language: Language,
    pub max_image_bytes: usize,
    /// Sessions left untouched this long are dropped
    pub session_idle_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            analysis_base_url: DEFAULT_ANALYSIS_API_URL.to_string(),
            default_language: Language::En,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            session_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Values that fail to parse keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let analysis_base_url = lookup("ANALYSIS_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.analysis_base_url);

        let default_language = match lookup("CAPTION_CHAT_LANGUAGE") {
            Some(code) => Language::parse(&code).unwrap_or_else(|| {
                tracing::warn!(value = %code, "Unsupported CAPTION_CHAT_LANGUAGE, using default");
                defaults.default_language
            }),
            None => defaults.default_language,
        };

        Self {
            port: parse_or(&lookup, "CAPTION_CHAT_PORT", defaults.port),
            analysis_base_url,
            default_language,
            max_image_bytes: parse_or(
                &lookup,
                "CAPTION_CHAT_MAX_IMAGE_BYTES",
                defaults.max_image_bytes,
            ),
            session_idle_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CAPTION_CHAT_SESSION_IDLE_SECS",
                defaults.session_idle_timeout.as_secs(),
            )),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, "Invalid value, using default");
        default
    })
}
