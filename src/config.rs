//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_STORE_PATH: &str = "ledgergate-store.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API base URL is empty")]
    EmptyBaseUrl,

    #[error("API base URL must start with http:// or https://: {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl HttpTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub api_base_url: String,
    /// JSON file backing the persistent key-value store.
    pub store_path: PathBuf,
    pub timeouts: HttpTimeouts,
    /// Lifetime of toasts created through the severity shorthands.
    pub toast_duration: Duration,
    /// Theme fallback when no preference is stored.
    pub prefers_dark: bool,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `LEDGERGATE_API_BASE_URL`: default `http://localhost:3000`
    /// - `LEDGERGATE_STORE_PATH`: default `ledgergate-store.json`
    /// - `LEDGERGATE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LEDGERGATE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LEDGERGATE_TOAST_DURATION_MS`: default 3000
    /// - `LEDGERGATE_PREFERS_DARK`: default false
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(
            std::env::var("LEDGERGATE_API_BASE_URL")
                .ok()
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        let store_path = std::env::var("LEDGERGATE_STORE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse("LEDGERGATE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("LEDGERGATE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let toast_duration =
            Duration::from_millis(env_parse("LEDGERGATE_TOAST_DURATION_MS", DEFAULT_TOAST_DURATION_MS));
        let prefers_dark = env_parse("LEDGERGATE_PREFERS_DARK", false);

        Ok(Self { api_base_url, store_path, timeouts, toast_duration, prefers_dark })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            timeouts: HttpTimeouts::default(),
            toast_duration: Duration::from_millis(DEFAULT_TOAST_DURATION_MS),
            prefers_dark: false,
        }
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::UnsupportedScheme(trimmed.to_owned()));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
