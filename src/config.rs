//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 50;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TOKEN_EXPIRY_DAYS: u64 = 7;
pub const DEFAULT_STATE_DIR: &str = ".snippetbox";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The base URL is not an absolute `http(s)` URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin without the `/api` suffix and without a trailing slash.
    pub base_url: String,
    pub timeouts: Timeouts,
    pub token_expiry_days: u64,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// Build a config for `base_url` with every other value at its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` is not `http(s)`.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeouts: Timeouts::default(),
            token_expiry_days: DEFAULT_TOKEN_EXPIRY_DAYS,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SNIPPETS_API_BASE_URL`: default `http://localhost:8000`
    /// - `SNIPPETS_REQUEST_TIMEOUT_SECS`: default 50
    /// - `SNIPPETS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SNIPPETS_TOKEN_EXPIRY_DAYS`: default 7
    /// - `SNIPPETS_STATE_DIR`: default `.snippetbox`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL is not `http(s)`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_base = std::env::var("SNIPPETS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("SNIPPETS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SNIPPETS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let state_dir = std::env::var("SNIPPETS_STATE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

        Ok(Self {
            base_url: normalize_base_url(&raw_base)?,
            timeouts,
            token_expiry_days: env_parse_u64("SNIPPETS_TOKEN_EXPIRY_DAYS", DEFAULT_TOKEN_EXPIRY_DAYS),
            state_dir,
        })
    }

    /// Root of every REST endpoint, e.g. `http://localhost:8000/api`.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.base_url)
    }

    #[must_use]
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_days.saturating_mul(24 * 60 * 60))
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Trim whitespace and trailing slashes; require an `http(s)` scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for any other scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
