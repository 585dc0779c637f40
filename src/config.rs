//! Client configuration parsed from environment variables.
//!
//! The API base URL is baked in at build time from `DALLI_API_URL` (the way
//! the web bundle reads its build-time variable) and may be overridden by
//! the same variable at run time.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

/// Build-time API base URL, falling back to the local development server.
pub const DEFAULT_API_URL: &str = match option_env!("DALLI_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};
pub const DEFAULT_STATE_DIR: &str = ".dalli";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{0}' (expected http:// or https://)")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash.
    pub api_url: String,
    /// Directory holding the persisted key-value file.
    pub state_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build a config for `api_url` with default state dir and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL is not http(s).
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            timeouts: Timeouts::default(),
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `DALLI_API_URL`: overrides the build-time base URL
    /// - `DALLI_STATE_DIR`: default `.dalli`
    /// - `DALLI_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DALLI_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the base URL is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("DALLI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let state_dir = std::env::var("DALLI_STATE_DIR").unwrap_or_else(|_| DEFAULT_STATE_DIR.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse_u64("DALLI_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("DALLI_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { api_url: normalize_api_url(&api_url)?, state_dir: PathBuf::from(state_dir), timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = ["http://", "https://"]
        .iter()
        .any(|scheme| trimmed.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));
    if !has_host {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}
