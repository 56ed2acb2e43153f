//! Client configuration parsed from environment variables.

use crate::net::ApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. `None` lets a hung request wait indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Build a config for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] if the URL is not `http(s)://`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self { base_url: normalize_base_url(base_url)?, ..Self::default() })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `WORKMANAGER_API_URL`: default `http://localhost:5000/api`
    /// - `WORKMANAGER_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WORKMANAGER_REQUEST_TIMEOUT_SECS`: unset means no timeout
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] if the API URL is malformed.
    pub fn from_env() -> Result<Self, ApiError> {
        let raw_url = std::env::var("WORKMANAGER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        Ok(Self {
            base_url: normalize_base_url(&raw_url)?,
            connect_timeout_secs: env_parse_u64("WORKMANAGER_CONNECT_TIMEOUT_SECS")
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout_secs: env_parse_u64("WORKMANAGER_REQUEST_TIMEOUT_SECS"),
        })
    }
}

fn env_parse_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ApiError::InvalidConfig(format!("base URL must start with http:// or https://, got '{raw}'")));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
