//! Wire transport for API requests.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway talks to the server only through [`Transport`]. The production
//! implementation is [`HttpTransport`] (`reqwest` with a cookie jar, so the
//! HTTP-only session cookies set by the server ride along automatically);
//! tests substitute a scripted mock.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become [`ApiError::Status`] carrying the server's `error`
//! message. Bodies that fail to parse on an error response are treated as
//! empty so the status is never lost.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;

use super::error::ApiError;
use crate::config::ClientConfig;

/// Cookie the server uses for the short-lived access credential.
pub const SESSION_COOKIE: &str = "access_token_cookie";

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_SIGNUP: &str = "/auth/signup";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const AUTH_ME: &str = "/auth/me";
pub const AUTH_REFRESH: &str = "/auth/refresh";

/// Endpoints that belong to the authentication flow and must never trigger a
/// session refresh themselves.
const AUTH_FLOW_ROUTES: [&str; 4] = [AUTH_LOGIN, AUTH_SIGNUP, AUTH_REFRESH, AUTH_ME];

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// A replayable API request. Paths are relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Set once the request has been through a refresh; a second 401 surfaces.
    pub(crate) retried: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, retried: false }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Whether this request targets the authentication flow itself.
    #[must_use]
    pub fn is_auth_route(&self) -> bool {
        AUTH_FLOW_ROUTES.iter().any(|route| self.path.starts_with(route))
    }
}

/// A successful (2xx) response. Empty bodies decode as `Value::Null`.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Returns `Err(ApiError::Status)` for non-2xx.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;

    /// Whether a session cookie is currently stored for the API origin.
    fn has_session_cookie(&self) -> bool;
}

/// `reqwest`-backed transport with a shared cookie jar.
pub struct HttpTransport {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    cookie_url: reqwest::Url,
}

impl HttpTransport {
    /// Build the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let cookie_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid base URL '{}': {e}", config.base_url)))?;
        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, jar, base_url: config.base_url.clone(), cookie_url })
    }

    /// Seed the jar with a raw `Set-Cookie` style value, e.g. to resume a
    /// session captured elsewhere.
    pub fn add_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.cookie_url);
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, %url, retried = request.retried, "api request");

        let builder = self.http.request(request.method.clone(), &url);
        let builder = if let Some(body) = &request.body { builder.json(body) } else { builder };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            let body = parse_body(&bytes).unwrap_or(Value::Null);
            return Err(ApiError::from_status(status, &body));
        }

        let body = parse_body(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }

    fn has_session_cookie(&self) -> bool {
        self.jar
            .cookies(&self.cookie_url)
            .and_then(|header| header.to_str().map(cookie_header_has_session).ok())
            .unwrap_or(false)
    }
}

pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn cookie_header_has_session(header: &str) -> bool {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == SESSION_COOKIE && !value.is_empty())
}

fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
}
