//! Error type shared by the transport, gateway, and stores.
//!
//! DESIGN
//! ======
//! `ApiError` is `Clone` because a single refresh failure is delivered to every
//! request queued behind it. Underlying `reqwest`/`serde_json` errors are
//! flattened to strings at the boundary for the same reason.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced by API requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("request failed"))]
    Status { status: u16, message: Option<String> },

    /// A response body could not be decoded into the expected type.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// A request payload could not be encoded as JSON.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// The task driving a refresh was dropped before the refresh settled.
    #[error("session refresh was abandoned")]
    RefreshAbandoned,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A configuration value was rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Coarse failure classes used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    Client,
    Server,
    Decode,
    Internal,
}

impl ApiError {
    /// Build a status error from a response body, pulling the server's
    /// `error` field when the body carries one.
    #[must_use]
    pub fn from_status(status: u16, body: &serde_json::Value) -> Self {
        let message = body
            .get("error")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned);
        Self::Status { status, message }
    }

    /// HTTP status of the failed response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Status { status: 401, .. } => ErrorKind::Unauthorized,
            Self::Status { status: 500..=599, .. } => ErrorKind::Server,
            Self::Status { .. } => ErrorKind::Client,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Encode(_) | Self::RefreshAbandoned | Self::HttpClientBuild(_) | Self::InvalidConfig(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The server's own error message, verbatim.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user: the server message, or `fallback` when the
    /// failure carried none.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_owned()
    }
}
