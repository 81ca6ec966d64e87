//! API Error Types
//!
//! Errors raised while talking to the Dazno backend over HTTP.

use thiserror::Error;

/// HTTP client error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Could not connect to the backend
    #[error("Backend unavailable")]
    Unavailable,

    /// Request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The HTTP client could not be built
    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl ApiError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Unavailable
        } else {
            ApiError::Request(e)
        }
    }

    /// Whether the request never got a usable answer
    ///
    /// Network failures and unreadable bodies are reported to the operator
    /// differently from errors the backend explained itself.
    pub fn is_network(&self) -> bool {
        !matches!(self, ApiError::Status { .. })
    }

    /// Message explaining the failure, as shown to the operator
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
