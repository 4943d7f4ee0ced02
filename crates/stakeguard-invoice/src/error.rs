//! Error types for stakeguard-invoice

use thiserror::Error;

/// Result type alias using stakeguard-invoice Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when extracting invoice fields through a remote service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint answered with a non-success status
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    /// Endpoint answered `success: false`
    #[error("Extraction failed: {0}")]
    Unsuccessful(String),

    /// Response body did not match the expected payload shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}
