//! Client error types

use thiserror::Error;

/// Errors that can occur when talking to an upstream service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape from {endpoint}")]
    UnexpectedShape { endpoint: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Sort a transport failure into timeout / unavailable / other
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Unavailable(
                err.url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown host".to_string()),
            )
        } else {
            ClientError::Request(err)
        }
    }
}
