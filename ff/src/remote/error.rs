//! Generation client error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the generation service
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// The service could not be reached or its answer could not be understood
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::Timeout(_)
        )
    }

    /// HTTP status of a service error response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is worth retrying for idempotent requests
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Remote { status, .. } => is_retryable_status(*status),
            ClientError::Transport(e) => e.is_connect() || e.is_timeout(),
            ClientError::Timeout(_) => true,
            ClientError::InvalidRequest(_) => false,
            ClientError::Decode(_) => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
