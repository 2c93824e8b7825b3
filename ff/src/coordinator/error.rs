//! Advisory errors surfaced by the coordinator

use thiserror::Error;

use crate::remote::ClientError;
use crate::store::StoreError;

/// Non-fatal error a coordinator operation leaves behind for the caller
///
/// Operations never return these directly; they record the most recent one
/// and yield `None`/`false`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatorError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("A floor plan is already being generated")]
    Busy,

    #[error("Could not reach the generation service: {0}")]
    Transport(String),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Local storage unavailable: {0}")]
    Durability(String),
}

impl CoordinatorError {
    /// Short machine-readable kind, for logs and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Busy => "busy",
            Self::Transport(_) => "transport",
            Self::Remote { .. } => "remote",
            Self::Durability(_) => "durability",
        }
    }
}

impl From<ClientError> for CoordinatorError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::InvalidRequest(message) => Self::Validation(message),
            ClientError::Remote { status, message } => Self::Remote {
                status,
                message: message.unwrap_or_else(|| format!("Generation service returned HTTP {status}")),
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        Self::Durability(e.to_string())
    }
}
