//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),
}

impl DomainError {
    /// Check if this error comes from blank user input
    pub fn is_empty_message(&self) -> bool {
        matches!(self, DomainError::EmptyMessage)
    }
}
