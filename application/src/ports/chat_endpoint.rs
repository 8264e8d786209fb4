//! Chat endpoint port
//!
//! Defines the interface for talking to the remote chat service.

use async_trait::async_trait;
use chatline_domain::SessionId;
use std::time::Duration;
use thiserror::Error;

/// Any unsuccessful outcome of a chat request.
///
/// Callers treat every variant the same way; the variants only exist so the
/// failure can be logged precisely.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Remote chat service
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send one user message and return the service's textual reply.
    async fn send(&self, message: &str, session_id: &SessionId) -> Result<String, TransportError>;
}
