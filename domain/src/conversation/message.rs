//! Outgoing message value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// User input accepted for sending (Value Object)
///
/// Content is trimmed on construction; blank input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    content: String,
}

impl OutgoingMessage {
    /// Trim the raw input and reject it if nothing is left
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(DomainError::EmptyMessage)
        } else {
            Ok(Self {
                content: trimmed.to_string(),
            })
        }
    }

    /// Try to create a message, returning None for blank input
    pub fn try_new(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of characters (not bytes)
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for OutgoingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
