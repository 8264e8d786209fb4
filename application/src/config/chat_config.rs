//! Chat behavior configuration.
//!
//! [`ChatConfig`] groups the static parameters that control
//! [`SendLifecycleController`](crate::use_cases::send_message::SendLifecycleController).
//! These are application-layer concerns, not domain policy.

use chatline_domain::TranscriptLabels;
use std::time::Duration;

/// Apology shown as an error turn when a send fails
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// How chat history reaches the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistencePolicy {
    /// One write per completed turn pair
    #[default]
    Immediate,
    /// Coalesce writes until the conversation has been quiet for the period
    Debounced { quiet_period: Duration },
}

/// Send lifecycle parameters.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Names used when exporting a transcript
    pub labels: TranscriptLabels,
    /// Greeting turn shown on an empty conversation (never persisted)
    pub welcome_message: Option<String>,
    /// Fixed content of the error turn appended on a failed send
    pub error_message: String,
    /// Upper bound for a single endpoint call
    pub request_timeout: Duration,
    /// When history writes happen
    pub persistence: PersistencePolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            labels: TranscriptLabels::default(),
            welcome_message: None,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            request_timeout: Duration::from_secs(30),
            persistence: PersistencePolicy::Immediate,
        }
    }
}

impl ChatConfig {
    // ==================== Builder Methods ====================

    pub fn with_labels(mut self, labels: TranscriptLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = Some(message.into());
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_persistence(mut self, persistence: PersistencePolicy) -> Self {
        self.persistence = persistence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ChatConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.persistence, PersistencePolicy::Immediate);
        assert_eq!(config.error_message, DEFAULT_ERROR_MESSAGE);
        assert!(config.welcome_message.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = ChatConfig::default()
            .with_welcome_message("Hi!")
            .with_error_message("Oops")
            .with_request_timeout(Duration::from_secs(5))
            .with_persistence(PersistencePolicy::Debounced {
                quiet_period: Duration::from_millis(1000),
            });

        assert_eq!(config.welcome_message.as_deref(), Some("Hi!"));
        assert_eq!(config.error_message, "Oops");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(matches!(
            config.persistence,
            PersistencePolicy::Debounced { .. }
        ));
    }
}
