//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types.

use chatline_application::config::chat_config::DEFAULT_ERROR_MESSAGE;
use chatline_application::{ChatConfig, PersistencePolicy};
use chatline_domain::TranscriptLabels;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::http::chat_client::DEFAULT_FALLBACK_REPLY;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("endpoint.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("endpoint.url cannot be empty")]
    EmptyEndpointUrl,

    #[error("endpoint.url is not a valid http(s) URL: {0}")]
    InvalidEndpointUrl(String),

    #[error("history.debounce_ms cannot be 0 when persistence is \"debounced\"")]
    InvalidDebounce,
}

/// Raw endpoint configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEndpointConfig {
    /// URL the chat messages are POSTed to
    pub url: String,
    /// Timeout in seconds for one request
    pub timeout_seconds: u64,
}

impl Default for FileEndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000/chat".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Raw chat presentation configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Conversation title (transcript header and file name)
    pub title: String,
    /// Name shown for bot turns
    pub assistant_name: String,
    /// Name shown for user turns
    pub user_name: String,
    /// Greeting shown on an empty conversation
    pub welcome_message: Option<String>,
    /// Content of the error turn after a failed send
    pub error_message: String,
    /// Reply used when the service answers without a usable `response`
    pub fallback_reply: String,
    /// Character count above which the input counter is highlighted
    pub long_message_chars: usize,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            title: "Chatline".to_string(),
            assistant_name: "Assistant".to_string(),
            user_name: "You".to_string(),
            welcome_message: Some("Hello! How can I help you today?".to_string()),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            long_message_chars: 900,
        }
    }
}

/// When history is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilePersistenceMode {
    #[default]
    Immediate,
    Debounced,
}

/// Raw history configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHistoryConfig {
    /// Directory holding history records (defaults to the platform data dir)
    pub dir: Option<String>,
    /// Write after every turn pair, or debounce
    pub persistence: FilePersistenceMode,
    /// Quiet period for debounced writes
    pub debounce_ms: u64,
    /// Reject records larger than this many bytes
    pub max_bytes: Option<usize>,
    /// Keep history in memory only
    pub ephemeral: bool,
}

impl Default for FileHistoryConfig {
    fn default() -> Self {
        Self {
            dir: None,
            persistence: FilePersistenceMode::Immediate,
            debounce_ms: 1000,
            max_bytes: None,
            ephemeral: false,
        }
    }
}

/// Raw export configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExportConfig {
    /// Directory transcripts are written to (defaults to the working directory)
    pub dir: Option<String>,
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write diagnostic logs to this file instead of stderr
    pub file: Option<String>,
    /// JSONL conversation log path
    pub conversation_log: Option<String>,
}

/// Complete configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint: FileEndpointConfig,
    pub chat: FileChatConfig,
    pub history: FileHistoryConfig,
    pub export: FileExportConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.endpoint.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        let url = self.endpoint.url.trim();
        if url.is_empty() {
            return Err(ConfigValidationError::EmptyEndpointUrl);
        }
        match reqwest::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ConfigValidationError::InvalidEndpointUrl(url.to_string())),
        }

        if self.history.persistence == FilePersistenceMode::Debounced
            && self.history.debounce_ms == 0
        {
            return Err(ConfigValidationError::InvalidDebounce);
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_seconds)
    }

    pub fn transcript_labels(&self) -> TranscriptLabels {
        TranscriptLabels {
            title: self.chat.title.clone(),
            user_name: self.chat.user_name.clone(),
            assistant_name: self.chat.assistant_name.clone(),
        }
    }

    pub fn persistence_policy(&self) -> PersistencePolicy {
        match self.history.persistence {
            FilePersistenceMode::Immediate => PersistencePolicy::Immediate,
            FilePersistenceMode::Debounced => PersistencePolicy::Debounced {
                quiet_period: Duration::from_millis(self.history.debounce_ms),
            },
        }
    }

    /// Build the application-level chat configuration
    pub fn to_chat_config(&self) -> ChatConfig {
        let mut config = ChatConfig::default()
            .with_labels(self.transcript_labels())
            .with_error_message(self.chat.error_message.clone())
            .with_request_timeout(self.request_timeout())
            .with_persistence(self.persistence_policy());
        if let Some(welcome) = &self.chat.welcome_message {
            config = config.with_welcome_message(welcome.clone());
        }
        config
    }

    /// Directory for history records
    ///
    /// Returns the configured directory, or `<data dir>/chatline/history`.
    pub fn history_dir(&self) -> Option<PathBuf> {
        match &self.history.dir {
            Some(dir) => Some(PathBuf::from(dir)),
            None => dirs::data_dir().map(|d| d.join("chatline").join("history")),
        }
    }

    /// Directory for exported transcripts
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
