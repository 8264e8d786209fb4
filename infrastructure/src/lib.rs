//! Infrastructure layer for chatline
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the HTTP chat endpoint, key-value stores,
//! the JSONL conversation log and configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileChatConfig, FileConfig, FileEndpointConfig,
    FileExportConfig, FileHistoryConfig, FileLoggingConfig, FilePersistenceMode,
};
pub use http::{DEFAULT_FALLBACK_REPLY, HttpChatEndpoint};
pub use logging::JsonlConversationLogger;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
