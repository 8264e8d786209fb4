//! Application layer for chatline
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatConfig, PersistencePolicy};
pub use ports::{
    chat_endpoint::{ChatEndpoint, TransportError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    key_value_store::{KeyValueStore, StoreError},
    send_progress::{NoSendProgress, SendProgressNotifier},
};
pub use use_cases::chat_history::{
    HISTORY_KEY_PREFIX, HistoryStore, MalformedHistoryError, PersistenceError, SaveStatus,
};
pub use use_cases::debounced_save::DebouncedSaver;
pub use use_cases::send_message::{ClearError, SendLifecycleController, SendOutcome, SendState};
