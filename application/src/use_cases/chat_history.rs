//! Chat history persistence.
//!
//! [`HistoryStore`] keeps one record per session in a [`KeyValueStore`],
//! under `chat_history_<session id>`. A record is the JSON array of the
//! conversation's turns (welcome turns excluded) and is overwritten on every
//! save.
//!
//! Persistence never fails the caller: write failures come back as
//! [`SaveStatus::Failed`] and unreadable or malformed records load as an
//! empty history.

use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::key_value_store::{KeyValueStore, StoreError};
use chatline_domain::{ChatTurn, SessionId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of every history record key
pub const HISTORY_KEY_PREFIX: &str = "chat_history_";

/// A history write that did not happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Could not serialize history: {0}")]
    Serialize(String),

    #[error("Store rejected history write: {0}")]
    Store(#[from] StoreError),
}

/// A stored record that could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed history record '{key}': {reason}")]
pub struct MalformedHistoryError {
    pub key: String,
    pub reason: String,
}

/// Outcome of a history write, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved { turns: usize },
    Failed(PersistenceError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. })
    }
}

/// Serialize turns into a history record, dropping welcome turns
pub fn encode_record(turns: &[ChatTurn]) -> Result<String, PersistenceError> {
    let persisted: Vec<&ChatTurn> = turns.iter().filter(|t| !t.is_welcome()).collect();
    serde_json::to_string(&persisted).map_err(|e| PersistenceError::Serialize(e.to_string()))
}

/// Parse a history record
pub fn decode_record(key: &str, raw: &str) -> Result<Vec<ChatTurn>, MalformedHistoryError> {
    serde_json::from_str(raw).map_err(|e| MalformedHistoryError {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Session-keyed history over a key-value store
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Storage key for a session's record
    pub fn key_for(session_id: &SessionId) -> String {
        format!("{}{}", HISTORY_KEY_PREFIX, session_id)
    }

    /// Overwrite the session's record with `turns` (welcome turns excluded).
    pub fn save(&self, session_id: &SessionId, turns: &[ChatTurn]) -> SaveStatus {
        let key = Self::key_for(session_id);
        let result = encode_record(turns)
            .and_then(|record| self.store.set(&key, &record).map_err(PersistenceError::from));

        match result {
            Ok(()) => {
                let count = turns.iter().filter(|t| !t.is_welcome()).count();
                debug!("Saved {} turns for {}", count, session_id);
                self.conversation_logger.log(ConversationEvent::new(
                    "history_saved",
                    serde_json::json!({
                        "session_id": session_id.as_str(),
                        "turns": count,
                    }),
                ));
                SaveStatus::Saved { turns: count }
            }
            Err(e) => {
                warn!("Could not save chat history for {}: {}", session_id, e);
                self.conversation_logger.log(ConversationEvent::new(
                    "history_save_failed",
                    serde_json::json!({
                        "session_id": session_id.as_str(),
                        "error": e.to_string(),
                    }),
                ));
                SaveStatus::Failed(e)
            }
        }
    }

    /// Previously saved turns, or an empty history when there is no usable
    /// record.
    pub fn load(&self, session_id: &SessionId) -> Vec<ChatTurn> {
        let key = Self::key_for(session_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read chat history for {}: {}", session_id, e);
                return Vec::new();
            }
        };

        match decode_record(&key, &raw) {
            Ok(turns) => {
                debug!("Loaded {} turns for {}", turns.len(), session_id);
                turns
            }
            Err(e) => {
                warn!("Ignoring stored chat history: {}", e);
                Vec::new()
            }
        }
    }

    /// Remove the session's record
    pub fn clear(&self, session_id: &SessionId) -> Result<(), PersistenceError> {
        self.store
            .remove(&Self::key_for(session_id))
            .map_err(PersistenceError::from)
    }
}
