//! Key-value store port
//!
//! A flat string-to-string store with no cross-process coordination, used
//! for chat history persistence.

use thiserror::Error;

/// Errors reported by a key-value store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Quota exceeded writing '{key}': {needed} bytes (limit: {limit} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Synchronous string store.
///
/// `set` overwrites any previous value for the key; `remove` on a missing
/// key is not an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
