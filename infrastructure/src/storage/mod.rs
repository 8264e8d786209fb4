//! Key-value store adapters for chat history
//!
//! - [`FileKeyValueStore`] - one file per key in a directory
//! - [`MemoryKeyValueStore`] - process-local, for `--ephemeral` sessions

mod file_store;
mod memory_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;

use chatline_application::ports::key_value_store::StoreError;

/// Keys become file names, so only a conservative alphabet is allowed.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
