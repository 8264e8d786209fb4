//! In-memory key-value store

use super::validate_key;
use chatline_application::ports::key_value_store::{KeyValueStore, StoreError};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Process-local store; nothing survives a restart.
///
/// An optional quota caps the total bytes held across all keys.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota_bytes(quota: usize) -> Self {
        Self {
            values: Mutex::default(),
            quota_bytes: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = self.quota_bytes {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = MemoryKeyValueStore::new();
        assert!(store.is_empty());

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 1);

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_all_keys() {
        let store = MemoryKeyValueStore::with_quota_bytes(6);
        store.set("a", "123").unwrap();
        store.set("b", "456").unwrap();

        // Overwriting a key replaces its share of the quota
        store.set("a", "abc").unwrap();

        let err = store.set("c", "7").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 7, limit: 6, .. }));
        assert_eq!(store.get("c").unwrap(), None);
    }
}
