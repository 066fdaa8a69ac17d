//! In-memory [`LocalStore`] implementation.
//!
//! The primary store for tests, and a faithful stand-in for the browser's
//! per-origin storage: an optional byte capacity covers keys plus values,
//! and a rejected write leaves the previous value untouched.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{LocalStore, LocalStoreError};

/// An in-memory key/value store with an optional byte capacity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store limited to `capacity` total bytes across keys and values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    fn usage(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl LocalStore for MemoryStore {
    fn read_raw(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(capacity) = self.capacity {
            let existing = entries.get(key).map_or(0, |v| key.len() + v.len());
            let prospective = Self::usage(&entries) - existing + key.len() + value.len();
            if prospective > capacity {
                return Err(LocalStoreError::CapacityExceeded {
                    attempted: value.len(),
                });
            }
        }

        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let store = MemoryStore::new();
        store.write_raw("k", "v").unwrap();
        assert_eq!(store.read_raw("k").as_deref(), Some("v"));
        store.remove("k");
        assert!(store.read_raw("k").is_none());
    }

    #[test]
    fn test_capacity_rejects_oversized_write() {
        let store = MemoryStore::with_capacity(10);
        let err = store.write_raw("k", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, LocalStoreError::CapacityExceeded { .. }));
        assert!(store.read_raw("k").is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let store = MemoryStore::with_capacity(8);
        store.write_raw("k", "small").unwrap();
        assert!(store.write_raw("k", &"y".repeat(64)).is_err());
        assert_eq!(store.read_raw("k").as_deref(), Some("small"));
    }

    #[test]
    fn test_overwrite_frees_previous_usage() {
        let store = MemoryStore::with_capacity(12);
        store.write_raw("k", &"a".repeat(11)).unwrap();
        // Replacing the value must not double-count the old one.
        store.write_raw("k", &"b".repeat(11)).unwrap();
        assert_eq!(store.read_raw("k").unwrap().len(), 11);
    }
}
