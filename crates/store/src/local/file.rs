//! File-backed [`LocalStore`] implementation.
//!
//! One file per key under a data directory, written via a temp file and
//! rename so a failed write never leaves a torn value behind. An optional
//! byte capacity mimics the browser storage quota the legacy client ran
//! into.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{LocalStore, LocalStoreError};

/// A directory-backed key/value store with an optional byte capacity.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    capacity: Option<usize>,
    // Serializes writers; readers go straight to the filesystem.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity: None,
            write_lock: Mutex::new(()),
        })
    }

    /// Open a store limited to `capacity` total value bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> std::io::Result<Self> {
        let mut store = Self::open(dir)?;
        store.capacity = Some(capacity);
        Ok(store)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn usage_excluding(&self, skip: &Path) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path() != skip)
            .filter_map(|entry| entry.metadata().ok())
            .filter(|meta| meta.is_file())
            .map(|meta| usize::try_from(meta.len()).unwrap_or(usize::MAX))
            .sum()
    }
}

impl LocalStore for FileStore {
    fn read_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let path = self.path_for(key);
        if let Some(capacity) = self.capacity {
            let prospective = self.usage_excluding(&path) + value.len();
            if prospective > capacity {
                return Err(LocalStoreError::CapacityExceeded {
                    attempted: value.len(),
                });
            }
        }

        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = fs::remove_file(self.path_for(key));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.write_raw("cart_items", "[]").unwrap();
        assert_eq!(store.read_raw("cart_items").as_deref(), Some("[]"));
        store.remove("cart_items");
        assert!(store.read_raw("cart_items").is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.write_raw("shop_settings", "{\"shippingFee\":5000}").unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            store.read_raw("shop_settings").as_deref(),
            Some("{\"shippingFee\":5000}")
        );
    }

    #[test]
    fn test_capacity_rejects_and_preserves() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open_with_capacity(dir.path(), 16).unwrap();
        store.write_raw("orders", "[1,2]").unwrap();
        let err = store.write_raw("orders", &"x".repeat(64)).unwrap_err();
        assert!(matches!(err, LocalStoreError::CapacityExceeded { .. }));
        assert_eq!(store.read_raw("orders").as_deref(), Some("[1,2]"));
    }
}
