//! Device-local key/value store (LKV).
//!
//! Wraps a per-origin persistent string-key/JSON-value store. Reads treat
//! malformed data as absence and never fail. Writes may fail with a
//! capacity error, which is not swallowed here: the quota guard
//! ([`quota`]) owns the degradation cascade for the keys that need one.

pub mod file;
pub mod memory;
pub mod quota;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Keys in the device-local namespace, preserved verbatim from the legacy
/// client so existing data stays readable.
pub mod keys {
    /// Cart lines, full or light shape.
    pub const CART: &str = "cart_items";
    /// Bare id string of the authenticated user; absent when anonymous.
    pub const CURRENT_USER: &str = "current_user_id";
    /// Legacy local-only product mirror.
    pub const PRODUCTS: &str = "admin_products";
    /// Legacy local-only category mirror.
    pub const CATEGORIES: &str = "admin_categories";
    /// Orders, full or light shape.
    pub const ORDERS: &str = "orders";
    /// Legacy local-only user mirror.
    pub const USERS: &str = "users";
    /// Settings singleton.
    pub const SETTINGS: &str = "shop_settings";
    /// Banner list, ordered.
    pub const BANNERS: &str = "banners";
    /// Favorited product ids.
    pub const FAVORITES: &str = "favorites_ids";
}

/// Errors from the local store's write path.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// The write would exceed the store's capacity.
    #[error("local store capacity exceeded writing {attempted} bytes")]
    CapacityExceeded {
        /// Size of the rejected payload.
        attempted: usize,
    },

    /// The value could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Underlying I/O failure (file-backed store only).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A device-local string-key/string-value store.
///
/// Implementations must be safe to share across tasks; writes are expected
/// to be atomic per key (a failed write leaves the previous value intact).
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Raw stored value for `key`, if present.
    fn read_raw(&self, key: &str) -> Option<String>;

    /// Store a raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::CapacityExceeded`] when the store is full;
    /// the caller decides whether to degrade.
    fn write_raw(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Remove `key` if present.
    fn remove(&self, key: &str);
}

/// Cloneable JSON-typed handle over a [`LocalStore`].
#[derive(Clone, Debug)]
pub struct LocalKv {
    inner: Arc<dyn LocalStore>,
}

impl LocalKv {
    /// Wrap a concrete store.
    pub fn new(store: impl LocalStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wrap an already-shared store.
    #[must_use]
    pub fn from_arc(inner: Arc<dyn LocalStore>) -> Self {
        Self { inner }
    }

    /// Read and deserialize a value. Malformed stored data is treated as
    /// absence, never an error.
    #[must_use]
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.inner.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "malformed local record, treating as absent");
                None
            }
        }
    }

    /// Read a list value, defaulting to empty on absence or corruption.
    #[must_use]
    pub fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.read(key).unwrap_or_default()
    }

    /// Serialize and store a value.
    ///
    /// # Errors
    ///
    /// Propagates serialization and capacity failures; see
    /// [`LocalStore::write_raw`].
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), LocalStoreError> {
        let raw = serde_json::to_string(value)?;
        self.inner.write_raw(key, &raw)
    }

    /// Raw string read (for values that are not JSON, like the current
    /// user id).
    #[must_use]
    pub fn read_raw(&self, key: &str) -> Option<String> {
        self.inner.read_raw(key)
    }

    /// Raw string write.
    ///
    /// # Errors
    ///
    /// See [`LocalStore::write_raw`].
    pub fn write_raw(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.inner.write_raw(key, value)
    }

    /// Remove a key.
    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }
}
