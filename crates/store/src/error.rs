//! Error taxonomy for the data layer.
//!
//! Reads never surface these: every repository `get` degrades to an
//! empty/default result and logs. Writes against the remote store (and
//! admin mutations generally) return [`StoreError`] for the call site to
//! catch and surface.

use thiserror::Error;

/// Errors produced by repository write paths.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote store failure from sqlx.
    #[error("remote store error: {0}")]
    Remote(#[from] sqlx::Error),

    /// Schema migration failure while opening the remote store.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Device-local write failure on a path not covered by the quota guard.
    #[error("local store error: {0}")]
    Local(#[from] crate::local::LocalStoreError),

    /// Stored data is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Registration attempted with an email that is already taken
    /// (case-insensitive). The one named conflict in the system.
    #[error("email already taken")]
    EmailTaken,

    /// Generic uniqueness violation (e.g. duplicate category name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Operation requires an authenticated admin session.
    #[error("admin privileges required")]
    Forbidden,

    /// Write payload rejected by validation.
    #[error("invalid entity: {0}")]
    Invalid(String),
}

/// Result type alias for [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Map a sqlx error, converting unique-constraint violations into
    /// `Conflict` the way a duplicate insert should read to callers.
    #[must_use]
    pub fn from_sqlx(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Remote(err)
    }
}
