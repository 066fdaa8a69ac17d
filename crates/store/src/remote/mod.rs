//! Remote entity store (RES) connection plumbing.
//!
//! Rows map to entities with server-assigned timestamps; array and object
//! fields are stored as JSON text columns. The store is assumed to have
//! effectively unbounded capacity, so no quota guard applies here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::{Result, StoreError};

/// Embedded schema migrations (`crates/store/migrations/`).
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Create a connection pool and bring the schema up to date.
///
/// # Errors
///
/// Returns `StoreError::Remote` if the connection cannot be established, or
/// `StoreError::Migrate` if migrations fail.
pub async fn connect(database_url: &secrecy::SecretString) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Connect to a fresh in-memory database.
///
/// Restricted to a single connection because every in-memory SQLite
/// connection is its own database. Intended for tests and demos.
///
/// # Errors
///
/// Returns `StoreError::Remote`/`StoreError::Migrate` as [`connect`] does.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Serialize a value for a JSON text column.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|err| StoreError::DataCorruption(format!("failed to serialize column: {err}")))
}

/// Deserialize a JSON text column, degrading to the default on corruption
/// (reads never fail).
pub(crate) fn from_json_or_default<T: DeserializeOwned + Default>(raw: Option<String>) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "malformed JSON column, using default");
            T::default()
        }
    }
}

/// Current time as epoch milliseconds, the storage format for timestamps.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Decode an epoch-milliseconds column, clamping out-of-range values.
pub(crate) fn datetime_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_comes_up() {
        let pool = connect_in_memory().await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT current_value FROM order_sequence")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_from_json_or_default_absorbs_corruption() {
        let list: Vec<String> = from_json_or_default(Some("{broken".to_owned()));
        assert!(list.is_empty());
        let list: Vec<String> = from_json_or_default(Some("[\"a\"]".to_owned()));
        assert_eq!(list, vec!["a"]);
    }
}
