//! Data-layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `LILYMART_BACKEND` - `local` or `remote` (default: `local`)
//! - `LILYMART_DATA_DIR` - directory for the device-local store (default: `.lilymart`)
//! - `LILYMART_LOCAL_CAPACITY` - byte quota for the device-local store
//!
//! ## Required when `LILYMART_BACKEND=remote`
//! - `LILYMART_DATABASE_URL` - sqlx connection string for the remote entity store

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backing store the remote-capable repositories use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Everything stays in the device-local store.
    #[default]
    Local,
    /// Entities live in the remote relational store; the device-local store
    /// still carries the cart, identity, and favorites.
    Remote,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(format!("expected 'local' or 'remote', got '{other}'")),
        }
    }
}

/// Data layer configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backing store for remote-capable repositories.
    pub backend: BackendKind,
    /// Remote store connection string (may contain a password).
    pub database_url: Option<SecretString>,
    /// Directory for the file-backed device-local store.
    pub data_dir: PathBuf,
    /// Optional byte quota for the device-local store.
    pub local_capacity: Option<usize>,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, or if the remote
    /// backend is selected without a database URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let backend = get_env_or_default("LILYMART_BACKEND", "local")
            .parse::<BackendKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("LILYMART_BACKEND".to_owned(), e))?;

        let database_url = get_optional_env("LILYMART_DATABASE_URL").map(SecretString::from);
        if backend == BackendKind::Remote && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("LILYMART_DATABASE_URL".to_owned()));
        }

        let data_dir = PathBuf::from(get_env_or_default("LILYMART_DATA_DIR", ".lilymart"));

        let local_capacity = get_optional_env("LILYMART_LOCAL_CAPACITY")
            .map(|raw| {
                raw.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidEnvVar("LILYMART_LOCAL_CAPACITY".to_owned(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            backend,
            database_url,
            data_dir,
            local_capacity,
        })
    }

    /// A purely local configuration rooted at `data_dir`.
    #[must_use]
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Local,
            database_url: None,
            data_dir: data_dir.into(),
            local_capacity: None,
        }
    }
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!(
            "remote".parse::<BackendKind>().unwrap(),
            BackendKind::Remote
        );
        assert!("cloud".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_local_constructor() {
        let config = StoreConfig::local("/tmp/shop");
        assert_eq!(config.backend, BackendKind::Local);
        assert!(config.database_url.is_none());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shop"));
    }
}
