//! Lilymart Store - client persistence and synchronization layer.
//!
//! This crate maintains local mirrors of the shop's entities (products,
//! categories, cart, orders, users, settings, banners) and keeps multiple
//! UI surfaces consistent through event-driven invalidation:
//!
//! - [`local`] - the device-local key/value store (LKV) with a quota-aware
//!   write path
//! - [`remote`] - the remote entity store (RES) over `sqlx`
//! - [`bus`] - a typed publish/subscribe bus; subscribers re-query after a
//!   topic fires
//! - [`repos`] - one repository per entity, each selecting the local or
//!   remote backend from configuration
//! - [`session`] - the current-user identity binding
//! - [`migrate`] - transparent on-read upgrade of degraded ("light") and
//!   legacy record shapes
//!
//! # Propagation policy
//!
//! Reads never fail: malformed local data, missing rows, and network errors
//! all degrade to empty/default results. Local writes never fail either
//! (capacity exhaustion is absorbed by the quota guard's degradation
//! cascade). Remote writes may return [`StoreError`] and are the caller's
//! responsibility to surface. Nothing here retries automatically.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bus;
pub mod config;
pub mod error;
pub mod local;
pub mod migrate;
pub mod remote;
pub mod repos;
pub mod session;
pub mod telemetry;

pub use bus::{EventBus, Topic};
pub use config::{BackendKind, ConfigError, StoreConfig};
pub use error::{Result, StoreError};
pub use local::{LocalKv, LocalStore, LocalStoreError};
pub use repos::{Backend, Store};
pub use session::Session;
