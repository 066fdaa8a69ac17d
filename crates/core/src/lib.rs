//! Lilymart Core - Shared domain types.
//!
//! This crate provides the types used across the Lilymart data layer:
//! newtype ids, currency amounts, emails, credentials, order statuses, and
//! the entity structs themselves.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! storage handles. Entity (de)serialization uses the camelCase wire names
//! of the legacy device-local JSON, so stored records remain readable
//! bit-for-bit.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, amounts, emails, credentials, statuses
//! - [`entities`] - The business entities (Product, CartLine, Order, ...)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod types;

pub use entities::*;
pub use types::*;
