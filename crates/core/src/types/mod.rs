//! Core scalar types for Lilymart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod credential;
pub mod email;
pub mod id;
pub mod status;

pub use amount::Amount;
pub use credential::Credential;
pub use email::{Email, EmailError};
pub use id::*;
pub use status::{Gender, OrderStatus};
