//! Business entities.
//!
//! Serialization uses the camelCase field names of the legacy device-local
//! JSON so stored records stay readable without transformation.

pub mod banner;
pub mod cart;
pub mod order;
pub mod product;
pub mod settings;
pub mod user;

pub use banner::Banner;
pub use cart::{CartLine, MAX_QTY, MIN_QTY, clamp_qty};
pub use order::{Customer, Order};
pub use product::{NewProduct, Product, ProductPatch};
pub use settings::{BankAccount, Settings};
pub use user::{NewUser, User, UserPatch};

/// A category is a bare name, unique (case-sensitive) within the set.
pub type Category = String;
