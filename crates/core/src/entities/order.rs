//! Order entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::cart::CartLine;
use crate::types::{Amount, OrderId, OrderStatus, UserId};

/// Customer contact snapshot taken at checkout. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// A placed order.
///
/// `items`, `total`, and `customer` are snapshots fixed at creation; the
/// only mutable field is `status` (admin-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Creation time; serialized as JS epoch milliseconds like the legacy
    /// records.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartLine>,
    /// Pre-computed items subtotal plus the shipping fee in effect at
    /// checkout time.
    pub total: Amount,
    pub customer: Customer,
    pub status: OrderStatus,
    /// Weak reference to the ordering user; absent for anonymous checkouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn items_count(&self) -> u32 {
        self.items.iter().map(|line| line.qty).sum()
    }
}
