//! Read-side migration of degraded and legacy record shapes.
//!
//! The quota guard (and older schema versions) persist "light" records that
//! keep only identity and quantity. On read, every stored shape is upgraded
//! back into a full display record: the set of shapes is closed (see
//! [`StoredCartLine`]), so migration is a total function rather than a
//! field-sniffing heuristic, while the wire format stays byte-compatible
//! with the untagged legacy JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lilymart_core::{Amount, CartLine, Customer, LineId, Order, OrderId, OrderStatus, Product,
                    UserId, clamp_qty};

/// The degraded persistence shape: identity plus quantity, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightLine {
    pub id: LineId,
    pub qty: u32,
}

/// Every cart-line shape that can appear in storage.
///
/// `Full` must come first: a full record also carries `id` and `qty`, so
/// the light variant would otherwise shadow it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredCartLine {
    Full(CartLine),
    Light(LightLine),
}

impl StoredCartLine {
    /// Whether this record needs product lookup to become displayable.
    #[must_use]
    pub const fn is_light(&self) -> bool {
        matches!(self, Self::Light(_))
    }
}

/// Strip cart lines down to the light shape for a degraded write.
#[must_use]
pub fn light_lines(lines: &[CartLine]) -> Vec<LightLine> {
    lines
        .iter()
        .map(|line| LightLine {
            id: line.id.clone(),
            qty: line.qty,
        })
        .collect()
}

/// Upgrade one stored line to a full display record.
///
/// Light records rehydrate `name`/`price`/`image` from the matching product;
/// an id with no matching product yields empty/zero display fields rather
/// than a failed read.
#[must_use]
pub fn rehydrate_line(stored: StoredCartLine, products: &[Product]) -> CartLine {
    match stored {
        StoredCartLine::Full(line) => line,
        StoredCartLine::Light(LightLine { id, qty }) => {
            let (product_id, color, size) = id.split();
            let product = products.iter().find(|p| p.id == product_id);
            CartLine {
                id,
                name: product.map(|p| p.name.clone()).unwrap_or_default(),
                price: product.map_or(Amount::ZERO, |p| p.price),
                image: product.map(|p| p.image.clone()).unwrap_or_default(),
                qty: clamp_qty(qty),
                product_id: Some(product_id),
                color,
                size,
            }
        }
    }
}

/// Upgrade a whole stored list, preserving cardinality.
#[must_use]
pub fn rehydrate_lines(stored: Vec<StoredCartLine>, products: &[Product]) -> Vec<CartLine> {
    stored
        .into_iter()
        .map(|line| rehydrate_line(line, products))
        .collect()
}

/// An order as it may appear in storage: items in any stored shape, status
/// in the current or legacy vocabulary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrder {
    pub id: OrderId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<StoredCartLine>,
    pub total: Amount,
    pub customer: Customer,
    pub status: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Upgrade a stored order: migrate the status vocabulary and rehydrate any
/// light item stubs.
#[must_use]
pub fn rehydrate_order(stored: StoredOrder, products: &[Product]) -> Order {
    Order {
        id: stored.id,
        created_at: stored.created_at,
        items: rehydrate_lines(stored.items, products),
        total: stored.total,
        customer: stored.customer,
        status: OrderStatus::from_stored(&stored.status),
        user_id: stored.user_id,
    }
}

/// The degraded order shape: metadata plus light item stubs, display text
/// dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightOrder {
    pub id: OrderId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<LightLine>,
    pub total: Amount,
    pub customer: Customer,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// Strip an order down to the light shape for a degraded write.
#[must_use]
pub fn light_order(order: &Order) -> LightOrder {
    LightOrder {
        id: order.id.clone(),
        created_at: order.created_at,
        items: light_lines(&order.items),
        total: order.total,
        customer: order.customer.clone(),
        status: order.status,
        user_id: order.user_id.clone(),
    }
}
