//! Cart repository.
//!
//! The device-local cart is always the working copy, whatever the backend:
//! every write goes through the quota guard and publishes `cart-updated`
//! even when it degraded. With a remote backend and an authenticated
//! session the cart is additionally mirrored, best-effort, to the user's
//! `carts` row; on login the mirror merges back into the device cart.
//!
//! Cart writes never return errors - a storage failure must not lose the
//! shopper's click.

use sqlx::{Row, SqlitePool};

use lilymart_core::{Amount, CartLine, LineId, Product, clamp_qty};

use crate::bus::{EventBus, Topic};
use crate::local::{LocalKv, keys, quota};
use crate::migrate::{self, StoredCartLine};
use crate::remote;
use crate::repos::products::ProductRepository;
use crate::session::Session;

/// Repository for the shopping cart.
#[derive(Clone, Debug)]
pub struct CartRepository {
    kv: LocalKv,
    mirror: Option<SqlitePool>,
    products: ProductRepository,
    session: Session,
    bus: EventBus,
}

impl CartRepository {
    pub(crate) const fn new(
        kv: LocalKv,
        mirror: Option<SqlitePool>,
        products: ProductRepository,
        session: Session,
        bus: EventBus,
    ) -> Self {
        Self {
            kv,
            mirror,
            products,
            session,
            bus,
        }
    }

    /// The current cart, with any light records rehydrated. Never fails.
    pub async fn get(&self) -> Vec<CartLine> {
        let stored: Vec<StoredCartLine> = self.kv.read_list(keys::CART);
        let products = if stored.iter().any(StoredCartLine::is_light) {
            self.products.get().await
        } else {
            Vec::new()
        };
        migrate::rehydrate_lines(stored, &products)
    }

    /// Replace the cart wholesale. Degrades under quota pressure rather
    /// than failing, and always publishes `cart-updated`.
    pub async fn set(&self, lines: Vec<CartLine>) {
        quota::store_cart(&self.kv, &lines);
        self.push_mirror(&lines).await;
        self.bus.publish(Topic::CartUpdated);
    }

    /// Add a product+variant to the cart. An existing line with the same
    /// composite id has its quantity bumped instead of a duplicate line
    /// appearing; quantities clamp to `[1, 99]`.
    pub async fn add(&self, product: &Product, qty: u32, color: Option<&str>, size: Option<&str>) {
        let id = LineId::compose(&product.id, color, size);
        let mut lines = self.get().await;

        if let Some(line) = lines.iter_mut().find(|line| line.id == id) {
            line.qty = clamp_qty(line.qty.saturating_add(qty));
        } else {
            lines.push(CartLine {
                id,
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
                qty: clamp_qty(qty),
                product_id: Some(product.id.clone()),
                color: color.map(str::to_owned),
                size: size.map(str::to_owned),
            });
        }
        self.set(lines).await;
    }

    /// Set a line's quantity (clamped). Unknown line ids are ignored.
    pub async fn update_qty(&self, id: &LineId, qty: u32) {
        let mut lines = self.get().await;
        let Some(line) = lines.iter_mut().find(|line| &line.id == id) else {
            return;
        };
        line.qty = clamp_qty(qty);
        self.set(lines).await;
    }

    /// Remove a line. Unknown line ids are ignored.
    pub async fn remove(&self, id: &LineId) {
        let mut lines = self.get().await;
        let before = lines.len();
        lines.retain(|line| &line.id != id);
        if lines.len() == before {
            return;
        }
        self.set(lines).await;
    }

    /// Empty the cart.
    pub async fn clear(&self) {
        self.set(Vec::new()).await;
    }

    /// Sum of `price * qty` across all lines.
    pub async fn subtotal(&self) -> Amount {
        self.get().await.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    pub async fn count(&self) -> u32 {
        self.get().await.iter().map(|line| line.qty).sum()
    }

    /// Merge the authenticated user's remote mirror into the device cart,
    /// then mirror the merged result back. Matching composite line ids keep
    /// the larger quantity (clamped) - the mirror is a copy of a device
    /// cart, not a disjoint one, so summing would double quantities on
    /// every re-login. Distinct variants stay distinct lines.
    ///
    /// Call with the session already bound; a no-op without a mirror.
    pub(crate) async fn merge_on_login(&self) {
        let Some(pool) = self.mirror.as_ref() else {
            return;
        };
        let Some(user_id) = self.session.current_user_id() else {
            return;
        };

        let raw: Option<String> = match sqlx::query("SELECT items FROM carts WHERE user_id = ?1")
            .bind(user_id.as_str())
            .fetch_optional(pool)
            .await
        {
            Ok(row) => row.and_then(|row| row.try_get("items").ok()),
            Err(err) => {
                tracing::warn!(error = %err, "cart mirror read failed, keeping device cart");
                None
            }
        };
        let stored: Vec<StoredCartLine> = remote::from_json_or_default(raw);
        let products = if stored.iter().any(StoredCartLine::is_light) {
            self.products.get().await
        } else {
            Vec::new()
        };
        let remote_lines = migrate::rehydrate_lines(stored, &products);

        let mut lines = self.get().await;
        for remote_line in remote_lines {
            if let Some(line) = lines.iter_mut().find(|line| line.id == remote_line.id) {
                line.qty = clamp_qty(line.qty.max(remote_line.qty));
            } else {
                lines.push(remote_line);
            }
        }
        self.set(lines).await;
    }

    async fn push_mirror(&self, lines: &[CartLine]) {
        let Some(pool) = self.mirror.as_ref() else {
            return;
        };
        let Some(user_id) = self.session.current_user_id() else {
            return;
        };
        let items = match remote::to_json(&lines) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(error = %err, "cart mirror serialization failed");
                return;
            }
        };
        let result = sqlx::query(
            "INSERT INTO carts (user_id, items) VALUES (?1, ?2) \
             ON CONFLICT (user_id) DO UPDATE SET items = excluded.items",
        )
        .bind(user_id.as_str())
        .bind(items)
        .execute(pool)
        .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "cart mirror write failed, device copy is current");
        }
    }
}
