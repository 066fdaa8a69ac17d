//! Order repository and checkout.
//!
//! An order is a snapshot: items, total (subtotal plus the shipping fee in
//! effect at checkout), and customer contact are fixed at creation and
//! never recomputed. The only mutable field is `status`, behind the admin
//! gate. Remote order ids come from the `order_sequence` counter,
//! zero-padded to six digits; local ids are opaque UUIDs.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lilymart_core::{Amount, CartLine, Customer, Order, OrderId, OrderStatus, UserId};

use crate::bus::{EventBus, Topic};
use crate::error::{Result, StoreError};
use crate::local::{keys, quota};
use crate::migrate::{self, StoredCartLine, StoredOrder};
use crate::remote;
use crate::repos::{
    Backend, cart::CartRepository, products::ProductRepository, settings::SettingsRepository,
    users::UserRepository,
};
use crate::session::Session;

/// Repository for [`Order`] entities.
#[derive(Clone, Debug)]
pub struct OrderRepository {
    backend: Backend,
    cart: CartRepository,
    settings: SettingsRepository,
    products: ProductRepository,
    users: UserRepository,
    session: Session,
    bus: EventBus,
}

impl OrderRepository {
    pub(crate) const fn new(
        backend: Backend,
        cart: CartRepository,
        settings: SettingsRepository,
        products: ProductRepository,
        users: UserRepository,
        session: Session,
        bus: EventBus,
    ) -> Self {
        Self {
            backend,
            cart,
            settings,
            products,
            users,
            session,
            bus,
        }
    }

    /// All orders, newest first, with legacy statuses and light items
    /// migrated. Never fails.
    pub async fn get(&self) -> Vec<Order> {
        match &self.backend {
            Backend::Local(kv) => {
                let stored: Vec<StoredOrder> = kv.read_list(keys::ORDERS);
                let products = if stored
                    .iter()
                    .any(|order| order.items.iter().any(StoredCartLine::is_light))
                {
                    self.products.get().await
                } else {
                    Vec::new()
                };
                stored
                    .into_iter()
                    .map(|order| migrate::rehydrate_order(order, &products))
                    .collect()
            }
            Backend::Remote(pool) => match self.fetch_all(pool).await {
                Ok(orders) => orders,
                Err(err) => {
                    tracing::warn!(error = %err, "order query failed, returning empty");
                    Vec::new()
                }
            },
        }
    }

    /// Orders placed by the session's user; empty when anonymous.
    pub async fn get_for_current_user(&self) -> Vec<Order> {
        let Some(user_id) = self.session.current_user_id() else {
            return Vec::new();
        };
        self.get()
            .await
            .into_iter()
            .filter(|order| order.user_id.as_ref() == Some(&user_id))
            .collect()
    }

    /// Look up an order by id. Never fails.
    pub async fn get_by_id(&self, id: &OrderId) -> Option<Order> {
        self.get().await.into_iter().find(|order| &order.id == id)
    }

    /// Place an order from the current cart, then empty the cart.
    ///
    /// Anonymous checkout is allowed; the order simply carries no user id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for an empty cart, or a storage
    /// error from the write.
    pub async fn checkout(&self, customer: Customer) -> Result<Order> {
        let items = self.cart.get().await;
        if items.is_empty() {
            return Err(StoreError::Invalid("cart is empty".into()));
        }

        let subtotal: Amount = items.iter().map(CartLine::line_total).sum();
        let shipping_fee = self.settings.get().await.shipping_fee;
        let order = Order {
            id: self.mint_id().await?,
            created_at: Utc::now(),
            items,
            total: subtotal + shipping_fee,
            customer,
            status: OrderStatus::Unpaid,
            user_id: self.session.current_user_id(),
        };

        match &self.backend {
            Backend::Local(kv) => {
                let mut orders = self.get().await;
                orders.insert(0, order.clone());
                quota::store_orders(kv, &orders);
            }
            Backend::Remote(pool) => insert(pool, &order).await?,
        }

        self.cart.clear().await;
        self.bus.publish(Topic::OrdersUpdated);
        tracing::info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Set an order's status (admin only). Any transition is allowed.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for an unknown order id.
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        self.users.require_admin().await?;

        match &self.backend {
            Backend::Local(kv) => {
                let mut orders = self.get().await;
                let order = orders
                    .iter_mut()
                    .find(|order| &order.id == id)
                    .ok_or(StoreError::NotFound)?;
                order.status = status;
                let updated = order.clone();
                quota::store_orders(kv, &orders);
                self.bus.publish(Topic::OrdersUpdated);
                Ok(updated)
            }
            Backend::Remote(pool) => {
                let mut order = self.get_by_id(id).await.ok_or(StoreError::NotFound)?;
                sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
                    .bind(id.as_str())
                    .bind(status.as_str())
                    .execute(pool)
                    .await?;
                order.status = status;
                self.bus.publish(Topic::OrdersUpdated);
                Ok(order)
            }
        }
    }

    async fn mint_id(&self) -> Result<OrderId> {
        match &self.backend {
            Backend::Local(_) => Ok(OrderId::from(Uuid::new_v4().to_string())),
            Backend::Remote(pool) => {
                let (next,): (i64,) = sqlx::query_as(
                    "UPDATE order_sequence SET current_value = current_value + 1 \
                     WHERE id = 1 RETURNING current_value",
                )
                .fetch_one(pool)
                .await?;
                Ok(OrderId::from(format!("{next:06}")))
            }
        }
    }

    async fn fetch_all(&self, pool: &SqlitePool) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        let mut parsed = Vec::with_capacity(rows.len());
        for row in &rows {
            parsed.push(order_parts_from_row(row)?);
        }
        let products = if parsed
            .iter()
            .any(|(_, items)| items.iter().any(StoredCartLine::is_light))
        {
            self.products.get().await
        } else {
            Vec::new()
        };
        Ok(parsed
            .into_iter()
            .map(|(order, items)| Order {
                items: migrate::rehydrate_lines(items, &products),
                ..order
            })
            .collect())
    }
}

async fn insert(pool: &SqlitePool, order: &Order) -> Result<()> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, customer_name, customer_phone, customer_address, \
         items, total, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(order.id.as_str())
    .bind(order.user_id.as_ref().map(UserId::as_str))
    .bind(&order.customer.name)
    .bind(&order.customer.phone)
    .bind(&order.customer.address)
    .bind(remote::to_json(&order.items)?)
    .bind(order.total.as_i64())
    .bind(order.status.as_str())
    .bind(order.created_at.timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}

fn order_parts_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<(Order, Vec<StoredCartLine>)> {
    let items: Vec<StoredCartLine> = remote::from_json_or_default(row.try_get("items")?);
    let status: String = row.try_get("status")?;
    let order = Order {
        id: OrderId::from(row.try_get::<String, _>("id")?),
        created_at: remote::datetime_from_millis(row.try_get("created_at")?),
        items: Vec::new(),
        total: Amount::new(row.try_get("total")?),
        customer: Customer {
            name: row.try_get("customer_name")?,
            phone: row.try_get("customer_phone")?,
            address: row.try_get("customer_address")?,
        },
        status: OrderStatus::from_stored(&status),
        user_id: row.try_get::<Option<String>, _>("user_id")?.map(UserId::from),
    };
    Ok((order, items))
}
