//! Product repository.
//!
//! Reads are open to everyone and never fail; mutations are admin-gated.
//! Array-valued fields (`images`, `colors`, `sizes`) live in JSON text
//! columns on the remote side.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lilymart_core::{Amount, NewProduct, Product, ProductId, ProductPatch};

use crate::bus::{EventBus, Topic};
use crate::error::{Result, StoreError};
use crate::local::keys;
use crate::remote;
use crate::repos::{Backend, users::UserRepository};

/// Repository for [`Product`] entities.
#[derive(Clone, Debug)]
pub struct ProductRepository {
    backend: Backend,
    users: UserRepository,
    bus: EventBus,
}

impl ProductRepository {
    pub(crate) const fn new(backend: Backend, users: UserRepository, bus: EventBus) -> Self {
        Self {
            backend,
            users,
            bus,
        }
    }

    /// All products, newest first. Never fails.
    pub async fn get(&self) -> Vec<Product> {
        match &self.backend {
            Backend::Local(kv) => kv.read_list(keys::PRODUCTS),
            Backend::Remote(pool) => match fetch_all(pool).await {
                Ok(products) => products,
                Err(err) => {
                    tracing::warn!(error = %err, "product query failed, returning empty");
                    Vec::new()
                }
            },
        }
    }

    /// Look up a product by id. Never fails.
    pub async fn get_by_id(&self, id: &ProductId) -> Option<Product> {
        match &self.backend {
            Backend::Local(kv) => kv
                .read_list::<Product>(keys::PRODUCTS)
                .into_iter()
                .find(|product| &product.id == id),
            Backend::Remote(pool) => {
                let row = sqlx::query("SELECT * FROM products WHERE id = ?1")
                    .bind(id.as_str())
                    .fetch_optional(pool)
                    .await;
                match row {
                    Ok(row) => row.and_then(|row| match product_from_row(&row) {
                        Ok(product) => Some(product),
                        Err(err) => {
                            tracing::warn!(product_id = %id, error = %err, "corrupt product row");
                            None
                        }
                    }),
                    Err(err) => {
                        tracing::warn!(product_id = %id, error = %err, "product lookup failed");
                        None
                    }
                }
            }
        }
    }

    /// Create a product (admin only). The repository mints the id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Forbidden`] for non-admin sessions and
    /// [`StoreError::Invalid`] for negative amounts.
    pub async fn add(&self, new: NewProduct) -> Result<Product> {
        self.users.require_admin().await?;
        let product = new.into_product(ProductId::from(Uuid::new_v4().to_string()));
        validate(&product)?;

        match &self.backend {
            Backend::Local(kv) => {
                let mut products: Vec<Product> = kv.read_list(keys::PRODUCTS);
                products.insert(0, product.clone());
                kv.write(keys::PRODUCTS, &products)?;
            }
            Backend::Remote(pool) => insert(pool, &product).await?,
        }

        self.bus.publish(Topic::ProductsUpdated);
        Ok(product)
    }

    /// Patch a product in place (admin only).
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for an unknown id, `Invalid`
    /// for negative amounts.
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        self.users.require_admin().await?;
        let mut product = self.get_by_id(id).await.ok_or(StoreError::NotFound)?;
        patch.apply(&mut product);
        validate(&product)?;

        match &self.backend {
            Backend::Local(kv) => {
                let mut products: Vec<Product> = kv.read_list(keys::PRODUCTS);
                let slot = products
                    .iter_mut()
                    .find(|p| &p.id == id)
                    .ok_or(StoreError::NotFound)?;
                *slot = product.clone();
                kv.write(keys::PRODUCTS, &products)?;
            }
            Backend::Remote(pool) => {
                sqlx::query(
                    "UPDATE products SET name = ?2, price = ?3, compare_at_price = ?4, \
                     coupon_price = ?5, image = ?6, images = ?7, category = ?8, \
                     description = ?9, badge = ?10, colors = ?11, sizes = ?12 WHERE id = ?1",
                )
                .bind(id.as_str())
                .bind(&product.name)
                .bind(product.price.as_i64())
                .bind(product.compare_at_price.map(|a| a.as_i64()))
                .bind(product.coupon_price.map(|a| a.as_i64()))
                .bind(&product.image)
                .bind(remote::to_json(&product.images)?)
                .bind(&product.category)
                .bind(&product.description)
                .bind(&product.badge)
                .bind(remote::to_json(&product.colors)?)
                .bind(remote::to_json(&product.sizes)?)
                .execute(pool)
                .await?;
            }
        }

        self.bus.publish(Topic::ProductsUpdated);
        Ok(product)
    }

    /// Delete a product (admin only). Returns whether anything was removed.
    ///
    /// Cart lines referencing the product keep their snapshot; only light
    /// records lose their display fields on rehydration.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, or a storage error.
    pub async fn delete(&self, id: &ProductId) -> Result<bool> {
        self.users.require_admin().await?;

        let removed = match &self.backend {
            Backend::Local(kv) => {
                let mut products: Vec<Product> = kv.read_list(keys::PRODUCTS);
                let before = products.len();
                products.retain(|product| &product.id != id);
                let removed = products.len() != before;
                if removed {
                    kv.write(keys::PRODUCTS, &products)?;
                }
                removed
            }
            Backend::Remote(pool) => {
                let result = sqlx::query("DELETE FROM products WHERE id = ?1")
                    .bind(id.as_str())
                    .execute(pool)
                    .await?;
                result.rows_affected() > 0
            }
        };

        if removed {
            self.bus.publish(Topic::ProductsUpdated);
        }
        Ok(removed)
    }

    /// Replace the whole product list (admin only).
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Invalid` for negative amounts, or a
    /// storage error.
    pub async fn set(&self, products: Vec<Product>) -> Result<()> {
        self.users.require_admin().await?;
        for product in &products {
            validate(product)?;
        }

        match &self.backend {
            Backend::Local(kv) => kv.write(keys::PRODUCTS, &products)?,
            Backend::Remote(pool) => {
                let mut tx = pool.begin().await?;
                sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
                for product in &products {
                    insert(&mut *tx, product).await?;
                }
                tx.commit().await?;
            }
        }

        self.bus.publish(Topic::ProductsUpdated);
        Ok(())
    }

    /// Rewrite the category field across all products: `new = None` clears
    /// it. Used by the category rename/delete cascades; the caller holds
    /// the admin gate and publishes `categories-updated`.
    pub(crate) async fn rewrite_category(&self, old: &str, new: Option<&str>) -> Result<()> {
        let replacement = new.unwrap_or_default();

        match &self.backend {
            Backend::Local(kv) => {
                let mut products: Vec<Product> = kv.read_list(keys::PRODUCTS);
                let mut touched = false;
                for product in &mut products {
                    if product.category == old {
                        product.category = replacement.to_owned();
                        touched = true;
                    }
                }
                if !touched {
                    return Ok(());
                }
                kv.write(keys::PRODUCTS, &products)?;
            }
            Backend::Remote(pool) => {
                let result = sqlx::query("UPDATE products SET category = ?2 WHERE category = ?1")
                    .bind(old)
                    .bind(replacement)
                    .execute(pool)
                    .await?;
                if result.rows_affected() == 0 {
                    return Ok(());
                }
            }
        }

        self.bus.publish(Topic::ProductsUpdated);
        Ok(())
    }
}

fn validate(product: &Product) -> Result<()> {
    if product.name.trim().is_empty() {
        return Err(StoreError::Invalid("product name cannot be empty".into()));
    }
    if product.price.is_negative()
        || product.compare_at_price.is_some_and(|a| a.is_negative())
        || product.coupon_price.is_some_and(|a| a.is_negative())
    {
        return Err(StoreError::Invalid("prices cannot be negative".into()));
    }
    Ok(())
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Product>> {
    let rows = sqlx::query("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(product_from_row).collect()
}

async fn insert(executor: impl sqlx::SqliteExecutor<'_>, product: &Product) -> Result<()> {
    sqlx::query(
        "INSERT INTO products (id, name, price, compare_at_price, coupon_price, image, images, \
         category, description, badge, colors, sizes, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(product.id.as_str())
    .bind(&product.name)
    .bind(product.price.as_i64())
    .bind(product.compare_at_price.map(|a| a.as_i64()))
    .bind(product.coupon_price.map(|a| a.as_i64()))
    .bind(&product.image)
    .bind(remote::to_json(&product.images)?)
    .bind(&product.category)
    .bind(&product.description)
    .bind(&product.badge)
    .bind(remote::to_json(&product.colors)?)
    .bind(remote::to_json(&product.sizes)?)
    .bind(remote::now_millis())
    .execute(executor)
    .await?;
    Ok(())
}

fn product_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        price: Amount::new(row.try_get("price")?),
        compare_at_price: row
            .try_get::<Option<i64>, _>("compare_at_price")?
            .map(Amount::new),
        coupon_price: row
            .try_get::<Option<i64>, _>("coupon_price")?
            .map(Amount::new),
        image: row.try_get("image")?,
        images: remote::from_json_or_default(row.try_get("images")?),
        category: row
            .try_get::<Option<String>, _>("category")?
            .unwrap_or_default(),
        description: row
            .try_get::<Option<String>, _>("description")?
            .unwrap_or_default(),
        badge: row
            .try_get::<Option<String>, _>("badge")?
            .unwrap_or_default(),
        colors: remote::from_json_or_default(row.try_get("colors")?),
        sizes: remote::from_json_or_default(row.try_get("sizes")?),
    })
}
