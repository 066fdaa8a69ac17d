//! Category repository.
//!
//! A category is a bare name, unique case-sensitively. Rename and delete
//! cascade into the product set (rename rewrites matching products, delete
//! clears them to uncategorized); the cascade is two writes, not a
//! transaction, so a crash between them leaves products pointing at a name
//! that no longer exists - harmless, they just render uncategorized.

use lilymart_core::Category;

use crate::bus::{EventBus, Topic};
use crate::error::{Result, StoreError};
use crate::local::keys;
use crate::remote;
use crate::repos::{Backend, products::ProductRepository, users::UserRepository};

/// Repository for category names.
#[derive(Clone, Debug)]
pub struct CategoryRepository {
    backend: Backend,
    products: ProductRepository,
    users: UserRepository,
    bus: EventBus,
}

impl CategoryRepository {
    pub(crate) const fn new(
        backend: Backend,
        products: ProductRepository,
        users: UserRepository,
        bus: EventBus,
    ) -> Self {
        Self {
            backend,
            products,
            users,
            bus,
        }
    }

    /// All categories in insertion order. Never fails.
    pub async fn get(&self) -> Vec<Category> {
        match &self.backend {
            Backend::Local(kv) => kv.read_list(keys::CATEGORIES),
            Backend::Remote(pool) => {
                let rows: sqlx::Result<Vec<(String,)>> =
                    sqlx::query_as("SELECT name FROM categories ORDER BY created_at")
                        .fetch_all(pool)
                        .await;
                match rows {
                    Ok(rows) => rows.into_iter().map(|(name,)| name).collect(),
                    Err(err) => {
                        tracing::warn!(error = %err, "category query failed, returning empty");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Add a category (admin only).
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Invalid` for a blank name,
    /// [`StoreError::Conflict`] when the name already exists.
    pub async fn add(&self, name: &str) -> Result<()> {
        self.users.require_admin().await?;
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("category name cannot be empty".into()));
        }

        match &self.backend {
            Backend::Local(kv) => {
                let mut categories: Vec<Category> = kv.read_list(keys::CATEGORIES);
                if categories.iter().any(|existing| existing == name) {
                    return Err(StoreError::Conflict(format!(
                        "category '{name}' already exists"
                    )));
                }
                categories.push(name.to_owned());
                kv.write(keys::CATEGORIES, &categories)?;
            }
            Backend::Remote(pool) => {
                sqlx::query("INSERT INTO categories (name, created_at) VALUES (?1, ?2)")
                    .bind(name)
                    .bind(remote::now_millis())
                    .execute(pool)
                    .await
                    .map_err(|err| {
                        StoreError::from_sqlx(err, &format!("category '{name}' already exists"))
                    })?;
            }
        }

        self.bus.publish(Topic::CategoriesUpdated);
        Ok(())
    }

    /// Replace the whole category list (admin only). Products are not
    /// touched; names dropped here simply stop resolving.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, or a storage error.
    pub async fn set(&self, names: Vec<Category>) -> Result<()> {
        self.users.require_admin().await?;

        match &self.backend {
            Backend::Local(kv) => kv.write(keys::CATEGORIES, &names)?,
            Backend::Remote(pool) => {
                let mut tx = pool.begin().await?;
                sqlx::query("DELETE FROM categories")
                    .execute(&mut *tx)
                    .await?;
                // Offset timestamps so insertion order survives the round trip.
                let base = remote::now_millis();
                for (position, name) in names.iter().enumerate() {
                    sqlx::query("INSERT INTO categories (name, created_at) VALUES (?1, ?2)")
                        .bind(name)
                        .bind(base + i64::try_from(position).unwrap_or(0))
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
            }
        }

        self.bus.publish(Topic::CategoriesUpdated);
        Ok(())
    }

    /// Rename a category and rewrite every product carrying the old name
    /// (admin only).
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` when `old` does not exist,
    /// `Conflict` when `new` already exists.
    pub async fn rename(&self, old: &str, new: &str) -> Result<()> {
        self.users.require_admin().await?;
        if new.trim().is_empty() {
            return Err(StoreError::Invalid("category name cannot be empty".into()));
        }

        match &self.backend {
            Backend::Local(kv) => {
                let mut categories: Vec<Category> = kv.read_list(keys::CATEGORIES);
                if categories.iter().any(|existing| existing == new) {
                    return Err(StoreError::Conflict(format!(
                        "category '{new}' already exists"
                    )));
                }
                let slot = categories
                    .iter_mut()
                    .find(|existing| *existing == old)
                    .ok_or(StoreError::NotFound)?;
                *slot = new.to_owned();
                kv.write(keys::CATEGORIES, &categories)?;
            }
            Backend::Remote(pool) => {
                let result = sqlx::query("UPDATE categories SET name = ?2 WHERE name = ?1")
                    .bind(old)
                    .bind(new)
                    .execute(pool)
                    .await
                    .map_err(|err| {
                        StoreError::from_sqlx(err, &format!("category '{new}' already exists"))
                    })?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }
            }
        }

        self.products.rewrite_category(old, Some(new)).await?;
        self.bus.publish(Topic::CategoriesUpdated);
        Ok(())
    }

    /// Delete a category, clearing it off every product that carried it
    /// (admin only). Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, or a storage error.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.users.require_admin().await?;

        let removed = match &self.backend {
            Backend::Local(kv) => {
                let mut categories: Vec<Category> = kv.read_list(keys::CATEGORIES);
                let before = categories.len();
                categories.retain(|existing| existing != name);
                let removed = categories.len() != before;
                if removed {
                    kv.write(keys::CATEGORIES, &categories)?;
                }
                removed
            }
            Backend::Remote(pool) => {
                let result = sqlx::query("DELETE FROM categories WHERE name = ?1")
                    .bind(name)
                    .execute(pool)
                    .await?;
                result.rows_affected() > 0
            }
        };

        if removed {
            self.products.rewrite_category(name, None).await?;
            self.bus.publish(Topic::CategoriesUpdated);
        }
        Ok(removed)
    }
}
