//! Banner repository.
//!
//! Banners are edited as a whole ordered list: `set` recomputes every
//! item's `order` rank from its position and, on the remote side, diffs
//! against the stored set (update/insert/delete by id). The local variant
//! is a destructive overwrite - there is no concurrent editor to diff
//! against.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lilymart_core::{Banner, BannerId};

use crate::bus::{EventBus, Topic};
use crate::error::Result;
use crate::local::keys;
use crate::repos::{Backend, users::UserRepository};

/// Repository for [`Banner`] entities.
#[derive(Clone, Debug)]
pub struct BannerRepository {
    backend: Backend,
    users: UserRepository,
    bus: EventBus,
}

impl BannerRepository {
    pub(crate) const fn new(backend: Backend, users: UserRepository, bus: EventBus) -> Self {
        Self {
            backend,
            users,
            bus,
        }
    }

    /// All banners by ascending rank. Never fails.
    pub async fn get(&self) -> Vec<Banner> {
        match &self.backend {
            Backend::Local(kv) => {
                let mut banners: Vec<Banner> = kv.read_list(keys::BANNERS);
                // Legacy records may lack `order`; stored position breaks ties.
                banners.sort_by_key(|banner| banner.order);
                banners
            }
            Backend::Remote(pool) => match fetch_all(pool).await {
                Ok(banners) => banners,
                Err(err) => {
                    tracing::warn!(error = %err, "banner query failed, returning empty");
                    Vec::new()
                }
            },
        }
    }

    /// Replace the banner list (admin only). Position in the incoming list
    /// becomes each banner's `order`; items with an empty id get one
    /// minted. Returns the normalized list.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, or a storage error.
    pub async fn set(&self, banners: Vec<Banner>) -> Result<Vec<Banner>> {
        self.users.require_admin().await?;

        let banners: Vec<Banner> = banners
            .into_iter()
            .enumerate()
            .map(|(position, mut banner)| {
                if banner.id.as_str().is_empty() {
                    banner.id = BannerId::from(Uuid::new_v4().to_string());
                }
                banner.order = i64::try_from(position).unwrap_or(i64::MAX);
                banner
            })
            .collect();

        match &self.backend {
            Backend::Local(kv) => kv.write(keys::BANNERS, &banners)?,
            Backend::Remote(pool) => diff_apply(pool, &banners).await?,
        }

        self.bus.publish(Topic::BannersUpdated);
        Ok(banners)
    }
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Banner>> {
    let rows = sqlx::query("SELECT * FROM banners ORDER BY \"order\"")
        .fetch_all(pool)
        .await?;
    rows.iter().map(banner_from_row).collect()
}

async fn diff_apply(pool: &SqlitePool, banners: &[Banner]) -> Result<()> {
    let existing: Vec<(String,)> = sqlx::query_as("SELECT id FROM banners")
        .fetch_all(pool)
        .await?;

    let mut tx = pool.begin().await?;
    for (id,) in &existing {
        if !banners.iter().any(|banner| banner.id.as_str() == id) {
            sqlx::query("DELETE FROM banners WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
    }
    for banner in banners {
        sqlx::query(
            "INSERT INTO banners (id, image, title, subtitle, link, \"order\") \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (id) DO UPDATE SET image = excluded.image, \
             title = excluded.title, subtitle = excluded.subtitle, \
             link = excluded.link, \"order\" = excluded.\"order\"",
        )
        .bind(banner.id.as_str())
        .bind(&banner.image)
        .bind(&banner.title)
        .bind(&banner.subtitle)
        .bind(&banner.link)
        .bind(banner.order)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

fn banner_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Banner> {
    Ok(Banner {
        id: BannerId::from(row.try_get::<String, _>("id")?),
        image: row.try_get("image")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        link: row.try_get("link")?,
        order: row.try_get("order")?,
    })
}
