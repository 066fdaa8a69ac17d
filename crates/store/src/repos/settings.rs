//! Settings repository (singleton).

use sqlx::Row;

use lilymart_core::Settings;

use crate::bus::{EventBus, Topic};
use crate::error::{Result, StoreError};
use crate::local::keys;
use crate::remote;
use crate::repos::{Backend, users::UserRepository};

/// Repository for the store-wide [`Settings`] record.
#[derive(Clone, Debug)]
pub struct SettingsRepository {
    backend: Backend,
    users: UserRepository,
    bus: EventBus,
}

impl SettingsRepository {
    pub(crate) const fn new(backend: Backend, users: UserRepository, bus: EventBus) -> Self {
        Self {
            backend,
            users,
            bus,
        }
    }

    /// The settings singleton; defaults when nothing has been saved yet.
    /// Never fails.
    pub async fn get(&self) -> Settings {
        match &self.backend {
            Backend::Local(kv) => kv.read(keys::SETTINGS).unwrap_or_default(),
            Backend::Remote(pool) => {
                let row = sqlx::query("SELECT * FROM settings WHERE id = 1")
                    .fetch_optional(pool)
                    .await;
                match row {
                    Ok(Some(row)) => settings_from_row(&row).unwrap_or_else(|err| {
                        tracing::warn!(error = %err, "corrupt settings row, using defaults");
                        Settings::default()
                    }),
                    Ok(None) => Settings::default(),
                    Err(err) => {
                        tracing::warn!(error = %err, "settings query failed, using defaults");
                        Settings::default()
                    }
                }
            }
        }
    }

    /// Replace the settings singleton (admin only).
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `Invalid` for a negative shipping fee,
    /// or a storage error.
    pub async fn set(&self, settings: Settings) -> Result<Settings> {
        self.users.require_admin().await?;
        if settings.shipping_fee.is_negative() {
            return Err(StoreError::Invalid(
                "shipping fee cannot be negative".into(),
            ));
        }

        match &self.backend {
            Backend::Local(kv) => kv.write(keys::SETTINGS, &settings)?,
            Backend::Remote(pool) => {
                sqlx::query(
                    "INSERT INTO settings (id, shipping_fee, bank_accounts, \
                     product_details_text, product_specs_text, shipping_return_text) \
                     VALUES (1, ?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT (id) DO UPDATE SET shipping_fee = excluded.shipping_fee, \
                     bank_accounts = excluded.bank_accounts, \
                     product_details_text = excluded.product_details_text, \
                     product_specs_text = excluded.product_specs_text, \
                     shipping_return_text = excluded.shipping_return_text",
                )
                .bind(settings.shipping_fee.as_i64())
                .bind(remote::to_json(&settings.bank_accounts)?)
                .bind(&settings.product_details_text)
                .bind(&settings.product_specs_text)
                .bind(&settings.shipping_return_text)
                .execute(pool)
                .await?;
            }
        }

        self.bus.publish(Topic::SettingsUpdated);
        Ok(settings)
    }
}

fn settings_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Settings> {
    Ok(Settings {
        shipping_fee: lilymart_core::Amount::new(row.try_get("shipping_fee")?),
        bank_accounts: remote::from_json_or_default(row.try_get("bank_accounts")?),
        product_details_text: row
            .try_get::<Option<String>, _>("product_details_text")?
            .unwrap_or_default(),
        product_specs_text: row
            .try_get::<Option<String>, _>("product_specs_text")?
            .unwrap_or_default(),
        shipping_return_text: row
            .try_get::<Option<String>, _>("shipping_return_text")?
            .unwrap_or_default(),
    })
}
