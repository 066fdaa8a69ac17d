//! User repository: registration, login, the current-user profile, and the
//! admin gate every privileged mutation goes through.
//!
//! Login failure is always the same neutral `None` whether the email is
//! unknown or the credential is wrong. Registration is the one place a
//! named conflict surfaces: [`StoreError::EmailTaken`], checked
//! case-insensitively.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lilymart_core::{Credential, Email, Gender, NewUser, User, UserId, UserPatch};

use crate::bus::{EventBus, Topic};
use crate::error::{Result, StoreError};
use crate::local::keys;
use crate::remote;
use crate::repos::Backend;
use crate::session::Session;

/// Email of the seeded bootstrap admin (a legacy bare local name).
pub const DEFAULT_ADMIN_EMAIL: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Repository for [`User`] entities and the session they anchor.
#[derive(Clone, Debug)]
pub struct UserRepository {
    backend: Backend,
    session: Session,
    bus: EventBus,
}

impl UserRepository {
    pub(crate) const fn new(backend: Backend, session: Session, bus: EventBus) -> Self {
        Self {
            backend,
            session,
            bus,
        }
    }

    /// All registered users. Never fails; storage errors degrade to empty.
    pub async fn get(&self) -> Vec<User> {
        match &self.backend {
            Backend::Local(kv) => kv.read_list(keys::USERS),
            Backend::Remote(pool) => match fetch_all(pool).await {
                Ok(users) => users,
                Err(err) => {
                    tracing::warn!(error = %err, "user query failed, returning empty");
                    Vec::new()
                }
            },
        }
    }

    /// Look up a user by id.
    pub async fn find_by_id(&self, id: &UserId) -> Option<User> {
        match &self.backend {
            Backend::Local(kv) => kv
                .read_list::<User>(keys::USERS)
                .into_iter()
                .find(|user| &user.id == id),
            Backend::Remote(pool) => {
                let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
                    .bind(id.as_str())
                    .fetch_optional(pool)
                    .await;
                match row {
                    Ok(row) => row.and_then(|row| match user_from_row(&row) {
                        Ok(user) => Some(user),
                        Err(err) => {
                            tracing::warn!(user_id = %id, error = %err, "corrupt user row");
                            None
                        }
                    }),
                    Err(err) => {
                        tracing::warn!(user_id = %id, error = %err, "user lookup failed");
                        None
                    }
                }
            }
        }
    }

    /// Register a new user and bind the session to them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmailTaken`] when the email is already
    /// registered (case-insensitive), or a storage error from the write.
    pub async fn register(&self, new: NewUser) -> Result<User> {
        let user = new.into_user(UserId::from(Uuid::new_v4().to_string()), Utc::now());
        self.insert(&user).await?;
        self.session.set_current_user_id(Some(&user.id));
        self.bus.publish(Topic::UsersUpdated);
        Ok(user)
    }

    /// Authenticate and bind the session. `None` on any failure - unknown
    /// email and wrong credential are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let user = self
            .get()
            .await
            .into_iter()
            .find(|user| user.email.matches(email) && user.password.matches(password))?;
        self.session.set_current_user_id(Some(&user.id));
        Some(user)
    }

    /// Clear the session identity.
    pub fn logout(&self) {
        self.session.set_current_user_id(None);
    }

    /// The user the session is bound to, if any.
    pub async fn current(&self) -> Option<User> {
        let id = self.session.current_user_id()?;
        self.find_by_id(&id).await
    }

    /// Update the current user's profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no session is bound or the
    /// bound user no longer exists.
    pub async fn update_current(&self, patch: UserPatch) -> Result<User> {
        let id = self.session.current_user_id().ok_or(StoreError::NotFound)?;
        let mut user = self.find_by_id(&id).await.ok_or(StoreError::NotFound)?;
        patch.apply(&mut user);

        match &self.backend {
            Backend::Local(kv) => {
                let mut users: Vec<User> = kv.read_list(keys::USERS);
                let slot = users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(StoreError::NotFound)?;
                *slot = user.clone();
                kv.write(keys::USERS, &users)?;
            }
            Backend::Remote(pool) => {
                sqlx::query(
                    "UPDATE users SET name = ?2, last_name = ?3, phone = ?4, avatar = ?5, \
                     gender = ?6, birth_year = ?7, birth_month = ?8, birth_day = ?9 \
                     WHERE id = ?1",
                )
                .bind(id.as_str())
                .bind(&user.name)
                .bind(&user.last_name)
                .bind(&user.phone)
                .bind(&user.avatar)
                .bind(user.gender.map(gender_to_str))
                .bind(user.birth_year)
                .bind(user.birth_month)
                .bind(user.birth_day)
                .execute(pool)
                .await?;
            }
        }

        self.bus.publish(Topic::UserUpdated);
        Ok(user)
    }

    /// Delete the current user's account and clear the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no session is bound or the
    /// bound user no longer exists.
    pub async fn delete_current(&self) -> Result<()> {
        let id = self.session.current_user_id().ok_or(StoreError::NotFound)?;

        match &self.backend {
            Backend::Local(kv) => {
                let mut users: Vec<User> = kv.read_list(keys::USERS);
                let before = users.len();
                users.retain(|user| user.id != id);
                if users.len() == before {
                    return Err(StoreError::NotFound);
                }
                kv.write(keys::USERS, &users)?;
            }
            Backend::Remote(pool) => {
                let result = sqlx::query("DELETE FROM users WHERE id = ?1")
                    .bind(id.as_str())
                    .execute(pool)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }
            }
        }

        self.session.set_current_user_id(None);
        self.bus.publish(Topic::UsersUpdated);
        Ok(())
    }

    /// Ensure exactly one bootstrap admin account exists.
    ///
    /// Promotes an existing account registered under the default admin
    /// email; otherwise inserts the default admin, but only into an empty
    /// user table. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the promote/insert write.
    pub async fn seed_default_admin(&self) -> Result<()> {
        let users = self.get().await;

        if let Some(existing) = users
            .iter()
            .find(|user| user.email.matches(DEFAULT_ADMIN_EMAIL))
        {
            if existing.is_admin {
                return Ok(());
            }
            return self.promote(&existing.id).await;
        }
        if !users.is_empty() {
            return Ok(());
        }

        let email = Email::parse(DEFAULT_ADMIN_EMAIL)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let admin = NewUser {
            name: "Admin".to_owned(),
            last_name: None,
            email,
            phone: "0000000000".to_owned(),
            avatar: None,
            password: Credential::from(DEFAULT_ADMIN_PASSWORD),
            gender: None,
            birth_year: None,
            birth_month: None,
            birth_day: None,
            is_admin: true,
        }
        .into_user(UserId::from(Uuid::new_v4().to_string()), Utc::now());

        self.insert(&admin).await?;
        self.bus.publish(Topic::UsersUpdated);
        tracing::info!("seeded default admin account");
        Ok(())
    }

    /// The current user, required to be an admin.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Forbidden`] for anonymous and non-admin
    /// sessions alike.
    pub(crate) async fn require_admin(&self) -> Result<User> {
        self.current()
            .await
            .filter(|user| user.is_admin)
            .ok_or(StoreError::Forbidden)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        match &self.backend {
            Backend::Local(kv) => {
                let mut users: Vec<User> = kv.read_list(keys::USERS);
                if users.iter().any(|u| u.email.key() == user.email.key()) {
                    return Err(StoreError::EmailTaken);
                }
                users.push(user.clone());
                kv.write(keys::USERS, &users)?;
            }
            Backend::Remote(pool) => {
                // Check-then-act; the NOCASE unique index backstops the race.
                let taken = sqlx::query("SELECT 1 FROM users WHERE email = ?1")
                    .bind(user.email.as_str())
                    .fetch_optional(pool)
                    .await?;
                if taken.is_some() {
                    return Err(StoreError::EmailTaken);
                }
                sqlx::query(
                    "INSERT INTO users (id, name, last_name, email, phone, avatar, password, \
                     gender, birth_year, birth_month, birth_day, is_admin, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                )
                .bind(user.id.as_str())
                .bind(&user.name)
                .bind(&user.last_name)
                .bind(user.email.as_str())
                .bind(&user.phone)
                .bind(&user.avatar)
                .bind(user.password.expose())
                .bind(user.gender.map(gender_to_str))
                .bind(user.birth_year)
                .bind(user.birth_month)
                .bind(user.birth_day)
                .bind(user.is_admin)
                .bind(user.created_at.timestamp_millis())
                .execute(pool)
                .await
                .map_err(|err| {
                    if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                        StoreError::EmailTaken
                    } else {
                        StoreError::Remote(err)
                    }
                })?;
            }
        }
        Ok(())
    }

    async fn promote(&self, id: &UserId) -> Result<()> {
        match &self.backend {
            Backend::Local(kv) => {
                let mut users: Vec<User> = kv.read_list(keys::USERS);
                if let Some(user) = users.iter_mut().find(|u| &u.id == id) {
                    user.is_admin = true;
                }
                kv.write(keys::USERS, &users)?;
            }
            Backend::Remote(pool) => {
                sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?1")
                    .bind(id.as_str())
                    .execute(pool)
                    .await?;
            }
        }
        self.bus.publish(Topic::UsersUpdated);
        Ok(())
    }
}

async fn fetch_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let email: String = row.try_get("email")?;
    let email = Email::parse(&email).map_err(|err| StoreError::DataCorruption(err.to_string()))?;
    let gender: Option<String> = row.try_get("gender")?;
    Ok(User {
        id: UserId::from(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        last_name: row.try_get("last_name")?,
        email,
        phone: row.try_get("phone")?,
        avatar: row.try_get("avatar")?,
        password: Credential::from(row.try_get::<String, _>("password")?),
        gender: gender.as_deref().and_then(gender_from_str),
        birth_year: row.try_get("birth_year")?,
        birth_month: row.try_get("birth_month")?,
        birth_day: row.try_get("birth_day")?,
        is_admin: row.try_get("is_admin")?,
        created_at: remote::datetime_from_millis(row.try_get("created_at")?),
    })
}

const fn gender_to_str(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

fn gender_from_str(s: &str) -> Option<Gender> {
    match s {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        "other" => Some(Gender::Other),
        _ => None,
    }
}
