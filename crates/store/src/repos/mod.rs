//! Entity repositories.
//!
//! One repository per entity, each holding the [`Backend`] chosen once at
//! startup - there is no per-call branching on authentication or feature
//! flags. [`Store`] wires them together and hosts the two cross-repository
//! flows: login/register (users + cart merge) and the category cascade
//! (categories + products, wired inside [`CategoryRepository`]).

pub mod banners;
pub mod cart;
pub mod categories;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;

use sqlx::SqlitePool;

use lilymart_core::{NewUser, User};

use crate::bus::EventBus;
use crate::config::{BackendKind, StoreConfig};
use crate::error::{Result, StoreError};
use crate::local::{FileStore, LocalKv};
use crate::remote;
use crate::session::Session;

pub use banners::BannerRepository;
pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use favorites::FavoritesRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// The backing store a repository reads and writes.
#[derive(Clone, Debug)]
pub enum Backend {
    /// Device-local key/value store only.
    Local(LocalKv),
    /// Remote relational store.
    Remote(SqlitePool),
}

/// The assembled data layer: every repository plus the bus and session
/// they share. Cloning is cheap; clones share all state.
#[derive(Clone, Debug)]
pub struct Store {
    pub bus: EventBus,
    pub session: Session,
    pub products: ProductRepository,
    pub categories: CategoryRepository,
    pub cart: CartRepository,
    pub orders: OrderRepository,
    pub users: UserRepository,
    pub settings: SettingsRepository,
    pub banners: BannerRepository,
    pub favorites: FavoritesRepository,
}

impl Store {
    /// Open the data layer described by `config`: a file-backed local
    /// store under `config.data_dir`, plus a migrated remote pool when the
    /// remote backend is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created, the
    /// remote connection fails, or migrations fail.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let file_store = match config.local_capacity {
            Some(capacity) => FileStore::open_with_capacity(&config.data_dir, capacity),
            None => FileStore::open(&config.data_dir),
        }
        .map_err(crate::local::LocalStoreError::Io)?;
        let kv = LocalKv::new(file_store);

        let pool = match (config.backend, &config.database_url) {
            (BackendKind::Remote, Some(url)) => Some(remote::connect(url).await?),
            (BackendKind::Remote, None) => {
                return Err(StoreError::Invalid(
                    "remote backend selected without a database url".into(),
                ));
            }
            (BackendKind::Local, _) => None,
        };

        Ok(Self::assemble(kv, pool))
    }

    /// Wire all repositories over an explicit local store and optional
    /// remote pool. [`Store::open`] goes through here; tests use it
    /// directly with a [`MemoryStore`](crate::local::MemoryStore) or an
    /// in-memory pool.
    #[must_use]
    pub fn assemble(kv: LocalKv, pool: Option<SqlitePool>) -> Self {
        let bus = EventBus::new();
        let session = Session::new(kv.clone(), bus.clone());
        let backend = pool.clone().map_or_else(
            || Backend::Local(kv.clone()),
            Backend::Remote,
        );

        let users = UserRepository::new(backend.clone(), session.clone(), bus.clone());
        let products = ProductRepository::new(backend.clone(), users.clone(), bus.clone());
        let categories = CategoryRepository::new(
            backend.clone(),
            products.clone(),
            users.clone(),
            bus.clone(),
        );
        let cart = CartRepository::new(
            kv.clone(),
            pool,
            products.clone(),
            session.clone(),
            bus.clone(),
        );
        let settings = SettingsRepository::new(backend.clone(), users.clone(), bus.clone());
        let orders = OrderRepository::new(
            backend.clone(),
            cart.clone(),
            settings.clone(),
            products.clone(),
            users.clone(),
            session.clone(),
            bus.clone(),
        );
        let banners = BannerRepository::new(backend, users.clone(), bus.clone());
        let favorites = FavoritesRepository::new(kv, bus.clone());

        Self {
            bus,
            session,
            products,
            categories,
            cart,
            orders,
            users,
            settings,
            banners,
            favorites,
        }
    }

    /// One-time startup work: ensure the bootstrap admin exists.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the seeding write.
    pub async fn bootstrap(&self) -> Result<()> {
        self.users.seed_default_admin().await
    }

    /// Register a new user, bind the session, and fold any remote cart
    /// mirror into the device cart.
    ///
    /// # Errors
    ///
    /// See [`UserRepository::register`].
    pub async fn register(&self, new: NewUser) -> Result<User> {
        let user = self.users.register(new).await?;
        self.cart.merge_on_login().await;
        Ok(user)
    }

    /// Log in, merging the user's remote cart mirror into the device cart
    /// on success. `None` on any authentication failure.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let user = self.users.login(email, password).await?;
        self.cart.merge_on_login().await;
        Some(user)
    }

    /// Clear the session identity. The device cart stays put.
    pub fn logout(&self) {
        self.users.logout();
    }
}
