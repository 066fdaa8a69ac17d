//! Favorites repository.
//!
//! Favorites are a device-level affordance: always the local store, no
//! remote mirror, no authentication involved. Writes are absorbed like
//! cart writes - losing a heart click to a quota error is worse than
//! losing the heart.

use lilymart_core::ProductId;

use crate::bus::{EventBus, Topic};
use crate::local::{LocalKv, keys};

/// Repository for the favorited product ids.
#[derive(Clone, Debug)]
pub struct FavoritesRepository {
    kv: LocalKv,
    bus: EventBus,
}

impl FavoritesRepository {
    pub(crate) const fn new(kv: LocalKv, bus: EventBus) -> Self {
        Self { kv, bus }
    }

    /// The favorited product ids, in the order they were added. Never
    /// fails.
    #[must_use]
    pub fn get(&self) -> Vec<ProductId> {
        self.kv.read_list(keys::FAVORITES)
    }

    /// Replace the favorites list.
    pub fn set(&self, ids: Vec<ProductId>) {
        if let Err(err) = self.kv.write(keys::FAVORITES, &ids) {
            tracing::warn!(error = %err, "favorites write failed, keeping previous list");
        }
        self.bus.publish(Topic::FavoritesUpdated);
    }

    /// Flip a product's favorited state; returns whether it is now a
    /// favorite.
    pub fn toggle(&self, id: &ProductId) -> bool {
        let mut ids = self.get();
        let now_favorite = if ids.contains(id) {
            ids.retain(|existing| existing != id);
            false
        } else {
            ids.push(id.clone());
            true
        };
        self.set(ids);
        now_favorite
    }

    /// Whether a product is favorited.
    #[must_use]
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.get().contains(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::local::MemoryStore;

    #[test]
    fn test_toggle_roundtrip() {
        let repo = FavoritesRepository::new(LocalKv::new(MemoryStore::new()), EventBus::new());
        let id = ProductId::from("p1");

        assert!(repo.toggle(&id));
        assert!(repo.is_favorite(&id));
        assert_eq!(repo.get(), vec![id.clone()]);

        assert!(!repo.toggle(&id));
        assert!(repo.get().is_empty());
    }

    #[test]
    fn test_set_publishes() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let repo = FavoritesRepository::new(LocalKv::new(MemoryStore::new()), bus);

        repo.set(vec![ProductId::from("p1")]);
        assert_eq!(rx.try_recv().unwrap(), Topic::FavoritesUpdated);
    }
}
