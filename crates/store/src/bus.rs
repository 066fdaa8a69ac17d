//! Typed in-process publish/subscribe for entity-change invalidation.
//!
//! Any writer publishes a [`Topic`] after a successful (or degraded) write;
//! any listener re-queries the matching repository when it receives one.
//! Topics carry no payload. The string forms match the legacy event names
//! the UI listened for, and are used for logging.

use tokio::sync::broadcast;

/// Entity-change topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    CartUpdated,
    CategoriesUpdated,
    ProductsUpdated,
    OrdersUpdated,
    UsersUpdated,
    SettingsUpdated,
    BannersUpdated,
    /// Current session identity changed (login, logout, profile edit).
    UserUpdated,
    FavoritesUpdated,
}

impl Topic {
    /// The legacy event name for this topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CartUpdated => "cart-updated",
            Self::CategoriesUpdated => "categories-updated",
            Self::ProductsUpdated => "products-updated",
            Self::OrdersUpdated => "orders-updated",
            Self::UsersUpdated => "users-updated",
            Self::SettingsUpdated => "settings-updated",
            Self::BannersUpdated => "banners-updated",
            Self::UserUpdated => "user-updated",
            Self::FavoritesUpdated => "favorites-updated",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide event bus.
///
/// Cloning is cheap and all clones share the same channel. Publishing with
/// no subscribers is a no-op, not an error.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Topic>,
}

impl EventBus {
    /// Default channel capacity; slow subscribers past this lag and must
    /// re-query anyway, so losing intermediate notifications is harmless.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a topic to all current subscribers.
    pub fn publish(&self, topic: Topic) {
        tracing::debug!(topic = %topic, "publishing entity change");
        let _ = self.tx.send(topic);
    }

    /// Subscribe to all topics. Receivers filter for the topics they care
    /// about and re-query the matching repository.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Topic> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Topic::CartUpdated);

        assert_eq!(rx1.try_recv().unwrap(), Topic::CartUpdated);
        assert_eq!(rx2.try_recv().unwrap(), Topic::CartUpdated);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(Topic::OrdersUpdated);
    }

    #[test]
    fn test_topic_names_match_legacy_events() {
        assert_eq!(Topic::CartUpdated.as_str(), "cart-updated");
        assert_eq!(Topic::UserUpdated.as_str(), "user-updated");
        assert_eq!(Topic::BannersUpdated.as_str(), "banners-updated");
    }
}
