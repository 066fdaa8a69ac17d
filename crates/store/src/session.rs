//! Identity binding: the authenticated user for this device session.
//!
//! The current user id lives in the device-local store under
//! `current_user_id` as a bare string (not JSON), exactly as the legacy
//! client wrote it. Repositories receive the session explicitly instead of
//! consulting hidden global state; it scopes carts/orders to a user and
//! anchors the admin gate.

use lilymart_core::UserId;

use crate::bus::{EventBus, Topic};
use crate::local::{LocalKv, keys};

/// The device session's identity binding.
#[derive(Clone, Debug)]
pub struct Session {
    kv: LocalKv,
    bus: EventBus,
}

impl Session {
    /// Create a session over the device-local store.
    #[must_use]
    pub const fn new(kv: LocalKv, bus: EventBus) -> Self {
        Self { kv, bus }
    }

    /// The authenticated user's id, if any.
    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.kv
            .read_raw(keys::CURRENT_USER)
            .filter(|id| !id.is_empty())
            .map(UserId::from)
    }

    /// Whether a user is logged in on this device.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }

    /// Bind (or with `None`, clear) the session identity. Publishes
    /// `user-updated` either way.
    pub fn set_current_user_id(&self, id: Option<&UserId>) {
        match id {
            Some(id) => {
                if let Err(err) = self.kv.write_raw(keys::CURRENT_USER, id.as_str()) {
                    tracing::warn!(error = %err, "failed to persist session identity");
                }
            }
            None => self.kv.remove(keys::CURRENT_USER),
        }
        self.bus.publish(Topic::UserUpdated);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::local::MemoryStore;

    #[test]
    fn test_identity_roundtrip_is_bare_string() {
        let kv = LocalKv::new(MemoryStore::new());
        let session = Session::new(kv.clone(), EventBus::new());

        assert!(!session.is_authenticated());
        session.set_current_user_id(Some(&UserId::from("u-1")));

        // Stored as a bare id, not a JSON-quoted string.
        assert_eq!(kv.read_raw(keys::CURRENT_USER).as_deref(), Some("u-1"));
        assert_eq!(session.current_user_id(), Some(UserId::from("u-1")));

        session.set_current_user_id(None);
        assert!(kv.read_raw(keys::CURRENT_USER).is_none());
    }

    #[test]
    fn test_identity_change_publishes_user_updated() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let session = Session::new(LocalKv::new(MemoryStore::new()), bus);

        session.set_current_user_id(Some(&UserId::from("u-1")));
        assert_eq!(rx.try_recv().unwrap(), Topic::UserUpdated);
    }
}
