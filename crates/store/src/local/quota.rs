//! Write-path degradation for capacity-constrained local storage.
//!
//! Cart and order writes go through this guard so UI code never sees a
//! quota error. The cascade, stopping at the first success:
//!
//! 1. write the full entity list verbatim;
//! 2. rewrite keeping only identity + quantity (the "light" shape);
//! 3. delete the key entirely rather than leave a corrupt partial value.
//!
//! The caller publishes its bus topic after every attempt, success or not,
//! so the UI reflects the best-effort state.

use lilymart_core::{CartLine, Order};
use serde::Serialize;

use super::{LocalKv, keys};
use crate::migrate::{light_lines, light_order};

/// Which level of the cascade a write landed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Full records stored.
    Full,
    /// Degraded to light records.
    Light,
    /// Both writes failed; the key was deleted.
    Evicted,
}

/// Store cart lines, degrading under capacity pressure.
pub fn store_cart(kv: &LocalKv, lines: &[CartLine]) -> WriteOutcome {
    degrade(kv, keys::CART, lines, &light_lines(lines))
}

/// Store orders, degrading under capacity pressure.
pub fn store_orders(kv: &LocalKv, orders: &[Order]) -> WriteOutcome {
    let light: Vec<_> = orders.iter().map(light_order).collect();
    degrade(kv, keys::ORDERS, orders, &light)
}

fn degrade<F: Serialize + ?Sized, L: Serialize>(
    kv: &LocalKv,
    key: &str,
    full: &F,
    light: &L,
) -> WriteOutcome {
    let full_err = match kv.write(key, full) {
        Ok(()) => return WriteOutcome::Full,
        Err(err) => err,
    };
    tracing::warn!(key, error = %full_err, "full write failed, degrading to light records");

    let light_err = match kv.write(key, light) {
        Ok(()) => return WriteOutcome::Light,
        Err(err) => err,
    };
    tracing::warn!(key, error = %light_err, "light write failed, clearing key");

    kv.remove(key);
    WriteOutcome::Evicted
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::local::MemoryStore;
    use crate::migrate::{StoredCartLine, StoredOrder};
    use lilymart_core::{Amount, Customer, LineId, Order, OrderId, OrderStatus, ProductId};

    fn line(id: &str, qty: u32) -> CartLine {
        CartLine {
            id: LineId::from(id),
            name: "A rather long product name that pads the record".into(),
            price: Amount::new(129_000),
            image: "https://cdn.example.com/a-long-image-url.jpg".into(),
            qty,
            product_id: Some(ProductId::from(id)),
            color: None,
            size: None,
        }
    }

    #[test]
    fn test_full_write_when_space_allows() {
        let kv = LocalKv::new(MemoryStore::new());
        assert_eq!(store_cart(&kv, &[line("p1", 1)]), WriteOutcome::Full);
        let stored: Vec<StoredCartLine> = kv.read_list(keys::CART);
        assert!(!stored[0].is_light());
    }

    #[test]
    fn test_degrades_to_light_under_pressure() {
        // Roomy enough for the light list but not the full one.
        let kv = LocalKv::new(MemoryStore::with_capacity(120));
        let lines = [line("p1", 2), line("p2", 3)];
        assert_eq!(store_cart(&kv, &lines), WriteOutcome::Light);

        let stored: Vec<StoredCartLine> = kv.read_list(keys::CART);
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(StoredCartLine::is_light));
    }

    fn order(id: &str) -> Order {
        Order {
            id: OrderId::from(id),
            created_at: chrono::Utc::now(),
            items: vec![line("p1", 2)],
            total: Amount::new(258_000),
            customer: Customer {
                name: "A".into(),
                phone: "1".into(),
                address: "B".into(),
            },
            status: OrderStatus::Unpaid,
            user_id: None,
        }
    }

    #[test]
    fn test_full_order_write_when_space_allows() {
        let kv = LocalKv::new(MemoryStore::new());
        assert_eq!(store_orders(&kv, &[order("000001")]), WriteOutcome::Full);
        let stored: Vec<StoredOrder> = kv.read_list(keys::ORDERS);
        assert!(!stored[0].items[0].is_light());
    }

    #[test]
    fn test_orders_degrade_to_light_under_pressure() {
        // Fits the light order but not the full one.
        let kv = LocalKv::new(MemoryStore::with_capacity(260));
        assert_eq!(store_orders(&kv, &[order("000001")]), WriteOutcome::Light);

        let stored: Vec<StoredOrder> = kv.read_list(keys::ORDERS);
        assert_eq!(stored.len(), 1);
        assert!(stored[0].items.iter().all(StoredCartLine::is_light));
        assert_eq!(stored[0].total, Amount::new(258_000));
    }

    #[test]
    fn test_evicts_when_even_light_fails() {
        let kv = LocalKv::new(MemoryStore::with_capacity(8));
        let lines = [line("p1", 1)];
        assert_eq!(store_cart(&kv, &lines), WriteOutcome::Evicted);
        assert!(kv.read_raw(keys::CART).is_none());
    }

    #[test]
    fn test_subsequent_read_preserves_cardinality_after_degradation() {
        let kv = LocalKv::new(MemoryStore::with_capacity(120));
        let lines = [line("p1", 2), line("p2", 3)];
        store_cart(&kv, &lines);

        let stored: Vec<StoredCartLine> = kv.read_list(keys::CART);
        let rehydrated = crate::migrate::rehydrate_lines(stored, &[]);
        assert_eq!(rehydrated.len(), lines.len());
        assert_eq!(rehydrated[0].qty, 2);
        assert_eq!(rehydrated[0].name, "");
    }
}
