//! Status and option enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The common progression is `unpaid -> paid -> shipping -> delivered`, but
/// an admin may set any value at any time; nothing enforces the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Unpaid,
    Paid,
    Shipping,
    Delivered,
}

impl OrderStatus {
    /// All statuses in their conventional progression order.
    pub const ALL: [Self; 4] = [Self::Unpaid, Self::Paid, Self::Shipping, Self::Delivered];

    /// The wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
        }
    }

    /// Migrate any stored status string to the current enum.
    ///
    /// Accepts the current 4-state values as well as the older 5-state
    /// vocabulary (`new`, `processing`, `shipped`, ...). Unrecognized values
    /// fall back to the most conservative state, `Unpaid`.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        match s {
            "paid" | "processing" => Self::Paid,
            "shipping" | "shipped" => Self::Shipping,
            "delivered" => Self::Delivered,
            _ => Self::Unpaid,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-declared gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_status_migration() {
        assert_eq!(OrderStatus::from_stored("new"), OrderStatus::Unpaid);
        assert_eq!(OrderStatus::from_stored("processing"), OrderStatus::Paid);
        assert_eq!(OrderStatus::from_stored("shipped"), OrderStatus::Shipping);
        assert_eq!(
            OrderStatus::from_stored("delivered"),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_current_statuses_pass_through() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_stored(status.as_str()), status);
        }
    }

    #[test]
    fn test_unrecognized_maps_to_unpaid() {
        assert_eq!(OrderStatus::from_stored("cancelled"), OrderStatus::Unpaid);
        assert_eq!(OrderStatus::from_stored(""), OrderStatus::Unpaid);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Shipping).unwrap();
        assert_eq!(json, "\"shipping\"");
    }
}
