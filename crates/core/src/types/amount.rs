//! Integer currency amounts.
//!
//! All prices and totals in the system are minor-unit-free integers (the
//! currency has no fractional unit), so amounts are plain `i64` wrapped for
//! type safety. Arithmetic saturates rather than wrapping: a cart total can
//! never overflow into a negative number.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A currency amount in whole units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw integer value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw integer value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Whether this amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiply by a quantity, saturating at the numeric bounds.
    #[must_use]
    pub const fn times(self, qty: u32) -> Self {
        Self(self.0.saturating_mul(qty as i64))
    }

    /// Add another amount, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let lines = [Amount::new(1000).times(3), Amount::new(250).times(2)];
        let total: Amount = lines.into_iter().sum();
        assert_eq!(total, Amount::new(3500));
    }

    #[test]
    fn test_saturating() {
        let max = Amount::new(i64::MAX);
        assert_eq!(max.times(2), max);
        assert_eq!(max + Amount::new(1), max);
    }

    #[test]
    fn test_serde_is_bare_number() {
        let json = serde_json::to_string(&Amount::new(105_000)).unwrap();
        assert_eq!(json, "105000");
        let back: Amount = serde_json::from_str("105000").unwrap();
        assert_eq!(back, Amount::new(105_000));
    }
}
