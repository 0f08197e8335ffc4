//! Bounds verification for a soil balance.
//!
//! After every replayed event the balance must satisfy
//!
//! ```text
//! 0 <= available <= capacity
//! ```
//!
//! [`SoilLedger`](crate::SoilLedger) clamps on every mutation, so a
//! violation means corrupted input reached the balance through some other
//! path. It is reported as a [`LedgerAnomaly`], never a panic.

use rust_decimal::Decimal;

use grove_types::SoilBalance;

use crate::LedgerAnomaly;

/// Outcome of a bounds check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundsCheck {
    /// The balance is within bounds.
    Within,
    /// The balance is out of bounds.
    Violation(LedgerAnomaly),
}

/// Check `0 <= available <= capacity`.
pub fn verify_bounds(balance: SoilBalance) -> BoundsCheck {
    if balance.available < Decimal::ZERO {
        return violation(balance, "soil available is negative");
    }
    if balance.available > balance.capacity {
        return violation(balance, "soil available exceeds capacity");
    }
    BoundsCheck::Within
}

fn violation(balance: SoilBalance, reason: &str) -> BoundsCheck {
    tracing::error!(
        capacity = %balance.capacity,
        available = %balance.available,
        reason,
        "SOIL_BOUNDS_ANOMALY"
    );
    BoundsCheck::Violation(LedgerAnomaly {
        balance,
        message: format!(
            "{reason}: available {} / capacity {}",
            balance.available, balance.capacity
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(capacity: i64, available: i64) -> SoilBalance {
        SoilBalance {
            capacity: Decimal::new(capacity, 0),
            available: Decimal::new(available, 0),
        }
    }

    #[test]
    fn within_bounds() {
        assert_eq!(verify_bounds(balance(10, 0)), BoundsCheck::Within);
        assert_eq!(verify_bounds(balance(10, 10)), BoundsCheck::Within);
    }

    #[test]
    fn negative_available_is_a_violation() {
        assert!(matches!(
            verify_bounds(balance(10, -1)),
            BoundsCheck::Violation(a) if a.message.contains("negative")
        ));
    }

    #[test]
    fn available_over_capacity_is_a_violation() {
        assert!(matches!(
            verify_bounds(balance(10, 11)),
            BoundsCheck::Violation(a) if a.message.contains("exceeds")
        ));
    }
}
