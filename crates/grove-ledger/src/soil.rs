//! The soil balance and its clamp rules.
//!
//! [`SoilLedger`] is the only code allowed to change a [`SoilBalance`].
//! Every mutation clamps so that `0 <= available <= capacity` holds after
//! each call, and capacity only ever moves up.

use rust_decimal::Decimal;

use grove_types::SoilBalance;

use crate::EconomyTable;

/// A soil balance under replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoilLedger {
    /// Current balance.
    balance: SoilBalance,
    /// Ceiling for capacity growth.
    max_capacity: Decimal,
    /// Rounding applied after every mutation.
    precision: u32,
}

impl SoilLedger {
    /// A fresh ledger at the table's starting capacity, fully available.
    pub fn new(table: &EconomyTable) -> Self {
        let start = table.round(table.starting_capacity.max(Decimal::ZERO));
        Self {
            balance: SoilBalance {
                capacity: start,
                available: start,
            },
            max_capacity: table.max_capacity,
            precision: table.precision,
        }
    }

    /// The current balance.
    pub const fn balance(&self) -> SoilBalance {
        self.balance
    }

    /// Whether `cost` can be paid in full from available soil.
    pub fn can_afford(&self, cost: Decimal) -> bool {
        cost <= self.balance.available
    }

    /// Debit `cost`, flooring availability at zero.
    ///
    /// Returns the amount actually debited.
    pub fn spend(&mut self, cost: Decimal) -> Decimal {
        let cost = cost.max(Decimal::ZERO);
        let before = self.balance.available;
        let after = before.checked_sub(cost).unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        self.balance.available = self.round(after);
        before.checked_sub(self.balance.available).unwrap_or(Decimal::ZERO)
    }

    /// Credit `amount` to availability, capped at capacity.
    ///
    /// Returns the amount actually credited.
    pub fn recover(&mut self, amount: Decimal) -> Decimal {
        let before = self.balance.available;
        self.balance.available = self.capped_credit(before, amount, self.balance.capacity);
        self.balance.available.checked_sub(before).unwrap_or(Decimal::ZERO)
    }

    /// Grow capacity by `gain` (capped at the maximum) and credit the same
    /// amount to availability (capped at the new capacity).
    pub fn grow(&mut self, gain: Decimal) {
        let gain = gain.max(Decimal::ZERO);
        let current = self.balance.capacity;
        let grown = current
            .checked_add(gain)
            .unwrap_or(self.max_capacity)
            .min(self.max_capacity);
        // A table whose ceiling sits below the current capacity must not
        // shrink it.
        self.balance.capacity = self.round(grown.max(current));
        self.balance.available =
            self.capped_credit(self.balance.available, gain, self.balance.capacity);
    }

    /// `min(base + amount, cap)`, rounded, with negative amounts ignored.
    fn capped_credit(&self, base: Decimal, amount: Decimal, cap: Decimal) -> Decimal {
        let amount = amount.max(Decimal::ZERO);
        let credited = base.checked_add(amount).unwrap_or(cap).min(cap);
        self.round(credited)
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(
            self.precision,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> SoilLedger {
        SoilLedger::new(&EconomyTable::default())
    }

    #[test]
    fn fresh_ledger_is_full() {
        let soil = ledger();
        assert_eq!(soil.balance().capacity, Decimal::new(10, 0));
        assert_eq!(soil.balance().available, Decimal::new(10, 0));
    }

    #[test]
    fn spend_floors_at_zero() {
        let mut soil = ledger();
        assert_eq!(soil.spend(Decimal::new(8, 0)), Decimal::new(8, 0));
        assert_eq!(soil.spend(Decimal::new(5, 0)), Decimal::new(2, 0));
        assert_eq!(soil.balance().available, Decimal::ZERO);
    }

    #[test]
    fn recover_caps_at_capacity() {
        let mut soil = ledger();
        soil.spend(Decimal::new(1, 1));
        assert_eq!(soil.recover(Decimal::new(35, 2)), Decimal::new(1, 1));
        assert_eq!(soil.balance().available, Decimal::new(10, 0));
    }

    #[test]
    fn grow_raises_capacity_and_availability() {
        let mut soil = ledger();
        soil.spend(Decimal::new(2, 0));
        soil.grow(Decimal::ONE);
        assert_eq!(soil.balance().capacity, Decimal::new(11, 0));
        assert_eq!(soil.balance().available, Decimal::new(9, 0));
    }

    #[test]
    fn grow_stops_at_max_capacity() {
        let mut soil = ledger();
        soil.grow(Decimal::new(500, 0));
        assert_eq!(soil.balance().capacity, Decimal::new(120, 0));
        assert_eq!(soil.balance().available, Decimal::new(120, 0));
    }

    #[test]
    fn negative_amounts_change_nothing() {
        let mut soil = ledger();
        soil.spend(Decimal::new(3, 0));
        let before = soil.balance();
        soil.recover(Decimal::new(-5, 0));
        soil.grow(Decimal::new(-5, 0));
        soil.spend(Decimal::new(-5, 0));
        assert_eq!(soil.balance(), before);
    }
}
