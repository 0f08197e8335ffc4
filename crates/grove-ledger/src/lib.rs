//! Soil, water, and sun accounting for the Grove goal tracker.
//!
//! Every soil quantity in the system is computed here, from an explicit
//! [`EconomyTable`] passed in by the caller. Nothing reads global state, and
//! every result is rounded to the table's fixed decimal precision so that
//! independently implemented clients agree to the last digit.
//!
//! # Architecture
//!
//! - [`table`] -- The [`EconomyTable`] constants table.
//! - [`costs`] -- Planting cost, harvest capacity gain, uproot refund.
//! - [`soil`] -- The [`SoilLedger`]: a soil balance with clamp rules.
//! - [`conservation`] -- Bounds verification for a soil balance.
//!
//! # Soil Rules
//!
//! | Operation | Capacity | Available |
//! |-----------|----------|-----------|
//! | Plant | unchanged | `- cost`, floored at 0 |
//! | Water / sun | unchanged | `+ recovery`, capped at capacity |
//! | Harvest | `+ gain`, capped at max | `+ gain`, capped at new capacity |
//! | Uproot | unchanged | `+ refund`, capped at capacity |
//!
//! # Usage
//!
//! ```
//! use grove_ledger::{EconomyTable, SoilLedger, costs};
//! use grove_types::{Environment, Season};
//! use rust_decimal::Decimal;
//!
//! let table = EconomyTable::default();
//! let mut soil = SoilLedger::new(&table);
//!
//! let cost = costs::planting_cost(&table, Season::TwoWeeks, Environment::Fertile);
//! soil.spend(cost);
//! assert_eq!(soil.balance().available, Decimal::new(8, 0));
//! ```

pub mod conservation;
pub mod costs;
pub mod soil;
pub mod table;

// Re-export primary types at crate root.
pub use conservation::{BoundsCheck, verify_bounds};
pub use soil::SoilLedger;
pub use table::{EconomyTable, PerEnvironment, SeasonCosts};

use rust_decimal::Decimal;

use grove_types::SoilBalance;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when computing ledger quantities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A quantity that must be non-negative was negative.
    #[error("ledger quantity must not be negative, got {quantity}")]
    NegativeQuantity {
        /// The invalid quantity.
        quantity: Decimal,
    },

    /// A harvest result outside `1..=5`.
    #[error("harvest result must be between 1 and 5, got {0}")]
    ResultOutOfRange(u8),

    /// A computation overflowed the decimal range.
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A soil balance found outside `0 <= available <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The offending balance.
    pub balance: SoilBalance,
    /// Human-readable description of the violation.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
