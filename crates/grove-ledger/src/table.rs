//! The constants table every soil computation is parameterized by.
//!
//! Both clients ship the same table. It deserializes from the `economy`
//! section of the configuration file; any field left out keeps its
//! default.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use grove_types::{Environment, Season};

/// One value per [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PerEnvironment {
    /// Value for [`Environment::Fertile`].
    pub fertile: Decimal,
    /// Value for [`Environment::Firm`].
    pub firm: Decimal,
    /// Value for [`Environment::Barren`].
    pub barren: Decimal,
}

impl PerEnvironment {
    /// Build from three whole numbers.
    pub fn whole(fertile: i64, firm: i64, barren: i64) -> Self {
        Self {
            fertile: Decimal::new(fertile, 0),
            firm: Decimal::new(firm, 0),
            barren: Decimal::new(barren, 0),
        }
    }

    /// Select the value for `environment`.
    pub const fn get(&self, environment: Environment) -> Decimal {
        match environment {
            Environment::Fertile => self.fertile,
            Environment::Firm => self.firm,
            Environment::Barren => self.barren,
        }
    }
}

/// Planting cost rows, one per [`Season`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeasonCosts {
    /// Costs for a two-week sprout.
    #[serde(rename = "2w")]
    pub two_weeks: PerEnvironment,
    /// Costs for a one-month sprout.
    #[serde(rename = "1m")]
    pub one_month: PerEnvironment,
    /// Costs for a three-month sprout.
    #[serde(rename = "3m")]
    pub three_months: PerEnvironment,
    /// Costs for a six-month sprout.
    #[serde(rename = "6m")]
    pub six_months: PerEnvironment,
    /// Costs for a one-year sprout.
    #[serde(rename = "1y")]
    pub one_year: PerEnvironment,
}

impl SeasonCosts {
    /// Select the row for `season`.
    pub const fn get(&self, season: Season) -> &PerEnvironment {
        match season {
            Season::TwoWeeks => &self.two_weeks,
            Season::OneMonth => &self.one_month,
            Season::ThreeMonths => &self.three_months,
            Season::SixMonths => &self.six_months,
            Season::OneYear => &self.one_year,
        }
    }
}

impl Default for SeasonCosts {
    fn default() -> Self {
        Self {
            two_weeks: PerEnvironment::whole(2, 3, 4),
            one_month: PerEnvironment::whole(3, 5, 6),
            three_months: PerEnvironment::whole(5, 8, 10),
            six_months: PerEnvironment::whole(8, 12, 16),
            one_year: PerEnvironment::whole(12, 18, 24),
        }
    }
}

/// The full economy constants table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EconomyTable {
    /// Soil capacity (and availability) of a fresh log.
    pub starting_capacity: Decimal,
    /// Hard ceiling on soil capacity.
    pub max_capacity: Decimal,
    /// Decimal places every soil quantity is rounded to.
    pub precision: u32,
    /// Soil cost of planting, by season and environment.
    pub planting_costs: SeasonCosts,
    /// Harvest multiplier by environment.
    pub environment_multipliers: PerEnvironment,
    /// Harvest multiplier by result, index 0 holding result 1.
    pub result_multipliers: [Decimal; 5],
    /// Soil credited by the first watering of a sprout each day.
    pub water_recovery: Decimal,
    /// Soil credited by each sun reflection.
    pub sun_recovery: Decimal,
    /// Fraction of the planting cost refunded on uproot.
    pub uproot_refund_rate: Decimal,
    /// Waterings allowed per daily period.
    pub water_capacity: u32,
    /// Sun reflections allowed per weekly period.
    pub sun_capacity: u32,
}

impl Default for EconomyTable {
    fn default() -> Self {
        Self {
            starting_capacity: Decimal::new(10, 0),
            max_capacity: Decimal::new(120, 0),
            precision: 2,
            planting_costs: SeasonCosts::default(),
            environment_multipliers: PerEnvironment {
                fertile: Decimal::new(11, 1),
                firm: Decimal::new(175, 2),
                barren: Decimal::new(24, 1),
            },
            result_multipliers: [
                Decimal::new(4, 1),
                Decimal::new(55, 2),
                Decimal::new(7, 1),
                Decimal::new(85, 2),
                Decimal::ONE,
            ],
            water_recovery: Decimal::new(5, 2),
            sun_recovery: Decimal::new(35, 2),
            uproot_refund_rate: Decimal::new(25, 2),
            water_capacity: 3,
            sun_capacity: 1,
        }
    }
}

impl EconomyTable {
    /// Round `value` to the table's precision.
    ///
    /// Midpoints round away from zero, which is what `Math.round` does
    /// for the non-negative quantities the browser client handles.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Harvest multiplier for `result`, or `None` outside `1..=5`.
    pub fn result_multiplier(&self, result: u8) -> Option<Decimal> {
        let index = usize::from(result).checked_sub(1)?;
        self.result_multipliers.get(index).copied()
    }
}
