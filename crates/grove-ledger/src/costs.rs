//! Soil quantities attached to events.
//!
//! The authoring client computes these once, when it builds the event, and
//! stamps the result into the payload. Replay then trusts the stamped value,
//! so a later change to the table never rewrites history.

use rust_decimal::Decimal;

use grove_types::{Environment, Season};

use crate::{EconomyTable, LedgerError};

/// Soil cost of planting a sprout for `season` in `environment`.
pub fn planting_cost(table: &EconomyTable, season: Season, environment: Environment) -> Decimal {
    table.round(table.planting_costs.get(season).get(environment))
}

/// Soil capacity earned by harvesting a sprout.
///
/// `base_cost × environment multiplier × result multiplier`, rounded.
/// The global capacity ceiling is applied when the gain is credited, not
/// here.
///
/// # Errors
///
/// Returns [`LedgerError::NegativeQuantity`] for a negative base cost,
/// [`LedgerError::ResultOutOfRange`] for a result outside `1..=5`, and
/// [`LedgerError::Overflow`] if the product leaves the decimal range.
pub fn capacity_gain(
    table: &EconomyTable,
    base_cost: Decimal,
    environment: Environment,
    result: u8,
) -> Result<Decimal, LedgerError> {
    ensure_non_negative(base_cost)?;
    let result_multiplier = table
        .result_multiplier(result)
        .ok_or(LedgerError::ResultOutOfRange(result))?;
    let gain = base_cost
        .checked_mul(table.environment_multipliers.get(environment))
        .and_then(|v| v.checked_mul(result_multiplier))
        .ok_or(LedgerError::Overflow("capacity gain"))?;
    Ok(table.round(gain))
}

/// Soil refunded when a sprout planted for `soil_cost` is uprooted.
///
/// # Errors
///
/// Returns [`LedgerError::NegativeQuantity`] for a negative cost and
/// [`LedgerError::Overflow`] if the product leaves the decimal range.
pub fn uproot_refund(table: &EconomyTable, soil_cost: Decimal) -> Result<Decimal, LedgerError> {
    ensure_non_negative(soil_cost)?;
    let refund = soil_cost
        .checked_mul(table.uproot_refund_rate)
        .ok_or(LedgerError::Overflow("uproot refund"))?;
    Ok(table.round(refund))
}

/// Reject negative quantities.
const fn ensure_non_negative(quantity: Decimal) -> Result<(), LedgerError> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(LedgerError::NegativeQuantity { quantity });
    }
    Ok(())
}
