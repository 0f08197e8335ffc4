//! Water and sun availability, computed on demand.
//!
//! Availability is never stored. At any instant it is the period capacity
//! minus the number of applied waterings (or reflections) stamped inside
//! the current period, floored at zero.

use chrono::{DateTime, Utc};

use grove_types::{DerivedState, ResourceState};

use crate::clock::{ClockError, within_period};
use crate::derive::ReplayRules;

/// Instants at which the current water and sun periods end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextResets {
    /// Next daily water reset.
    pub water: DateTime<Utc>,
    /// Next weekly sun reset.
    pub sun: DateTime<Utc>,
}

/// Every resource as seen at `now`.
///
/// # Errors
///
/// Returns [`ClockError::OutOfRange`] if `now` is too close to the edge of
/// the representable date range to compute a period start.
pub fn resources_at(
    state: &DerivedState,
    rules: &ReplayRules,
    now: DateTime<Utc>,
) -> Result<ResourceState, ClockError> {
    Ok(ResourceState {
        soil_capacity: state.soil.capacity,
        soil_available: state.soil.available,
        water_available: water_available(state, rules, now)?,
        sun_available: sun_available(state, rules, now)?,
    })
}

/// Waterings left in the daily period containing `now`.
pub fn water_available(
    state: &DerivedState,
    rules: &ReplayRules,
    now: DateTime<Utc>,
) -> Result<u32, ClockError> {
    let start = rules.schedule.water_period_start(now)?;
    Ok(remaining(rules.table.water_capacity, &state.watered_at, start, now))
}

/// Sun reflections left in the weekly period containing `now`.
pub fn sun_available(
    state: &DerivedState,
    rules: &ReplayRules,
    now: DateTime<Utc>,
) -> Result<u32, ClockError> {
    let start = rules.schedule.sun_period_start(now)?;
    Ok(remaining(rules.table.sun_capacity, &state.shone_at, start, now))
}

/// When the current periods end.
pub fn next_resets(rules: &ReplayRules, now: DateTime<Utc>) -> Result<NextResets, ClockError> {
    Ok(NextResets {
        water: rules.schedule.next_water_reset(now)?,
        sun: rules.schedule.next_sun_reset(now)?,
    })
}

fn remaining(
    capacity: u32,
    history: &[DateTime<Utc>],
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> u32 {
    let used = history
        .iter()
        .filter(|ts| within_period(**ts, start, now))
        .count();
    let used = u32::try_from(used).unwrap_or(u32::MAX);
    capacity.saturating_sub(used)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use grove_types::SoilBalance;

    use super::*;

    fn utc(d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, mi, s).unwrap()
    }

    fn state_with(watered: Vec<DateTime<Utc>>, shone: Vec<DateTime<Utc>>) -> DerivedState {
        let mut state = DerivedState::empty(SoilBalance {
            capacity: Decimal::new(10, 0),
            available: Decimal::new(7, 0),
        });
        state.watered_at = watered;
        state.shone_at = shone;
        state
    }

    #[test]
    fn water_at_the_reset_instant_counts_toward_the_new_day() {
        let rules = ReplayRules::default();
        let state = state_with(vec![utc(4, 6, 0, 0)], Vec::new());
        assert_eq!(water_available(&state, &rules, utc(4, 12, 0, 0)).unwrap(), 2);
        // Seen from before the reset, the event lies in the future.
        assert_eq!(water_available(&state, &rules, utc(4, 5, 59, 59)).unwrap(), 3);
    }

    #[test]
    fn water_one_second_early_counts_toward_the_previous_day() {
        let rules = ReplayRules::default();
        let state = state_with(vec![utc(4, 5, 59, 59)], Vec::new());
        assert_eq!(water_available(&state, &rules, utc(4, 5, 59, 59)).unwrap(), 2);
        assert_eq!(water_available(&state, &rules, utc(4, 6, 0, 0)).unwrap(), 3);
    }

    #[test]
    fn availability_floors_at_zero() {
        let rules = ReplayRules::default();
        let state = state_with(
            vec![utc(4, 7, 0, 0); 5],
            vec![utc(3, 7, 0, 0), utc(4, 7, 0, 0)],
        );
        let resources = resources_at(&state, &rules, utc(4, 9, 0, 0)).unwrap();
        assert_eq!(resources.water_available, 0);
        assert_eq!(resources.sun_available, 0);
        assert_eq!(resources.soil_available, Decimal::new(7, 0));
    }

    #[test]
    fn sun_resets_weekly() {
        let rules = ReplayRules::default();
        // Wednesday reflection, seen the following Monday after 06:00.
        let state = state_with(Vec::new(), vec![utc(4, 7, 0, 0)]);
        assert_eq!(sun_available(&state, &rules, utc(8, 23, 0, 0)).unwrap(), 0);
        assert_eq!(sun_available(&state, &rules, utc(9, 6, 0, 0)).unwrap(), 1);
    }

    #[test]
    fn next_resets_for_countdowns() {
        let rules = ReplayRules::default();
        let next = next_resets(&rules, utc(4, 9, 0, 0)).unwrap();
        assert_eq!(next.water, utc(5, 6, 0, 0));
        assert_eq!(next.sun, utc(9, 6, 0, 0));
    }
}
