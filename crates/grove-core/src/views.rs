//! Read-only projections of a [`DerivedState`] for presentation clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use grove_types::{DerivedState, Leaf, LeafId, Sprout, SproutId, SproutState, SunEntry, TwigId};

use crate::clock::ResetSchedule;

/// Sprouts still growing.
pub fn active_sprouts(state: &DerivedState) -> Vec<&Sprout> {
    state
        .sprouts
        .values()
        .filter(|sprout| sprout.state == SproutState::Active)
        .collect()
}

/// Harvested sprouts, oldest harvest first. Uprooted sprouts never appear.
pub fn cultivated(state: &DerivedState) -> Vec<&Sprout> {
    let mut done: Vec<&Sprout> = state
        .sprouts
        .values()
        .filter(|sprout| sprout.state == SproutState::Completed)
        .collect();
    done.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
    done
}

/// Active sprouts whose season has ended at `now`.
pub fn ready_to_harvest(state: &DerivedState, now: DateTime<Utc>) -> Vec<&Sprout> {
    state
        .sprouts
        .values()
        .filter(|sprout| sprout.is_ready(now))
        .collect()
}

/// Every sprout on `twig`, in any state.
pub fn sprouts_on_twig<'s>(state: &'s DerivedState, twig: &TwigId) -> Vec<&'s Sprout> {
    state
        .sprouts
        .values()
        .filter(|sprout| sprout.twig_id == *twig)
        .collect()
}

/// Every leaf on `twig`.
pub fn leaves_on_twig<'s>(state: &'s DerivedState, twig: &TwigId) -> Vec<&'s Leaf> {
    state
        .leaves
        .values()
        .filter(|leaf| leaf.twig_id == *twig)
        .collect()
}

/// Every sprout in the saga `leaf`.
pub fn sprouts_in_leaf(state: &DerivedState, leaf: LeafId) -> Vec<&Sprout> {
    state
        .sprouts
        .values()
        .filter(|sprout| sprout.leaf_id == Some(leaf))
        .collect()
}

/// Sun reflections written for `twig`, in replay order.
pub fn sun_entries_for_twig<'s>(state: &'s DerivedState, twig: &TwigId) -> Vec<&'s SunEntry> {
    state
        .sun_entries
        .iter()
        .filter(|entry| entry.twig_id == *twig)
        .collect()
}

/// Whether `sprout` has a journal entry on the local day of `now`.
pub fn watered_today(
    state: &DerivedState,
    sprout: SproutId,
    schedule: &ResetSchedule,
    now: DateTime<Utc>,
) -> bool {
    let today = schedule.local_day(now);
    state.sprouts.get(&sprout).is_some_and(|sprout| {
        sprout.water_entries.iter().any(|entry| {
            DateTime::parse_from_rfc3339(&entry.timestamp)
                .is_ok_and(|ts| schedule.local_day(ts.with_timezone(&Utc)) == today)
        })
    })
}

/// Whether `cost` can be paid from available soil.
pub fn can_afford(state: &DerivedState, cost: Decimal) -> bool {
    cost <= state.soil.available
}
