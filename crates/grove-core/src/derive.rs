//! The derivation engine: event log in, render snapshot out.
//!
//! [`derive`] replays a log from scratch into a [`DerivedState`]. It is
//! pure (no I/O, no clock, no globals), deterministic, and total: it never
//! fails and never panics. Anything it cannot interpret is skipped, logged
//! at `warn`, and recorded in [`DerivedState::anomalies`].
//!
//! # Replay rules
//!
//! | Event | Effect |
//! |-------|--------|
//! | `leaf_created` | insert leaf; a repeated id changes nothing |
//! | `sprout_planted` | insert active sprout, fix `endDate`, spend `soilCost` |
//! | `sprout_watered` | append journal entry; first watering of the sprout per local day recovers water soil |
//! | `sprout_harvested` | `active → completed`; grow capacity and availability by `capacityGained` |
//! | `sprout_uprooted` | `active → uprooted`; recover `soilReturned` |
//! | `sun_shone` | append reflection; recover sun soil |
//!
//! Two independently written clients must produce identical output for the
//! same log. The shared fixture suite under `fixtures/derivation` holds them
//! to that.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use grove_events::replay_order;
use grove_ledger::{BoundsCheck, EconomyTable, SoilLedger, verify_bounds};
use grove_types::{
    AnomalyKind, DerivedState, Event, EventId, EventPayload, Leaf, LeafCreated, ReplayAnomaly,
    Sprout, SproutHarvested, SproutId, SproutPlanted, SproutState, SproutUprooted, SproutWatered,
    SunEntry, SunShone, WaterEntry,
};

use crate::clock::ResetSchedule;
use crate::lifecycle::{Transition, next_state};

/// Everything derivation depends on besides the events themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayRules {
    /// Soil, water, and sun constants.
    pub table: EconomyTable,
    /// Local day and reset boundaries.
    pub schedule: ResetSchedule,
}

/// Replay `events` into a fresh [`DerivedState`].
///
/// `events` may be in any order; replay sorts them by timestamp first (see
/// [`grove_events::ordering`]).
pub fn derive(events: &[Event], rules: &ReplayRules) -> DerivedState {
    let mut replay = Replay::new(rules);
    for event in replay_order(events) {
        replay.apply(event);
    }
    replay.finish()
}

/// Why an event was not applied.
struct Skip {
    kind: AnomalyKind,
    detail: String,
}

impl Skip {
    fn new(kind: AnomalyKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Whether an event changed state.
#[derive(PartialEq, Eq)]
enum Applied {
    Yes,
    Unchanged,
}

/// In-progress replay.
struct Replay<'r> {
    rules: &'r ReplayRules,
    state: DerivedState,
    soil: SoilLedger,
    /// `(sprout, local day)` pairs that already earned water soil.
    credited: HashSet<(SproutId, NaiveDate)>,
}

impl<'r> Replay<'r> {
    fn new(rules: &'r ReplayRules) -> Self {
        let soil = SoilLedger::new(&rules.table);
        Self {
            rules,
            state: DerivedState::empty(soil.balance()),
            soil,
            credited: HashSet::new(),
        }
    }

    fn apply(&mut self, event: &Event) {
        let Some(payload) = event.payload() else {
            self.skip(
                event,
                Skip::new(AnomalyKind::Unrecognized, "unknown type or unexpected fields"),
            );
            return;
        };
        let timestamp = event.parsed_timestamp();
        let outcome = match payload {
            EventPayload::LeafCreated(p) => Ok(self.leaf_created(event, p)),
            EventPayload::SproutPlanted(p) => self.sprout_planted(event, timestamp, p),
            EventPayload::SproutWatered(p) => self.sprout_watered(event, timestamp, p),
            EventPayload::SproutHarvested(p) => self.sprout_harvested(event, p),
            EventPayload::SproutUprooted(p) => self.sprout_uprooted(event, p),
            EventPayload::SunShone(p) => Ok(self.sun_shone(event, timestamp, p)),
        };
        match outcome {
            Ok(Applied::Yes) => {
                self.state.events_applied = self.state.events_applied.saturating_add(1);
                if let BoundsCheck::Violation(anomaly) = verify_bounds(self.soil.balance()) {
                    tracing::error!(event_id = %event.client_id, %anomaly, "soil out of bounds after replay step");
                }
            }
            Ok(Applied::Unchanged) => {}
            Err(skip) => self.skip(event, skip),
        }
    }

    fn leaf_created(&mut self, event: &Event, p: &LeafCreated) -> Applied {
        if self.state.leaves.contains_key(&p.leaf_id) {
            return Applied::Unchanged;
        }
        self.state.leaves.insert(
            p.leaf_id,
            Leaf {
                id: p.leaf_id,
                twig_id: p.twig_id.clone(),
                name: p.name.clone(),
                created_at: event.timestamp.clone(),
            },
        );
        Applied::Yes
    }

    fn sprout_planted(
        &mut self,
        event: &Event,
        timestamp: Option<DateTime<Utc>>,
        p: &SproutPlanted,
    ) -> Result<Applied, Skip> {
        if self.state.sprouts.contains_key(&p.sprout_id) {
            return Err(Skip::new(
                AnomalyKind::DuplicateId,
                format!("sprout {} already planted", p.sprout_id),
            ));
        }
        ensure_non_negative("soilCost", p.soil_cost)?;
        let planted_at = timestamp.ok_or_else(|| {
            Skip::new(AnomalyKind::Malformed, "unparseable timestamp, no end date")
        })?;
        let days = u64::try_from(p.season.duration_days())
            .map_err(|_err| Skip::new(AnomalyKind::Malformed, "negative season length"))?;
        let end_date = planted_at
            .checked_add_days(Days::new(days))
            .ok_or_else(|| Skip::new(AnomalyKind::Malformed, "end date out of range"))?;

        self.soil.spend(p.soil_cost);
        self.state.sprouts.insert(
            p.sprout_id,
            Sprout {
                id: p.sprout_id,
                twig_id: p.twig_id.clone(),
                leaf_id: p.leaf_id,
                title: p.title.clone(),
                season: p.season,
                environment: p.environment,
                state: SproutState::Active,
                soil_cost: p.soil_cost,
                result: None,
                reflection: None,
                bloom_wither: p.bloom_wither.clone(),
                bloom_budding: p.bloom_budding.clone(),
                bloom_flourish: p.bloom_flourish.clone(),
                water_entries: Vec::new(),
                created_at: event.timestamp.clone(),
                end_date,
                completed_at: None,
                uprooted_at: None,
            },
        );
        Ok(Applied::Yes)
    }

    fn sprout_watered(
        &mut self,
        event: &Event,
        timestamp: Option<DateTime<Utc>>,
        p: &SproutWatered,
    ) -> Result<Applied, Skip> {
        if !self.state.sprouts.contains_key(&p.sprout_id) {
            return Err(unknown_sprout(p.sprout_id));
        }
        // Unparseable timestamps fall outside every day.
        let soil_credited = timestamp.is_some_and(|ts| {
            let day = self.rules.schedule.local_day(ts);
            self.credited.insert((p.sprout_id, day))
        });
        if soil_credited {
            self.soil.recover(self.rules.table.water_recovery);
        }
        if let Some(ts) = timestamp {
            self.state.watered_at.push(ts);
        }
        if let Some(sprout) = self.state.sprouts.get_mut(&p.sprout_id) {
            sprout.water_entries.push(WaterEntry {
                event_id: event.client_id,
                timestamp: event.timestamp.clone(),
                content: p.content.clone(),
                prompt: p.prompt.clone(),
                soil_credited,
            });
        }
        Ok(Applied::Yes)
    }

    fn sprout_harvested(&mut self, event: &Event, p: &SproutHarvested) -> Result<Applied, Skip> {
        if self.rules.table.result_multiplier(p.result).is_none() {
            return Err(Skip::new(
                AnomalyKind::Malformed,
                format!("harvest result {} outside 1..=5", p.result),
            ));
        }
        ensure_non_negative("capacityGained", p.capacity_gained)?;
        let sprout = self.terminate(p.sprout_id, Transition::Harvest)?;
        sprout.result = Some(p.result);
        sprout.reflection.clone_from(&p.reflection);
        sprout.completed_at = Some(event.timestamp.clone());
        self.soil.grow(p.capacity_gained);
        Ok(Applied::Yes)
    }

    fn sprout_uprooted(&mut self, event: &Event, p: &SproutUprooted) -> Result<Applied, Skip> {
        ensure_non_negative("soilReturned", p.soil_returned)?;
        let sprout = self.terminate(p.sprout_id, Transition::Uproot)?;
        sprout.uprooted_at = Some(event.timestamp.clone());
        self.soil.recover(p.soil_returned);
        Ok(Applied::Yes)
    }

    fn sun_shone(
        &mut self,
        event: &Event,
        timestamp: Option<DateTime<Utc>>,
        p: &SunShone,
    ) -> Applied {
        self.state.sun_entries.push(SunEntry {
            event_id: event.client_id,
            twig_id: p.twig_id.clone(),
            twig_label: p.twig_label.clone(),
            content: p.content.clone(),
            timestamp: event.timestamp.clone(),
        });
        if let Some(ts) = timestamp {
            self.state.shone_at.push(ts);
        }
        self.soil.recover(self.rules.table.sun_recovery);
        Applied::Yes
    }

    /// Move a sprout into a terminal state, or explain why not.
    fn terminate(&mut self, id: SproutId, transition: Transition) -> Result<&mut Sprout, Skip> {
        let sprout = self
            .state
            .sprouts
            .get_mut(&id)
            .ok_or_else(|| unknown_sprout(id))?;
        let next = next_state(sprout.state, transition).ok_or_else(|| {
            Skip::new(
                AnomalyKind::TerminalConflict,
                format!("sprout {id} already {:?}", sprout.state),
            )
        })?;
        sprout.state = next;
        Ok(sprout)
    }

    fn skip(&mut self, event: &Event, skip: Skip) {
        tracing::warn!(
            event_id = %event.client_id,
            event_type = event.type_name(),
            kind = ?skip.kind,
            detail = %skip.detail,
            "skipping event during derivation"
        );
        self.state.anomalies.push(anomaly(event.client_id, event.type_name(), skip));
    }

    fn finish(mut self) -> DerivedState {
        self.state.soil = self.soil.balance();
        self.state
    }
}

fn anomaly(event_id: EventId, event_type: &str, skip: Skip) -> ReplayAnomaly {
    ReplayAnomaly {
        event_id,
        event_type: event_type.to_owned(),
        kind: skip.kind,
        detail: skip.detail,
    }
}

fn unknown_sprout(id: SproutId) -> Skip {
    Skip::new(AnomalyKind::UnknownSprout, format!("sprout {id} not planted"))
}

fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), Skip> {
    if value < Decimal::ZERO {
        return Err(Skip::new(
            AnomalyKind::Malformed,
            format!("{field} is negative: {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use grove_types::{Environment, EventBody, Season, TwigId};

    use super::*;

    fn rules() -> ReplayRules {
        ReplayRules::default()
    }

    fn ts(day: u32, hour: u32, minute: u32) -> String {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0)
            .unwrap()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    fn event(timestamp: String, payload: EventPayload) -> Event {
        Event::new(EventId::new(), timestamp, payload)
    }

    fn planted(sprout_id: SproutId, cost: i64, timestamp: String) -> Event {
        event(
            timestamp,
            EventPayload::SproutPlanted(SproutPlanted {
                sprout_id,
                twig_id: TwigId::new(0, 0).unwrap(),
                leaf_id: None,
                title: "Read twelve books".to_owned(),
                season: Season::TwoWeeks,
                environment: Environment::Fertile,
                soil_cost: Decimal::new(cost, 0),
                bloom_wither: None,
                bloom_budding: None,
                bloom_flourish: None,
            }),
        )
    }

    fn watered(sprout_id: SproutId, timestamp: String) -> Event {
        event(
            timestamp,
            EventPayload::SproutWatered(SproutWatered {
                sprout_id,
                content: "pages 1-30".to_owned(),
                prompt: None,
            }),
        )
    }

    fn harvested(sprout_id: SproutId, result: u8, gained: Decimal, timestamp: String) -> Event {
        event(
            timestamp,
            EventPayload::SproutHarvested(SproutHarvested {
                sprout_id,
                result,
                reflection: None,
                capacity_gained: gained,
            }),
        )
    }

    fn uprooted(sprout_id: SproutId, returned: Decimal, timestamp: String) -> Event {
        event(
            timestamp,
            EventPayload::SproutUprooted(SproutUprooted {
                sprout_id,
                soil_returned: returned,
            }),
        )
    }

    #[test]
    fn empty_log_is_the_starting_state() {
        let state = derive(&[], &rules());
        assert_eq!(state.soil.capacity, Decimal::new(10, 0));
        assert_eq!(state.soil.available, Decimal::new(10, 0));
        assert!(state.sprouts.is_empty());
    }

    #[test]
    fn planting_spends_soil_and_fixes_end_date() {
        let id = SproutId::new();
        let state = derive(&[planted(id, 2, ts(1, 9, 0))], &rules());
        assert_eq!(state.soil.available, Decimal::new(8, 0));
        let sprout = &state.sprouts[&id];
        assert_eq!(sprout.state, SproutState::Active);
        assert_eq!(
            sprout.end_date,
            Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn harvest_with_result_one_still_completes() {
        let id = SproutId::new();
        let state = derive(
            &[
                planted(id, 2, ts(1, 9, 0)),
                harvested(id, 1, Decimal::new(88, 2), ts(15, 9, 0)),
            ],
            &rules(),
        );
        let sprout = &state.sprouts[&id];
        assert_eq!(sprout.state, SproutState::Completed);
        assert_eq!(sprout.result, Some(1));
        assert_eq!(state.soil.capacity, Decimal::new(1088, 2));
        assert_eq!(state.soil.available, Decimal::new(888, 2));
    }

    #[test]
    fn first_terminal_event_wins() {
        let id = SproutId::new();
        let state = derive(
            &[
                planted(id, 2, ts(1, 9, 0)),
                uprooted(id, Decimal::new(5, 1), ts(2, 9, 0)),
                harvested(id, 5, Decimal::ONE, ts(3, 9, 0)),
            ],
            &rules(),
        );
        assert_eq!(state.sprouts[&id].state, SproutState::Uprooted);
        assert_eq!(state.soil.capacity, Decimal::new(10, 0));
        assert_eq!(state.anomalies.len(), 1);
        assert_eq!(state.anomalies[0].kind, AnomalyKind::TerminalConflict);
    }

    #[test]
    fn one_water_credit_per_sprout_per_day() {
        let id = SproutId::new();
        let state = derive(
            &[
                planted(id, 2, ts(1, 9, 0)),
                watered(id, ts(2, 8, 0)),
                watered(id, ts(2, 20, 0)),
                watered(id, ts(3, 8, 0)),
            ],
            &rules(),
        );
        let entries = &state.sprouts[&id].water_entries;
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| e.soil_credited).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        // 8 + 0.05 + 0.05
        assert_eq!(state.soil.available, Decimal::new(810, 2));
        assert_eq!(state.watered_at.len(), 3);
    }

    #[test]
    fn events_for_unknown_sprouts_are_dropped() {
        let state = derive(&[watered(SproutId::new(), ts(2, 8, 0))], &rules());
        assert_eq!(state.events_applied, 0);
        assert!(state.watered_at.is_empty());
        assert_eq!(state.anomalies[0].kind, AnomalyKind::UnknownSprout);
    }

    #[test]
    fn out_of_order_log_replays_by_timestamp() {
        let id = SproutId::new();
        let state = derive(
            &[watered(id, ts(2, 8, 0)), planted(id, 2, ts(1, 9, 0))],
            &rules(),
        );
        assert_eq!(state.sprouts[&id].water_entries.len(), 1);
        assert!(state.anomalies.is_empty());
    }

    #[test]
    fn unrecognized_events_are_ignored() {
        let mut fields = serde_json::Map::new();
        fields.insert("type".to_owned(), "sprout_grafted".into());
        let unknown = Event {
            client_id: EventId::new(),
            timestamp: ts(1, 9, 0),
            body: EventBody::Unrecognized(fields),
        };
        let state = derive(&[unknown], &rules());
        assert_eq!(state.soil.available, Decimal::new(10, 0));
        assert_eq!(state.anomalies[0].kind, AnomalyKind::Unrecognized);
        assert_eq!(state.anomalies[0].event_type, "sprout_grafted");
    }

    #[test]
    fn planting_with_unparseable_timestamp_is_skipped() {
        let id = SproutId::new();
        let state = derive(&[planted(id, 2, "not a time".to_owned())], &rules());
        assert!(state.sprouts.is_empty());
        assert_eq!(state.soil.available, Decimal::new(10, 0));
        assert_eq!(state.anomalies[0].kind, AnomalyKind::Malformed);
    }

    #[test]
    fn watering_with_unparseable_timestamp_records_without_credit() {
        let id = SproutId::new();
        let state = derive(
            &[planted(id, 2, ts(1, 9, 0)), watered(id, "??".to_owned())],
            &rules(),
        );
        let entries = &state.sprouts[&id].water_entries;
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].soil_credited);
        assert!(state.watered_at.is_empty());
        assert_eq!(state.soil.available, Decimal::new(8, 0));
    }

    #[test]
    fn duplicate_planting_keeps_the_first() {
        let id = SproutId::new();
        let state = derive(
            &[planted(id, 2, ts(1, 9, 0)), planted(id, 4, ts(1, 10, 0))],
            &rules(),
        );
        assert_eq!(state.sprouts[&id].soil_cost, Decimal::new(2, 0));
        assert_eq!(state.soil.available, Decimal::new(8, 0));
        assert_eq!(state.anomalies[0].kind, AnomalyKind::DuplicateId);
    }

    #[test]
    fn capacity_never_decreases_across_prefixes() {
        let a = SproutId::new();
        let b = SproutId::new();
        let events = vec![
            planted(a, 3, ts(1, 9, 0)),
            planted(b, 4, ts(1, 10, 0)),
            harvested(a, 4, Decimal::new(29, 1), ts(10, 9, 0)),
            uprooted(b, Decimal::ONE, ts(11, 9, 0)),
            harvested(b, 5, Decimal::new(44, 1), ts(12, 9, 0)),
        ];
        let mut last = Decimal::ZERO;
        for end in 0..=events.len() {
            let state = derive(&events[..end], &rules());
            assert!(state.soil.capacity >= last);
            assert!(state.soil.available >= Decimal::ZERO);
            assert!(state.soil.available <= state.soil.capacity);
            last = state.soil.capacity;
        }
    }
}
