//! Shared derivation fixtures.
//!
//! Every file under `fixtures/derivation/v1` is a literal event sequence and
//! the state it must derive to. The browser client runs the same files; a
//! failure here means the two clients would disagree.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use grove_core::{ReplayRules, derive};
use grove_events::replay_order;
use grove_types::{AnomalyKind, Event, SoilBalance, SproutId, SproutState};

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    events: Vec<Event>,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Expected {
    soil: SoilBalance,
    events_applied: u64,
    sprouts: BTreeMap<SproutId, ExpectedSprout>,
    anomalies: Vec<AnomalyKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedSprout {
    state: SproutState,
    #[serde(default)]
    result: Option<u8>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    water_entries: usize,
    #[serde(default)]
    credited_entries: Option<usize>,
}

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/derivation/v1")
}

fn load_fixtures() -> Vec<Fixture> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(fixture_dir())
        .expect("fixture directory")
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    paths
        .iter()
        .map(|path| {
            let raw = std::fs::read_to_string(path).unwrap();
            serde_json::from_str(&raw)
                .unwrap_or_else(|err| panic!("{}: {err}", path.display()))
        })
        .collect()
}

#[test]
fn fixture_suite_is_present() {
    assert!(load_fixtures().len() >= 4);
}

#[test]
fn every_fixture_derives_to_its_expected_state() {
    let rules = ReplayRules::default();
    for fixture in load_fixtures() {
        let state = derive(&fixture.events, &rules);
        let name = &fixture.name;
        let expected = &fixture.expected;

        assert_eq!(state.soil.capacity, expected.soil.capacity, "{name}: capacity");
        assert_eq!(state.soil.available, expected.soil.available, "{name}: available");
        assert_eq!(state.events_applied, expected.events_applied, "{name}: applied");
        assert_eq!(
            state.anomalies.iter().map(|a| a.kind).collect::<Vec<_>>(),
            expected.anomalies,
            "{name}: anomalies"
        );
        assert_eq!(state.sprouts.len(), expected.sprouts.len(), "{name}: sprout count");

        for (id, want) in &expected.sprouts {
            let sprout = state
                .sprouts
                .get(id)
                .unwrap_or_else(|| panic!("{name}: missing sprout {id}"));
            assert_eq!(sprout.state, want.state, "{name}: state of {id}");
            assert_eq!(sprout.result, want.result, "{name}: result of {id}");
            assert_eq!(sprout.water_entries.len(), want.water_entries, "{name}: entries of {id}");
            if let Some(end) = want.end_date {
                assert_eq!(sprout.end_date, end, "{name}: end date of {id}");
            }
            if let Some(credited) = want.credited_entries {
                let actual = sprout.water_entries.iter().filter(|e| e.soil_credited).count();
                assert_eq!(actual, credited, "{name}: credited entries of {id}");
            }
        }
    }
}

#[test]
fn replay_is_independent_of_log_order() {
    let rules = ReplayRules::default();
    for fixture in load_fixtures() {
        let sorted: Vec<Event> = replay_order(&fixture.events).into_iter().cloned().collect();
        assert_eq!(
            derive(&fixture.events, &rules),
            derive(&sorted, &rules),
            "{}",
            fixture.name
        );
    }
}

#[test]
fn duplicate_merges_do_not_change_derivation() {
    let rules = ReplayRules::default();
    for fixture in load_fixtures() {
        let mut log = grove_events::EventLog::new();
        log.merge_all(fixture.events.iter().cloned());
        log.merge_all(fixture.events.iter().cloned());
        assert_eq!(
            derive(log.as_slice(), &rules),
            derive(&fixture.events, &rules),
            "{}",
            fixture.name
        );
    }
}

#[test]
fn soil_stays_in_bounds_after_every_prefix() {
    let rules = ReplayRules::default();
    for fixture in load_fixtures() {
        let ordered: Vec<Event> = replay_order(&fixture.events).into_iter().cloned().collect();
        let mut capacity = rules.table.starting_capacity;
        for end in 0..=ordered.len() {
            let soil = derive(&ordered[..end], &rules).soil;
            assert!(soil.available >= rust_decimal::Decimal::ZERO, "{}", fixture.name);
            assert!(soil.available <= soil.capacity, "{}", fixture.name);
            assert!(soil.capacity >= capacity, "{}", fixture.name);
            capacity = soil.capacity;
        }
    }
}
