//! Replay order.
//!
//! Events are replayed in ascending timestamp order. Ties keep the order in
//! which the events sit in the log, so a fixed log always replays the same
//! way even when two devices stamped the same instant. Timestamps that do
//! not parse as RFC 3339 sort after every valid one.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use grove_types::Event;

/// The events of `events` in replay order.
///
/// Stable: equal timestamps, and unparseable timestamps among themselves,
/// keep their relative position.
pub fn replay_order(events: &[Event]) -> Vec<&Event> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &Event)> = events
        .iter()
        .map(|event| (event.parsed_timestamp(), event))
        .collect();
    keyed.sort_by(|a, b| compare_timestamps(a.0, b.0));
    keyed.into_iter().map(|(_, event)| event).collect()
}

/// Total order over optional timestamps with `None` last.
pub fn compare_timestamps(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use grove_types::{EventId, EventPayload, SproutId, SproutWatered};

    use super::*;

    fn at(timestamp: &str) -> Event {
        Event::new(
            EventId::new(),
            timestamp.to_owned(),
            EventPayload::SproutWatered(SproutWatered {
                sprout_id: SproutId::new(),
                content: timestamp.to_owned(),
                prompt: None,
            }),
        )
    }

    fn ids(order: &[&Event]) -> Vec<EventId> {
        order.iter().map(|event| event.client_id).collect()
    }

    #[test]
    fn sorts_ascending_by_instant() {
        let late = at("2026-03-02T09:00:00.000Z");
        let early = at("2026-03-01T09:00:00.000Z");
        // Same instant as 08:00Z written with an offset.
        let offset = at("2026-03-01T10:00:00.000+02:00");
        let events = vec![late.clone(), early.clone(), offset.clone()];
        assert_eq!(
            ids(&replay_order(&events)),
            vec![offset.client_id, early.client_id, late.client_id]
        );
    }

    #[test]
    fn ties_keep_log_order() {
        let first = at("2026-03-01T09:00:00.000Z");
        let second = at("2026-03-01T09:00:00.000Z");
        let events = vec![first.clone(), second.clone()];
        assert_eq!(
            ids(&replay_order(&events)),
            vec![first.client_id, second.client_id]
        );
    }

    #[test]
    fn unparseable_timestamps_sort_last() {
        let garbage = at("yesterday-ish");
        let empty = at("");
        let valid = at("2030-01-01T00:00:00.000Z");
        let events = vec![garbage.clone(), valid.clone(), empty.clone()];
        assert_eq!(
            ids(&replay_order(&events)),
            vec![valid.client_id, garbage.client_id, empty.client_id]
        );
    }
}
