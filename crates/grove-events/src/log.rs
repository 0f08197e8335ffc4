//! The append-only event log.
//!
//! The log is a flat sequence in arrival order. Local appends and remote
//! merges both land at the end; replay applies its own ordering (see
//! [`crate::ordering`]). The client-generated event id is the only dedup
//! key. Two distinct events may share a timestamp, so timestamps are never
//! compared for identity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use grove_types::{Event, EventId};

use crate::LogError;

/// Result of merging one event into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The event was new and has been appended.
    Inserted,
    /// An event with the same id was already present; nothing changed.
    Duplicate,
}

/// Ordered, append-only collection of events with unique ids.
///
/// Serializes as a plain JSON array of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Event>", into = "Vec<Event>")]
pub struct EventLog {
    /// Events in arrival order.
    events: Vec<Event>,
    /// Ids of every event in `events`.
    ids: HashSet<EventId>,
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event authored on this device.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DuplicateId`] if the id is already present. A
    /// freshly generated id colliding means the caller reused an event.
    pub fn append_local(&mut self, event: Event) -> Result<(), LogError> {
        if self.ids.contains(&event.client_id) {
            return Err(LogError::DuplicateId(event.client_id));
        }
        self.push(event);
        Ok(())
    }

    /// Merge an event from another device, skipping it if already present.
    pub fn merge(&mut self, event: Event) -> MergeOutcome {
        if self.ids.contains(&event.client_id) {
            return MergeOutcome::Duplicate;
        }
        self.push(event);
        MergeOutcome::Inserted
    }

    /// Merge a batch of events. Returns how many were new.
    pub fn merge_all<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = Event>,
    {
        let mut inserted: usize = 0;
        for event in events {
            if self.merge(event) == MergeOutcome::Inserted {
                inserted = inserted.saturating_add(1);
            }
        }
        inserted
    }

    /// Whether an event with `id` is present.
    pub fn contains(&self, id: &EventId) -> bool {
        self.ids.contains(id)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Events in arrival order, as a slice.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Look up an event by id.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        if !self.contains(id) {
            return None;
        }
        self.events.iter().find(|event| event.client_id == *id)
    }

    /// Id of the most recently added event.
    pub fn last_id(&self) -> Option<EventId> {
        self.events.last().map(|event| event.client_id)
    }

    fn push(&mut self, event: Event) {
        self.ids.insert(event.client_id);
        self.events.push(event);
    }
}

impl From<Vec<Event>> for EventLog {
    /// Builds a log from stored events. Later copies of a repeated id are
    /// dropped.
    fn from(events: Vec<Event>) -> Self {
        let stored = events.len();
        let mut log = Self::new();
        let kept = log.merge_all(events);
        if kept < stored {
            tracing::warn!(
                stored,
                kept,
                "dropped duplicate event ids while loading log"
            );
        }
        log
    }
}

impl From<EventLog> for Vec<Event> {
    fn from(log: EventLog) -> Self {
        log.events
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use grove_types::{EventPayload, SproutId, SproutWatered};

    use super::*;

    fn watered(id: EventId, timestamp: &str) -> Event {
        Event::new(
            id,
            timestamp.to_owned(),
            EventPayload::SproutWatered(SproutWatered {
                sprout_id: SproutId::new(),
                content: "did the thing".to_owned(),
                prompt: None,
            }),
        )
    }

    #[test]
    fn append_local_rejects_reused_id() {
        let mut log = EventLog::new();
        let id = EventId::new();
        log.append_local(watered(id, "2026-03-01T09:00:00.000Z")).unwrap();
        assert_eq!(
            log.append_local(watered(id, "2026-03-01T09:00:00.000Z")),
            Err(LogError::DuplicateId(id))
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn merging_twice_changes_the_log_once() {
        let mut log = EventLog::new();
        let event = watered(EventId::new(), "2026-03-01T09:00:00.000Z");
        assert_eq!(log.merge(event.clone()), MergeOutcome::Inserted);
        assert_eq!(log.merge(event), MergeOutcome::Duplicate);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn same_timestamp_different_ids_are_both_kept() {
        let mut log = EventLog::new();
        let inserted = log.merge_all([
            watered(EventId::new(), "2026-03-01T09:00:00.000Z"),
            watered(EventId::new(), "2026-03-01T09:00:00.000Z"),
        ]);
        assert_eq!(inserted, 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn serializes_as_an_array_and_drops_repeats_on_load() {
        let event = watered(EventId::new(), "2026-03-01T09:00:00.000Z");
        let raw = serde_json::to_value(vec![event.clone(), event.clone()]).unwrap();
        let log: EventLog = serde_json::from_value(raw).unwrap();
        assert_eq!(log.len(), 1);
        assert!(log.contains(&event.client_id));
        assert_eq!(log.last_id(), Some(event.client_id));

        let round = serde_json::to_value(&log).unwrap();
        assert!(round.is_array());
    }
}
