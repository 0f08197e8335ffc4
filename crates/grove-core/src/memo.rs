//! Memoized derivation.
//!
//! Derivation is a full replay, O(n) in the log. Readers that ask for the
//! state far more often than the log changes can hold a [`DerivationMemo`],
//! which replays only when the log's length or last id has moved. Because
//! the log is append-only, those two together identify its contents.

use grove_events::EventLog;
use grove_types::{DerivedState, EventId};

use crate::derive::{ReplayRules, derive};

/// What a cached state was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemoKey {
    len: usize,
    last: Option<EventId>,
}

impl MemoKey {
    fn of(log: &EventLog) -> Self {
        Self {
            len: log.len(),
            last: log.last_id(),
        }
    }
}

/// The most recent derivation and the log it came from.
#[derive(Debug, Clone, Default)]
pub struct DerivationMemo {
    cached: Option<(MemoKey, DerivedState)>,
}

impl DerivationMemo {
    /// An empty memo.
    pub const fn new() -> Self {
        Self { cached: None }
    }

    /// The derived state of `log`, replaying only if it changed.
    pub fn get_or_derive(&mut self, log: &EventLog, rules: &ReplayRules) -> &DerivedState {
        let key = MemoKey::of(log);
        let stale = self
            .cached
            .as_ref()
            .is_none_or(|(cached_key, _)| *cached_key != key);
        if stale {
            tracing::debug!(events = key.len, "re-deriving state");
            self.cached = None;
        }
        let (_, state) = self
            .cached
            .get_or_insert_with(|| (key, derive(log.as_slice(), rules)));
        state
    }

    /// Drop the cached state, e.g. after the replay rules change.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Whether a state is cached.
    pub const fn is_warm(&self) -> bool {
        self.cached.is_some()
    }
}
