//! The local cache: what one device remembers between runs.
//!
//! Everything below must survive a restart together: the event log, the
//! pull cursor, the cache version tag, the set of events not yet confirmed
//! by the remote store, the events it refused, and the last confirmation
//! time. They are written and read as one [`CacheSnapshot`]
//! so a load never sees a mix of old and new.
//!
//! Loading never fails because of what is in the cache. An unreadable or
//! outdated snapshot comes back as [`CacheLoad::NeedsResync`] carrying
//! every event that could be salvaged; the sync coordinator then rebuilds
//! the cursor and pending set from the remote log.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use grove_events::EventLog;
use grove_types::{Event, EventId};

use crate::error::CacheError;

/// Version tag of the snapshot layout written by this build.
pub const CACHE_VERSION: u32 = 2;

/// Everything the cache persists, written and loaded as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Layout version; see [`CACHE_VERSION`].
    pub version: u32,
    /// The full local event log.
    pub events: EventLog,
    /// Greatest remote arrival time absorbed by a pull.
    pub cursor: Option<DateTime<Utc>>,
    /// Ids of local events the remote store has not confirmed.
    pub pending: BTreeSet<EventId>,
    /// Ids of local events the remote store refused for good. They are
    /// not pushed again.
    #[serde(default)]
    pub rejected: BTreeSet<EventId>,
    /// Arrival time of the most recent event this device pushed and saw
    /// confirmed.
    #[serde(default)]
    pub last_confirmed_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    /// A snapshot of a device that has never synced.
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            events: EventLog::new(),
            cursor: None,
            pending: BTreeSet::new(),
            rejected: BTreeSet::new(),
            last_confirmed_at: None,
        }
    }
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Why a cached snapshot cannot be used as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncReason {
    /// The snapshot was written with a different layout version.
    VersionMismatch {
        /// The version found, if any.
        found: Option<u64>,
    },
    /// The snapshot could not be decoded.
    Corrupt(String),
}

/// Result of loading the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLoad {
    /// Nothing has been stored yet.
    Empty,
    /// A current, well-formed snapshot.
    Ready(CacheSnapshot),
    /// The snapshot is unusable; cursor and pending set must be rebuilt.
    NeedsResync {
        /// What was wrong.
        reason: ResyncReason,
        /// Events recovered from the snapshot.
        salvaged: Vec<Event>,
    },
}

/// Durable per-device storage for a [`CacheSnapshot`].
///
/// Implementations must make [`store`](LocalCache::store) atomic: after a
/// crash, [`load`](LocalCache::load) sees either the previous snapshot or
/// the new one, never a torn write.
pub trait LocalCache: Send + Sync {
    /// Read the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] only when the storage itself fails. Bad
    /// content is reported through [`CacheLoad::NeedsResync`].
    fn load(&self) -> Result<CacheLoad, CacheError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the snapshot cannot be encoded or written.
    fn store(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError>;
}

/// Encode a snapshot as JSON bytes.
///
/// # Errors
///
/// Returns [`CacheError::Encode`] if serialization fails.
pub fn encode(snapshot: &CacheSnapshot) -> Result<Vec<u8>, CacheError> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Decode stored bytes. Never fails; see [`CacheLoad`].
pub fn decode(bytes: &[u8]) -> CacheLoad {
    if bytes.is_empty() {
        return CacheLoad::Empty;
    }
    let raw: Value = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "local cache is not valid JSON");
            return CacheLoad::NeedsResync {
                reason: ResyncReason::Corrupt(err.to_string()),
                salvaged: Vec::new(),
            };
        }
    };

    let found = raw.get("version").and_then(Value::as_u64);
    if found != Some(u64::from(CACHE_VERSION)) {
        tracing::warn!(?found, expected = CACHE_VERSION, "local cache version mismatch");
        return CacheLoad::NeedsResync {
            reason: ResyncReason::VersionMismatch { found },
            salvaged: salvage(&raw),
        };
    }

    match serde_json::from_value::<CacheSnapshot>(raw.clone()) {
        Ok(snapshot) => CacheLoad::Ready(snapshot),
        Err(err) => {
            tracing::warn!(error = %err, "local cache snapshot is malformed");
            CacheLoad::NeedsResync {
                reason: ResyncReason::Corrupt(err.to_string()),
                salvaged: salvage(&raw),
            }
        }
    }
}

/// Every element of the `events` array that still reads as an event.
fn salvage(raw: &Value) -> Vec<Event> {
    raw.get("events")
        .and_then(Value::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|event| serde_json::from_value(event.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event_json() -> Value {
        json!({
            "clientId": "7c1c9f7e-2f0e-4a4b-9d51-5c7f0a2d6b11",
            "timestamp": "2026-03-01T09:00:00.000Z",
            "type": "sun_shone",
            "twigId": "branch-1-twig-2",
            "twigLabel": "Family",
            "content": "called home"
        })
    }

    #[test]
    fn round_trips_a_current_snapshot() {
        let mut snapshot = CacheSnapshot::empty();
        let event: Event = serde_json::from_value(event_json()).unwrap();
        snapshot.pending.insert(event.client_id);
        snapshot.events.append_local(event).unwrap();
        let bytes = encode(&snapshot).unwrap();
        assert_eq!(decode(&bytes), CacheLoad::Ready(snapshot));
    }

    #[test]
    fn empty_bytes_mean_nothing_stored() {
        assert_eq!(decode(b""), CacheLoad::Empty);
    }

    #[test]
    fn garbage_needs_resync_without_events() {
        assert!(matches!(
            decode(b"{not json"),
            CacheLoad::NeedsResync { reason: ResyncReason::Corrupt(_), salvaged } if salvaged.is_empty()
        ));
    }

    #[test]
    fn old_version_keeps_its_events() {
        let old = json!({
            "version": 1,
            "events": [event_json(), {"clientId": "nope"}],
            "lastSync": "2026-03-01T09:00:00Z"
        });
        let load = decode(&serde_json::to_vec(&old).unwrap());
        assert!(matches!(
            load,
            CacheLoad::NeedsResync {
                reason: ResyncReason::VersionMismatch { found: Some(1) },
                ref salvaged,
            } if salvaged.len() == 1
        ));
    }

    #[test]
    fn current_version_with_bad_fields_is_corrupt() {
        let bad = json!({
            "version": CACHE_VERSION,
            "events": [event_json()],
            "cursor": "not a time",
            "pending": []
        });
        assert!(matches!(
            decode(&serde_json::to_vec(&bad).unwrap()),
            CacheLoad::NeedsResync { reason: ResyncReason::Corrupt(_), ref salvaged } if salvaged.len() == 1
        ));
    }

    #[test]
    fn snapshot_without_rejections_loads_with_defaults() {
        let snapshot = json!({
            "version": CACHE_VERSION,
            "events": [event_json()],
            "cursor": null,
            "pending": ["7c1c9f7e-2f0e-4a4b-9d51-5c7f0a2d6b11"]
        });
        let CacheLoad::Ready(snapshot) = decode(&serde_json::to_vec(&snapshot).unwrap()) else {
            panic!("expected a ready snapshot");
        };
        assert_eq!(snapshot.pending.len(), 1);
        assert!(snapshot.rejected.is_empty());
        assert_eq!(snapshot.last_confirmed_at, None);
    }
}
