//! In-process remote event store.
//!
//! [`MemoryRemote`] behaves like the shared `PostgreSQL` log: per-user rows,
//! a unique client event id, strictly increasing arrival times, and a change
//! feed. Clones share one store, so several sync coordinators built on
//! clones act as several devices of the same user.
//!
//! It also injects the faults sync must survive: an unreachable network, a
//! lost session, an insert that commits but whose acknowledgement is lost,
//! an event the store refuses outright, a row committed behind rows that
//! arrived after it, and calls that hang until released.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{broadcast, mpsc, watch};

use grove_types::EventId;

use crate::error::RemoteError;
use crate::remote::{InsertOutcome, RemoteEvent, RemoteEventStore, RemoteInsert};

/// Buffer of the change feed.
const FEED_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    signed_out: bool,
    lost_acks: u32,
    backdate: Option<TimeDelta>,
    refused: HashSet<EventId>,
}

impl Faults {
    fn check(&self) -> Result<(), RemoteError> {
        if self.offline {
            return Err(RemoteError::Transport("network unreachable".to_owned()));
        }
        if self.signed_out {
            return Err(RemoteError::NotAuthenticated);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Shared {
    rows: Vec<RemoteEvent>,
    last_arrival: Option<DateTime<Utc>>,
    faults: Faults,
}

/// A [`RemoteEventStore`] held in memory. Clones share one store.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    shared: Arc<Mutex<Shared>>,
    feed: broadcast::Sender<RemoteEvent>,
    stalled: Arc<watch::Sender<bool>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// An empty, reachable store with a valid session.
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        let (stalled, _) = watch::channel(false);
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            feed,
            stalled: Arc::new(stalled),
        }
    }

    /// Make every call fail with a transport error (or stop doing so).
    pub fn set_offline(&self, offline: bool) {
        self.lock().faults.offline = offline;
    }

    /// Make every call fail with [`RemoteError::NotAuthenticated`] (or stop
    /// doing so).
    pub fn set_signed_out(&self, signed_out: bool) {
        self.lock().faults.signed_out = signed_out;
    }

    /// Make every call hang until the store is un-stalled. Calls already
    /// hanging resume once `stalled` is set back to `false`.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.send_replace(stalled);
    }

    /// Commit the next `count` inserts but report each as a transport
    /// failure, as if the acknowledgement were lost in flight.
    pub fn lose_next_acks(&self, count: u32) {
        self.lock().faults.lost_acks = count;
    }

    /// Stamp the next stored row `by` earlier than its commit, like a
    /// transaction that took its arrival time before a concurrent one and
    /// committed after it.
    pub fn backdate_next_insert(&self, by: TimeDelta) {
        self.lock().faults.backdate = Some(by);
    }

    /// Refuse every insert of `id` with [`RemoteError::Rejected`].
    pub fn refuse(&self, id: EventId) {
        self.lock().faults.refused.insert(id);
    }

    /// Every stored row, in arrival order.
    pub fn rows(&self) -> Vec<RemoteEvent> {
        self.lock().rows.clone()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply faults shared by every call.
    async fn gate(&self) -> Result<(), RemoteError> {
        let mut stalled = self.stalled.subscribe();
        while *stalled.borrow_and_update() {
            if stalled.changed().await.is_err() {
                break;
            }
        }
        self.lock().faults.check()
    }
}

/// An arrival time strictly after `last`.
fn next_arrival(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(last) if now <= last => last
            .checked_add_signed(TimeDelta::microseconds(1))
            .unwrap_or(last),
        _ => now,
    }
}

impl RemoteEventStore for MemoryRemote {
    async fn insert(&self, event: RemoteInsert) -> Result<InsertOutcome, RemoteError> {
        self.gate().await?;
        let (outcome, ack_lost) = {
            let mut shared = self.lock();
            if shared.faults.refused.contains(&event.client_event_id) {
                return Err(RemoteError::Rejected(format!(
                    "event {} violates a table constraint",
                    event.client_event_id
                )));
            }
            let ack_lost = shared.faults.lost_acks > 0;
            shared.faults.lost_acks = shared.faults.lost_acks.saturating_sub(1);
            if shared
                .rows
                .iter()
                .any(|row| row.client_event_id == event.client_event_id)
            {
                (InsertOutcome::Duplicate, ack_lost)
            } else {
                let committed_at = next_arrival(shared.last_arrival);
                shared.last_arrival = Some(committed_at);
                let arrived_at = shared
                    .faults
                    .backdate
                    .take()
                    .and_then(|by| committed_at.checked_sub_signed(by))
                    .unwrap_or(committed_at);
                let row = RemoteEvent {
                    client_event_id: event.client_event_id,
                    event_type: event.event_type,
                    payload: event.payload,
                    client_timestamp: event.client_timestamp,
                    arrived_at,
                };
                shared.rows.push(row.clone());
                // No subscribers is fine.
                let _ = self.feed.send(row);
                (InsertOutcome::Inserted { arrived_at }, ack_lost)
            }
        };
        if ack_lost {
            return Err(RemoteError::Transport(
                "connection reset before acknowledgement".to_owned(),
            ));
        }
        Ok(outcome)
    }

    async fn fetch_since(
        &self,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteEvent>, RemoteError> {
        self.gate().await?;
        let shared = self.lock();
        Ok(shared
            .rows
            .iter()
            .filter(|row| cursor.is_none_or(|cursor| row.arrived_at > cursor))
            .cloned()
            .collect())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteEvent>, RemoteError> {
        self.gate().await?;
        let mut feed = self.feed.subscribe();
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(row) => {
                        if tx.send(row).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change feed lagged; next pull will catch up");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(rx)
    }
}
