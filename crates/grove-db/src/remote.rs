//! The remote event store interface.
//!
//! The remote store is one shared, append-only log per user. It assigns
//! each row an arrival time and enforces uniqueness of the client event id.
//! A repeated insert of the same id is not an error: it reports
//! [`InsertOutcome::Duplicate`], which the caller treats as confirmation.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;

use grove_types::{Event, EventId};

use crate::error::RemoteError;

/// One row of the remote log.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    /// Id generated by the authoring device.
    pub client_event_id: EventId,
    /// Wire name of the event type.
    pub event_type: String,
    /// Type-specific fields, without `type`.
    pub payload: Value,
    /// Timestamp stamped by the authoring device, verbatim.
    pub client_timestamp: String,
    /// Server-assigned arrival time.
    pub arrived_at: DateTime<Utc>,
}

impl RemoteEvent {
    /// The local event this row carries.
    pub fn to_event(&self) -> Event {
        Event::from_parts(
            self.client_event_id,
            self.client_timestamp.clone(),
            &self.event_type,
            self.payload.clone(),
        )
    }
}

/// The columns a client supplies when inserting.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteInsert {
    /// Uniqueness key.
    pub client_event_id: EventId,
    /// Wire name of the event type.
    pub event_type: String,
    /// Type-specific fields, without `type`.
    pub payload: Value,
    /// Timestamp stamped by the authoring device.
    pub client_timestamp: String,
}

impl RemoteInsert {
    /// Split a local event into insert columns.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Malformed`] if the payload cannot be encoded.
    pub fn from_event(event: &Event) -> Result<Self, RemoteError> {
        let (event_type, payload) = event
            .to_parts()
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        Ok(Self {
            client_event_id: event.client_id,
            event_type,
            payload,
            client_timestamp: event.timestamp.clone(),
        })
    }
}

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row is new.
    Inserted {
        /// Arrival time the store assigned.
        arrived_at: DateTime<Utc>,
    },
    /// A row with this client event id already existed.
    Duplicate,
}

/// A per-user, multi-device shared event log.
///
/// Every call requires a session; without one it fails with
/// [`RemoteError::NotAuthenticated`].
pub trait RemoteEventStore: Send + Sync + 'static {
    /// Insert one event. A duplicate id is [`InsertOutcome::Duplicate`].
    fn insert(
        &self,
        event: RemoteInsert,
    ) -> impl Future<Output = Result<InsertOutcome, RemoteError>> + Send;

    /// Every row with arrival time strictly after `cursor` (all rows for
    /// `None`), ascending by arrival.
    fn fetch_since(
        &self,
        cursor: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<Vec<RemoteEvent>, RemoteError>> + Send;

    /// Open the change feed: each row inserted from now on, by any device,
    /// is delivered once on the returned channel. The channel closes when
    /// the feed is lost.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<RemoteEvent>, RemoteError>> + Send;
}
