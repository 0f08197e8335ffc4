//! The event log for the Grove goal tracker.
//!
//! Every change a user makes is an immutable [`Event`](grove_types::Event).
//! This crate holds the per-device collection of them and the rules for
//! adding to it. Events are never mutated or removed once appended; a
//! correction is simply another event.
//!
//! # Modules
//!
//! - [`log`] -- The append-only [`EventLog`], deduplicated by client id.
//! - [`ordering`] -- Replay order: stable ascending timestamp sort.
//! - [`builder`] -- [`EventBuilder`], which stamps ids and timestamps and
//!   computes the soil quantities carried by each event.

pub mod builder;
pub mod log;
pub mod ordering;

pub use builder::{EventBuilder, Planting};
pub use log::{EventLog, MergeOutcome};
pub use ordering::replay_order;

use grove_types::EventId;

/// Errors that can occur when adding to or building events for the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// A locally authored event reused an id already in the log.
    #[error("event {0} is already in the log")]
    DuplicateId(EventId),

    /// A soil quantity for the event could not be computed.
    #[error("ledger error: {0}")]
    Ledger(#[from] grove_ledger::LedgerError),
}
