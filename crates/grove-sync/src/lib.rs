//! Local-first sync for the Grove goal tracker.
//!
//! A [`SyncCoordinator`] keeps one device's event log in step with the
//! shared remote log without ever losing a local event or duplicating a
//! remote one. Every mutation is additive, so reconciling two devices is a
//! set union keyed by client event id; derivation's timestamp sort does
//! the rest.
//!
//! ```text
//!   idle --> pushing --> pulling --> idle
//!              |
//!              +-- failure: events stay pending, retry gate closes
//! ```
//!
//! # Modules
//!
//! - [`coordinator`] -- [`SyncCoordinator`]: push, pull, realtime ingest,
//!   full resync, background loop
//! - [`retry`] -- [`RetryGate`]: jittered exponential backoff for pushes
//! - [`status`] -- [`SyncStatus`] signal for the UI
//! - [`report`] -- Per-step outcomes
//! - [`settings`] -- [`SyncSettings`] resolved from configuration
//! - [`error`] -- [`SyncError`]

pub mod coordinator;
pub mod error;
pub mod report;
pub mod retry;
pub mod settings;
pub mod status;

pub use coordinator::SyncCoordinator;
pub use error::SyncError;
pub use report::{PullReport, PushReport, SyncReport};
pub use retry::RetryGate;
pub use settings::SyncSettings;
pub use status::{SyncFailure, SyncState, SyncStatus};
