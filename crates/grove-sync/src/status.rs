//! The sync status signal shown to the user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SyncError;

/// Coarse sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    /// Idle, every local event confirmed.
    Synced,
    /// Pulling from (or resyncing with) the remote store.
    Syncing,
    /// Pushing, or local events are waiting to be pushed.
    PushingPending,
    /// The last remote call failed with a retryable error or a lost
    /// session.
    Offline,
}

/// Why the last remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SyncFailure {
    /// Network or database failure; retried automatically.
    Transport(String),
    /// A call exceeded its time bound; retried automatically.
    Timeout,
    /// The session is gone; sync waits for sign-in.
    NotAuthenticated,
    /// The local cache could not be written.
    Cache(String),
    /// The store refused a local event; it will not be sent again.
    Rejected(String),
}

impl SyncFailure {
    /// Whether this failure means the store is unreachable for now.
    pub const fn is_outage(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

impl From<&SyncError> for SyncFailure {
    fn from(err: &SyncError) -> Self {
        match err {
            e if e.is_auth() => Self::NotAuthenticated,
            SyncError::Timeout { .. } => Self::Timeout,
            SyncError::Cache(e) => Self::Cache(e.to_string()),
            e if e.is_rejection() => Self::Rejected(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Snapshot of the sync status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Coarse state.
    pub state: SyncState,
    /// Arrival time of the most recently confirmed event.
    pub last_confirmed_at: Option<DateTime<Utc>>,
    /// Local events not yet confirmed.
    pub pending: usize,
    /// Local events the store refused for good.
    pub rejected: usize,
    /// The last failure, cleared by the next success.
    pub last_error: Option<SyncFailure>,
}
