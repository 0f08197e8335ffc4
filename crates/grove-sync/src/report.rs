//! Outcomes of individual sync steps.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    /// Events the remote store confirmed, duplicates included.
    pub confirmed: usize,
    /// Of those, how many the store already had.
    pub duplicates: usize,
    /// Events the store refused for good; they are no longer pending.
    pub rejected: usize,
    /// Events still pending afterwards.
    pub remaining: usize,
    /// The retry gate was closed, so nothing was sent.
    pub deferred: bool,
}

/// Outcome of a pull or full resync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    /// Rows the remote store returned.
    pub fetched: usize,
    /// Rows that were new to the local log.
    pub merged: usize,
    /// The cursor afterwards.
    pub cursor: Option<DateTime<Utc>>,
}

/// Outcome of a full sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Present when the cycle began with a full resync.
    pub resync: Option<PullReport>,
    /// The push step.
    pub push: PushReport,
    /// The pull step.
    pub pull: PullReport,
}
