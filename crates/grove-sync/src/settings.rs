//! Runtime sync settings.

use std::time::Duration;

use grove_core::config::SyncConfig;

/// Timing knobs for the coordinator, resolved from [`SyncConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Delay after the first failed push.
    pub push_retry_initial: Duration,
    /// Ceiling on the push retry delay.
    pub push_retry_max: Duration,
    /// Bound on every remote call.
    pub request_timeout: Duration,
    /// Interval between background sync cycles.
    pub poll_interval: Duration,
    /// How far before the cursor each pull starts, so rows committed out
    /// of arrival order are still fetched.
    pub pull_overlap: Duration,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            push_retry_initial: Duration::from_millis(config.push_retry_initial_ms),
            push_retry_max: Duration::from_millis(config.push_retry_max_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            pull_overlap: Duration::from_millis(config.pull_overlap_ms),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}
