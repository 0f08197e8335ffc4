//! Time gate for push retries.
//!
//! A failed push closes the gate for an exponentially growing, jittered
//! delay. The background loop keeps ticking but skips the push until the
//! gate reopens, so an outage never turns into a busy loop.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Exponential backoff gate.
#[derive(Debug, Clone)]
pub struct RetryGate {
    initial: Duration,
    max: Duration,
    failures: u32,
    reopens_at: Option<Instant>,
}

impl RetryGate {
    /// Create an open gate.
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            failures: 0,
            reopens_at: None,
        }
    }

    /// Whether a push may be attempted at `now`.
    pub fn is_open(&self, now: Instant) -> bool {
        self.reopens_at.is_none_or(|at| now >= at)
    }

    /// When the gate reopens, if it is closed.
    pub const fn reopens_at(&self) -> Option<Instant> {
        self.reopens_at
    }

    /// Consecutive failures since the last success.
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Close the gate after a failure. Returns the delay chosen.
    pub fn record_failure(&mut self, now: Instant) -> Duration {
        let delay = jitter(self.backoff());
        self.failures = self.failures.saturating_add(1);
        self.reopens_at = now.checked_add(delay);
        tracing::debug!(
            failures = self.failures,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "push retry deferred"
        );
        delay
    }

    /// Reopen the gate and reset the backoff.
    pub const fn record_success(&mut self) {
        self.failures = 0;
        self.reopens_at = None;
    }

    /// Un-jittered delay for the next failure.
    fn backoff(&self) -> Duration {
        let factor = 2_u32.checked_pow(self.failures).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Pick a delay between half and all of `delay`.
fn jitter(delay: Duration) -> Duration {
    let ceiling = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let floor = ceiling / 2;
    if ceiling == 0 {
        return delay;
    }
    Duration::from_millis(rand::rng().random_range(floor..=ceiling))
}
