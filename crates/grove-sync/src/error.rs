//! Error types for the sync coordinator.

use grove_core::{ClockError, ValidationError};
use grove_db::{CacheError, RemoteError};
use grove_events::LogError;

/// Errors that can occur in the sync coordinator.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A locally authored event failed client-side validation.
    #[error("event rejected: {0}")]
    Validation(#[from] ValidationError),

    /// The event could not be added to the log.
    #[error(transparent)]
    Log(#[from] LogError),

    /// The local cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A remote store call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A remote store call exceeded its time bound.
    #[error("remote {operation} timed out")]
    Timeout {
        /// Which call timed out.
        operation: &'static str,
    },

    /// Sync is paused until the user signs in again.
    #[error("sync paused: sign in required")]
    SignInRequired,

    /// Resource availability could not be computed.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

impl SyncError {
    /// Whether this failure means the session is gone.
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::SignInRequired | Self::Remote(RemoteError::NotAuthenticated)
        )
    }

    /// Whether the remote store refused the event itself, so sending it
    /// again cannot succeed.
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::Remote(err) => !err.is_retryable() && !matches!(err, RemoteError::NotAuthenticated),
            _ => false,
        }
    }
}
