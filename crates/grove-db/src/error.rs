//! Error types for the storage layer.
//!
//! [`DbError`] wraps the underlying [`sqlx`] errors. [`CacheError`] covers
//! the local cache and [`RemoteError`] is what every
//! [`RemoteEventStore`](crate::RemoteEventStore) call can fail with; it
//! separates transient failures, which sync retries, from a missing session
//! or a refused event, which it must not.

/// Errors that can occur talking to `PostgreSQL`.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that can occur reading or writing the local cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache file could not be read or written.
    #[error("cache I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The snapshot could not be encoded.
    #[error("cache encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A lock guarding the cache was poisoned.
    #[error("cache lock poisoned")]
    Poisoned,
}

/// Errors a remote event store call can fail with.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The store could not be reached or the call did not complete.
    #[error("remote transport error: {0}")]
    Transport(String),

    /// No valid session. Never retried automatically.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The store returned something that does not fit the event model.
    #[error("malformed remote row: {0}")]
    Malformed(String),

    /// The store refused this event and will refuse it again.
    #[error("event rejected by remote store: {0}")]
    Rejected(String),

    /// The database rejected the call.
    #[error(transparent)]
    Database(#[from] DbError),
}

impl RemoteError {
    /// Whether a later retry might succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Database(_) => true,
            Self::NotAuthenticated | Self::Malformed(_) | Self::Rejected(_) => false,
        }
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Transport(err.to_string()),
            // SQLSTATE classes 22 (data exception) and 23 (integrity
            // violation) depend only on the row.
            sqlx::Error::Database(ref db)
                if db
                    .code()
                    .is_some_and(|code| code.starts_with("22") || code.starts_with("23")) =>
            {
                Self::Rejected(err.to_string())
            }
            other => Self::Database(DbError::Postgres(other)),
        }
    }
}
