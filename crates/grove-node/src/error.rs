//! Error types for the node binary.

/// Top-level error for the node binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: grove_core::ConfigError,
    },

    /// The configured user id is not a UUID.
    #[error("invalid user id {value:?}: {source}")]
    UserId {
        /// The configured value.
        value: String,
        /// Why it did not parse.
        source: uuid::Error,
    },

    /// The connection pool could not be created.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: grove_db::DbError,
    },

    /// The sync coordinator could not open the local cache.
    #[error("sync error: {source}")]
    Sync {
        /// The underlying sync error.
        #[from]
        source: grove_sync::SyncError,
    },

    /// The API server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: grove_observer::ServerError,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the failure.
        message: String,
    },
}
