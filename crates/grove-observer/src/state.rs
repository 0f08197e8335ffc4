//! Shared application state for the API server.

use std::sync::Arc;

use grove_db::{LocalCache, RemoteEventStore};
use grove_sync::SyncCoordinator;

/// Shared state injected into every handler via Axum's `State` extractor.
///
/// Generic over the coordinator's remote store and cache so the same
/// router serves both the PostgreSQL-backed node and in-memory tests.
pub struct AppState<R, C> {
    /// The device's sync coordinator; all reads and writes go through it.
    pub sync: Arc<SyncCoordinator<R, C>>,
}

impl<R: RemoteEventStore, C: LocalCache> AppState<R, C> {
    /// Wrap a coordinator.
    pub const fn new(sync: Arc<SyncCoordinator<R, C>>) -> Self {
        Self { sync }
    }
}
