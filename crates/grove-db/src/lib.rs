//! Storage for the Grove goal tracker: the per-device cache and the shared
//! remote event store.
//!
//! # Architecture
//!
//! ```text
//! SyncCoordinator
//!     |
//!     +-- LocalCache ---------> FileCache    (JSON file, atomic rename)
//!     |                    +--> MemoryCache  (tests)
//!     |
//!     +-- RemoteEventStore ---> PgEventStore (PostgreSQL, LISTEN/NOTIFY)
//!                          +--> MemoryRemote (in-process, fault injection)
//! ```
//!
//! # Modules
//!
//! - [`cache`] -- [`LocalCache`] trait, [`CacheSnapshot`], encoding
//! - [`file_cache`] -- Durable file-backed cache
//! - [`memory_cache`] -- In-memory cache
//! - [`remote`] -- [`RemoteEventStore`] trait and row types
//! - [`memory_remote`] -- In-process shared store for multi-device tests
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`event_store`] -- `PostgreSQL` implementation of [`RemoteEventStore`]
//! - [`error`] -- Shared error types

pub mod cache;
pub mod error;
pub mod event_store;
pub mod file_cache;
pub mod memory_cache;
pub mod memory_remote;
pub mod postgres;
pub mod remote;

// Re-export primary types for convenience.
pub use cache::{CACHE_VERSION, CacheLoad, CacheSnapshot, LocalCache, ResyncReason};
pub use error::{CacheError, DbError, RemoteError};
pub use event_store::PgEventStore;
pub use file_cache::FileCache;
pub use memory_cache::MemoryCache;
pub use memory_remote::MemoryRemote;
pub use postgres::{PostgresConfig, PostgresPool};
pub use remote::{InsertOutcome, RemoteEvent, RemoteEventStore, RemoteInsert};
