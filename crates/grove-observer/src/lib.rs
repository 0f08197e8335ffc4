//! HTTP + `WebSocket` API for the Grove goal tracker.
//!
//! This crate provides an Axum server in front of one device's
//! [`SyncCoordinator`](grove_sync::SyncCoordinator):
//!
//! - **REST reads** over the derived state: resources, sprouts by view,
//!   leaves, twigs, and the raw event log
//! - **REST commands** that build, validate, and append events
//! - **Sync control**: manual sync trigger, status, and resume after sign-in
//! - **`WebSocket` endpoint** (`/ws/status`) streaming sync status changes
//!
//! # Architecture
//!
//! Handlers never touch storage directly. Reads derive from the
//! coordinator's log through its memo; writes go through
//! `append_local_event`, so a command is durable and pending before the
//! response is sent, and the background sync loop pushes it.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
