//! Grove device node.
//!
//! Runs one device: the local cache, the sync loop against the shared
//! `PostgreSQL` event store, and the HTTP API the browser client talks to.
//! The node is local-first, so an unreachable database only leaves sync
//! offline; reads and writes keep working against the cache.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$GROVE_CONFIG` or `grove-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build replay rules from the economy table and reset schedule
//! 4. Open the lazy `PostgreSQL` pool and apply migrations if reachable
//! 5. Open the sync coordinator over the file cache
//! 6. Run the sync loop and the API server until `Ctrl-C`

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use grove_core::GroveConfig;
use grove_core::config::LoggingConfig;
use grove_db::{FileCache, PgEventStore, PostgresConfig, PostgresPool};
use grove_observer::{AppState, ServerConfig};
use grove_sync::{SyncCoordinator, SyncSettings};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::error::NodeError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "grove-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the cache cannot be
/// read, or the API server cannot bind.
#[tokio::main]
async fn main() -> Result<(), NodeError> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        cache = %config.cache.path.display(),
        observer_port = config.observer.port,
        "grove-node starting"
    );

    // 3. Replay rules.
    let rules = config.replay_rules()?;
    info!(
        utc_offset_minutes = config.resets.utc_offset_minutes,
        water_reset_hour = config.resets.water_reset_hour,
        "Replay rules loaded"
    );

    // 4. Remote store.
    let pool = PostgresPool::connect_lazy(
        &PostgresConfig::new(&config.remote.database_url)
            .with_max_connections(config.remote.max_connections),
    )?;
    match pool.run_migrations().await {
        Ok(()) => info!("Database migrations applied"),
        Err(e) => warn!(error = %e, "Database unreachable, starting offline"),
    }
    let user_id = parse_user_id(config.remote.user_id.as_deref())?;
    if user_id.is_none() {
        warn!("No user configured, sync waits for sign-in");
    }
    let store = PgEventStore::new(pool.pool().clone(), user_id);

    // 5. Sync coordinator.
    let coordinator = Arc::new(SyncCoordinator::open(
        store,
        FileCache::new(&config.cache.path),
        rules,
        SyncSettings::from(&config.sync),
    )?);

    // 6. Run until Ctrl-C.
    let (stop_tx, stop_rx) = watch::channel(false);

    let sync_handle = tokio::spawn(Arc::clone(&coordinator).run(stopped(stop_rx.clone())));

    let server_config = ServerConfig::from(&config.observer);
    let state = Arc::new(AppState::new(Arc::clone(&coordinator)));
    let server_handle = tokio::spawn(async move {
        grove_observer::start_server(&server_config, state, stopped(stop_rx)).await
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
    info!("Shutdown requested");

    stop_tx.send_replace(true);
    let served = server_handle.await.map_err(|e| NodeError::Task {
        message: format!("API server task: {e}"),
    })?;
    sync_handle.await.map_err(|e| NodeError::Task {
        message: format!("sync task: {e}"),
    })?;
    pool.close().await;

    info!(status = ?coordinator.status().state, "grove-node shutdown complete");
    served.map_err(NodeError::from)
}

/// Load configuration from `$GROVE_CONFIG`, falling back to
/// `grove-config.yaml`, then to defaults with environment overrides.
fn load_config() -> Result<(GroveConfig, PathBuf), NodeError> {
    let path = std::env::var_os("GROVE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok((GroveConfig::from_file(&path)?, path))
    } else {
        let mut config = GroveConfig::default();
        config.apply_env_overrides();
        Ok((config, path))
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

fn parse_user_id(raw: Option<&str>) -> Result<Option<Uuid>, NodeError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            value.trim().parse().map_err(|source| NodeError::UserId {
                value: value.to_owned(),
                source,
            })
        })
        .transpose()
}

/// Resolves once `true` is sent on the stop channel or the sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    // An error means the sender was dropped, which also means stop.
    let _ = rx.wait_for(|stop| *stop).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_id_means_signed_out() {
        assert_eq!(parse_user_id(None).unwrap(), None);
        assert_eq!(parse_user_id(Some("  ")).unwrap(), None);
    }

    #[test]
    fn user_id_must_be_a_uuid() {
        let id = parse_user_id(Some(" 6f1c2a8e-5d0b-4c57-9a51-3f9d8e2b7c10 ")).unwrap();
        assert!(id.is_some());
        assert!(matches!(
            parse_user_id(Some("alice")),
            Err(NodeError::UserId { .. })
        ));
    }
}
