//! Axum router construction.
//!
//! Assembles every route (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled for the browser client.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use grove_db::{LocalCache, RemoteEventStore};

use crate::state::AppState;
use crate::{commands, handlers, ws};

/// Build the complete router.
///
/// See [`handlers`] and [`commands`] for the route tables. `GET /ws/status`
/// streams sync status.
pub fn build_router<R, C>(state: Arc<AppState<R, C>>) -> Router
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/status", get(ws::ws_status::<R, C>))
        // Reads
        .route("/api/state", get(handlers::get_state::<R, C>))
        .route(
            "/api/sprouts",
            get(handlers::list_sprouts::<R, C>).post(commands::plant_sprout::<R, C>),
        )
        .route("/api/sprouts/{id}", get(handlers::get_sprout::<R, C>))
        .route("/api/leaves", post(commands::create_leaf::<R, C>))
        .route("/api/leaves/{id}", get(handlers::get_leaf::<R, C>))
        .route("/api/twigs/{id}", get(handlers::get_twig::<R, C>))
        .route(
            "/api/events",
            get(handlers::list_events::<R, C>).post(commands::post_event::<R, C>),
        )
        // Commands
        .route("/api/sprouts/{id}/water", post(commands::water_sprout::<R, C>))
        .route("/api/sprouts/{id}/harvest", post(commands::harvest_sprout::<R, C>))
        .route("/api/sprouts/{id}/uproot", post(commands::uproot_sprout::<R, C>))
        .route("/api/sun", post(commands::shine::<R, C>))
        // Sync
        .route("/api/sync", post(handlers::trigger_sync::<R, C>))
        .route("/api/sync/status", get(handlers::get_sync_status::<R, C>))
        .route("/api/session/resume", post(handlers::resume_session::<R, C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
