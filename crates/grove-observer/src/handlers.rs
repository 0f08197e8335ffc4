//! Read endpoints and sync control.
//!
//! Every read derives from the coordinator's current log (memoized), so
//! responses always reflect local events that have not been pushed yet.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/state` | Derived state, resources, next resets |
//! | `GET` | `/api/sprouts` | Sprouts by view (`active`, `cultivated`, `ready`, `all`) |
//! | `GET` | `/api/sprouts/{id}` | One sprout |
//! | `GET` | `/api/leaves/{id}` | One leaf and its sprouts |
//! | `GET` | `/api/twigs/{id}` | Sprouts, leaves, and reflections on a twig |
//! | `GET` | `/api/events` | The local event log |
//! | `GET` | `/api/sync/status` | Current sync status |
//! | `POST` | `/api/sync` | Run a sync cycle now |
//! | `POST` | `/api/session/resume` | Resume sync after sign-in |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;

use grove_core::{next_resets, views};
use grove_db::{LocalCache, RemoteEventStore};
use grove_sync::SyncError;
use grove_types::{LeafId, Sprout, SproutId, TwigId};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/sprouts`.
#[derive(Debug, Default, Deserialize)]
pub struct SproutsQuery {
    /// `active` (default), `cultivated`, `ready`, or `all`.
    pub view: Option<String>,
    /// Restrict to one twig.
    pub twig: Option<String>,
}

/// Query parameters for `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events, newest last (default 500, max 5000).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET /api/state
// ---------------------------------------------------------------------------

/// The full derived state plus resources available right now.
pub async fn get_state<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let now = Utc::now();
    let derived = state.sync.derived_state().await;
    let resources = state.sync.resources(now).await?;
    let resets = next_resets(state.sync.rules(), now).map_err(SyncError::from)?;

    Ok(Json(serde_json::json!({
        "now": now,
        "resources": resources,
        "nextResets": {
            "water": resets.water,
            "sun": resets.sun,
        },
        "state": derived,
    })))
}

// ---------------------------------------------------------------------------
// Sprouts, leaves, twigs
// ---------------------------------------------------------------------------

/// List sprouts through one of the read-only views.
pub async fn list_sprouts<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Query(params): Query<SproutsQuery>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let twig = params.twig.as_deref().map(parse_twig).transpose()?;
    let derived = state.sync.derived_state().await;
    let now = Utc::now();

    let view = params.view.as_deref().unwrap_or("active");
    let sprouts: Vec<&Sprout> = match view {
        "active" => views::active_sprouts(&derived),
        "cultivated" => views::cultivated(&derived),
        "ready" => views::ready_to_harvest(&derived, now),
        "all" => derived.sprouts.values().collect(),
        other => {
            return Err(ObserverError::InvalidRequest(format!(
                "unknown view {other:?}; expected active, cultivated, ready, or all"
            )));
        }
    };
    let sprouts: Vec<&Sprout> = sprouts
        .into_iter()
        .filter(|sprout| twig.as_ref().is_none_or(|twig| sprout.twig_id == *twig))
        .collect();

    Ok(Json(serde_json::json!({
        "view": view,
        "count": sprouts.len(),
        "sprouts": sprouts,
    })))
}

/// One sprout, with whether it has been watered in today's period.
pub async fn get_sprout<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let id = parse_sprout_id(&raw)?;
    let derived = state.sync.derived_state().await;
    let sprout = derived
        .sprouts
        .get(&id)
        .ok_or_else(|| ObserverError::NotFound(format!("sprout {id}")))?;
    let now = Utc::now();
    let watered_today = views::watered_today(&derived, id, &state.sync.rules().schedule, now);

    Ok(Json(serde_json::json!({
        "sprout": sprout,
        "wateredToday": watered_today,
        "readyToHarvest": sprout.is_ready(now),
    })))
}

/// One leaf and the sprouts that belong to it.
pub async fn get_leaf<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let id: LeafId = raw
        .parse()
        .map_err(|err| ObserverError::InvalidRequest(format!("{raw}: {err}")))?;
    let derived = state.sync.derived_state().await;
    let leaf = derived
        .leaves
        .get(&id)
        .ok_or_else(|| ObserverError::NotFound(format!("leaf {id}")))?;

    Ok(Json(serde_json::json!({
        "leaf": leaf,
        "sprouts": views::sprouts_in_leaf(&derived, id),
    })))
}

/// Everything attached to one twig.
pub async fn get_twig<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let twig = parse_twig(&raw)?;
    let derived = state.sync.derived_state().await;

    Ok(Json(serde_json::json!({
        "twigId": twig,
        "sprouts": views::sprouts_on_twig(&derived, &twig),
        "leaves": views::leaves_on_twig(&derived, &twig),
        "sunEntries": views::sun_entries_for_twig(&derived, &twig),
    })))
}

// ---------------------------------------------------------------------------
// GET /api/events
// ---------------------------------------------------------------------------

/// The local event log in append order, most recent `limit` events.
pub async fn list_events<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Query(params): Query<EventsQuery>,
) -> impl IntoResponse
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let limit = params.limit.unwrap_or(500).min(5000);
    let events = state.sync.events().await;
    let skip = events.len().saturating_sub(limit);
    let recent: Vec<_> = events.into_iter().skip(skip).collect();

    Json(serde_json::json!({
        "count": recent.len(),
        "events": recent,
    }))
}

// ---------------------------------------------------------------------------
// Sync control
// ---------------------------------------------------------------------------

/// The current sync status.
pub async fn get_sync_status<R, C>(State(state): State<Arc<AppState<R, C>>>) -> impl IntoResponse
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    Json(state.sync.status())
}

/// Run a sync cycle now, bypassing the push retry delay.
pub async fn trigger_sync<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let report = state.sync.sync_now().await?;
    Ok(Json(serde_json::json!({
        "report": report,
        "status": state.sync.status(),
    })))
}

/// Resume sync after the user signed in again.
pub async fn resume_session<R, C>(State(state): State<Arc<AppState<R, C>>>) -> impl IntoResponse
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    state.sync.resume_after_sign_in().await;
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_sprout_id(raw: &str) -> Result<SproutId, ObserverError> {
    raw.parse()
        .map_err(|err| ObserverError::InvalidRequest(format!("{raw}: {err}")))
}

fn parse_twig(raw: &str) -> Result<TwigId, ObserverError> {
    TwigId::parse(raw).map_err(|err| ObserverError::InvalidRequest(err.to_string()))
}
