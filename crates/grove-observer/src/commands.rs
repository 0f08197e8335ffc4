//! Write endpoints.
//!
//! Each command builds one event with the ledger-priced
//! [`EventBuilder`], stamps it with the current time, and hands it to the
//! coordinator, which validates and persists it before it is pushed.
//! Clients that build their own events post them to `POST /api/events`.
//!
//! | Method | Path | Event |
//! |--------|------|-------|
//! | `POST` | `/api/events` | any, as posted |
//! | `POST` | `/api/leaves` | `leaf_created` |
//! | `POST` | `/api/sprouts` | `sprout_planted` |
//! | `POST` | `/api/sprouts/{id}/water` | `sprout_watered` |
//! | `POST` | `/api/sprouts/{id}/harvest` | `sprout_harvested` |
//! | `POST` | `/api/sprouts/{id}/uproot` | `sprout_uprooted` |
//! | `POST` | `/api/sun` | `sun_shone` |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use grove_db::{LocalCache, RemoteEventStore};
use grove_events::{EventBuilder, Planting};
use grove_types::{Environment, Event, LeafId, Season, Sprout, TwigId};

use crate::error::ObserverError;
use crate::handlers::parse_sprout_id;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /api/leaves`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaf {
    /// Twig the leaf belongs to.
    pub twig_id: TwigId,
    /// Saga name.
    pub name: String,
}

/// Body of `POST /api/sprouts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSprout {
    /// Twig to plant on.
    pub twig_id: TwigId,
    /// Optional saga.
    #[serde(default)]
    pub leaf_id: Option<LeafId>,
    /// What the user is working towards.
    pub title: String,
    /// Planting duration.
    pub season: Season,
    /// Expected difficulty.
    pub environment: Environment,
    /// What failure would look like.
    #[serde(default)]
    pub bloom_wither: Option<String>,
    /// What a partial result would look like.
    #[serde(default)]
    pub bloom_budding: Option<String>,
    /// What full success would look like.
    #[serde(default)]
    pub bloom_flourish: Option<String>,
}

/// Body of `POST /api/sprouts/{id}/water`.
#[derive(Debug, Deserialize)]
pub struct Watering {
    /// Journal text.
    pub content: String,
    /// Prompt the entry answers.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of `POST /api/sprouts/{id}/harvest`.
#[derive(Debug, Deserialize)]
pub struct Harvest {
    /// Outcome, 1 to 5.
    pub result: u8,
    /// Closing reflection.
    #[serde(default)]
    pub reflection: Option<String>,
}

/// Body of `POST /api/sun`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shine {
    /// Twig reflected on.
    pub twig_id: TwigId,
    /// The twig's label at the time of writing.
    pub twig_label: String,
    /// Reflection text.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Append an event the client built itself.
pub async fn post_event<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Json(event): Json<Event>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    append(&state, event).await
}

/// Create a leaf.
pub async fn create_leaf<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Json(body): Json<NewLeaf>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let event =
        EventBuilder::new(&state.sync.rules().table).leaf_created(Utc::now(), body.twig_id, body.name);
    append(&state, event).await
}

/// Plant a sprout.
pub async fn plant_sprout<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Json(body): Json<NewSprout>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let planting = Planting {
        twig_id: body.twig_id,
        leaf_id: body.leaf_id,
        title: body.title,
        season: body.season,
        environment: body.environment,
        bloom_wither: body.bloom_wither,
        bloom_budding: body.bloom_budding,
        bloom_flourish: body.bloom_flourish,
    };
    let event = EventBuilder::new(&state.sync.rules().table).sprout_planted(Utc::now(), planting);
    append(&state, event).await
}

/// Write a journal entry for a sprout.
pub async fn water_sprout<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
    Json(body): Json<Watering>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let sprout = find_sprout(&state, &raw).await?;
    let event = EventBuilder::new(&state.sync.rules().table).sprout_watered(
        Utc::now(),
        sprout.id,
        body.content,
        body.prompt,
    );
    append(&state, event).await
}

/// Harvest a sprout with a result from 1 to 5.
pub async fn harvest_sprout<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
    Json(body): Json<Harvest>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let sprout = find_sprout(&state, &raw).await?;
    let event = EventBuilder::new(&state.sync.rules().table).sprout_harvested(
        Utc::now(),
        &sprout,
        body.result,
        body.reflection,
    )?;
    append(&state, event).await
}

/// Abandon a sprout.
pub async fn uproot_sprout<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let sprout = find_sprout(&state, &raw).await?;
    let event = EventBuilder::new(&state.sync.rules().table).sprout_uprooted(Utc::now(), &sprout)?;
    append(&state, event).await
}

/// Write the weekly reflection for a twig.
pub async fn shine<R, C>(
    State(state): State<Arc<AppState<R, C>>>,
    Json(body): Json<Shine>,
) -> Result<impl IntoResponse, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let event = EventBuilder::new(&state.sync.rules().table).sun_shone(
        Utc::now(),
        body.twig_id,
        body.twig_label,
        body.content,
    );
    append(&state, event).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_sprout<R, C>(state: &AppState<R, C>, raw: &str) -> Result<Sprout, ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    let id = parse_sprout_id(raw)?;
    state
        .sync
        .derived_state()
        .await
        .sprouts
        .remove(&id)
        .ok_or_else(|| ObserverError::NotFound(format!("sprout {id}")))
}

async fn append<R, C>(
    state: &AppState<R, C>,
    event: Event,
) -> Result<(StatusCode, Json<Event>), ObserverError>
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    state.sync.append_local_event(event.clone()).await?;
    info!(id = %event.client_id, kind = event.type_name(), "event recorded");
    Ok((StatusCode::CREATED, Json(event)))
}
