//! `PostgreSQL` implementation of the remote event store.
//!
//! Rows live in `grove_events`, unique on `(user_id, client_event_id)`.
//! Inserts use `ON CONFLICT DO NOTHING RETURNING arrived_at`: a returned row
//! means a new insert, no row means the id was already present. The change
//! feed is `LISTEN grove_events`; the insert trigger sends each new row's
//! key and the listener reads the row back.
//!
//! `arrived_at` is stamped when the insert runs, not when it commits, so a
//! slow transaction can become visible behind rows stamped after it.
//! Callers fetch from a little before their cursor and dedup by id.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use uuid::Uuid;

use grove_types::EventId;

use crate::error::RemoteError;
use crate::remote::{InsertOutcome, RemoteEvent, RemoteEventStore, RemoteInsert};

/// Notification channel the insert trigger publishes on.
const NOTIFY_CHANNEL: &str = "grove_events";

/// Buffer of the change feed handed to subscribers.
const FEED_CAPACITY: usize = 256;

/// A row from the `grove_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRow {
    client_event_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    client_timestamp: String,
    arrived_at: DateTime<Utc>,
}

impl From<EventRow> for RemoteEvent {
    fn from(row: EventRow) -> Self {
        Self {
            client_event_id: EventId::from(row.client_event_id),
            event_type: row.event_type,
            payload: row.payload,
            client_timestamp: row.client_timestamp,
            arrived_at: row.arrived_at,
        }
    }
}

/// Body of a `grove_events` notification.
#[derive(Debug, Deserialize)]
struct Notification {
    user_id: Uuid,
    client_event_id: Uuid,
}

/// The shared event log of one user, stored in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
    /// Signed-in user; `None` means no session.
    user_id: Option<Uuid>,
}

impl PgEventStore {
    /// A store scoped to `user_id`. With `None`, every call fails with
    /// [`RemoteError::NotAuthenticated`].
    pub const fn new(pool: PgPool, user_id: Option<Uuid>) -> Self {
        Self { pool, user_id }
    }

    fn user(&self) -> Result<Uuid, RemoteError> {
        self.user_id.ok_or(RemoteError::NotAuthenticated)
    }
}

impl RemoteEventStore for PgEventStore {
    async fn insert(&self, event: RemoteInsert) -> Result<InsertOutcome, RemoteError> {
        let user_id = self.user()?;
        let arrived_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r"INSERT INTO grove_events (user_id, client_event_id, event_type, payload, client_timestamp)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (user_id, client_event_id) DO NOTHING
              RETURNING arrived_at",
        )
        .bind(user_id)
        .bind(event.client_event_id.into_inner())
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(&event.client_timestamp)
        .fetch_optional(&self.pool)
        .await?;

        Ok(arrived_at.map_or(InsertOutcome::Duplicate, |arrived_at| {
            InsertOutcome::Inserted { arrived_at }
        }))
    }

    async fn fetch_since(
        &self,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteEvent>, RemoteError> {
        let user_id = self.user()?;
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT client_event_id, event_type, payload, client_timestamp, arrived_at
              FROM grove_events
              WHERE user_id = $1 AND ($2::TIMESTAMPTZ IS NULL OR arrived_at > $2)
              ORDER BY arrived_at, id",
        )
        .bind(user_id)
        .bind(cursor)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), ?cursor, "fetched remote events");
        Ok(rows.into_iter().map(RemoteEvent::from).collect())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<RemoteEvent>, RemoteError> {
        let user_id = self.user()?;
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(NOTIFY_CHANNEL).await?;

        let pool = self.pool.clone();
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(notification) => notification,
                    Err(err) => {
                        tracing::warn!(error = %err, "change feed lost");
                        break;
                    }
                };
                let key: Notification = match serde_json::from_str(notification.payload()) {
                    Ok(key) => key,
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring malformed notification");
                        continue;
                    }
                };
                if key.user_id != user_id {
                    continue;
                }
                match fetch_one(&pool, user_id, key.client_event_id).await {
                    Ok(Some(row)) => {
                        if tx.send(row).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => tracing::warn!(error = %err, "failed to read notified row"),
                }
            }
        });
        Ok(rx)
    }
}

async fn fetch_one(
    pool: &PgPool,
    user_id: Uuid,
    client_event_id: Uuid,
) -> Result<Option<RemoteEvent>, RemoteError> {
    let row = sqlx::query_as::<_, EventRow>(
        r"SELECT client_event_id, event_type, payload, client_timestamp, arrived_at
          FROM grove_events
          WHERE user_id = $1 AND client_event_id = $2",
    )
    .bind(user_id)
    .bind(client_event_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(RemoteEvent::from))
}
