//! `WebSocket` handler for the sync status stream.
//!
//! Clients connect to `GET /ws/status` and receive the current
//! [`SyncStatus`](grove_sync::SyncStatus) as a JSON text frame, then one
//! frame per change. Intermediate changes a slow client misses are
//! collapsed into the latest value.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, warn};

use grove_db::{LocalCache, RemoteEventStore};

use crate::state::AppState;

/// Upgrade to a `WebSocket` and stream sync status.
///
/// # Route
///
/// `GET /ws/status`
pub async fn ws_status<R, C>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<R, C>>>,
) -> impl IntoResponse
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws<R, C>(mut socket: WebSocket, state: Arc<AppState<R, C>>)
where
    R: RemoteEventStore,
    C: LocalCache + 'static,
{
    debug!("status client connected");
    let mut rx = state.sync.subscribe_status();

    loop {
        let frame = match serde_json::to_string(&*rx.borrow_and_update()) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                warn!("failed to serialize sync status: {e}");
                return;
            }
        };
        if socket.send(frame).await.is_err() {
            debug!("status client disconnected (send failed)");
            return;
        }

        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        debug!("status channel closed");
                        return;
                    }
                    break;
                }
                msg = socket.recv() => match msg {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => {
                        debug!("status client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}
