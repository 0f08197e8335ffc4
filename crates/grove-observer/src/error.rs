//! Error types for the API layer.
//!
//! [`ObserverError`] maps every failure a handler can hit onto an HTTP
//! status and a small JSON body via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use grove_events::LogError;
use grove_sync::{SyncError, SyncFailure};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path or query parameter could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The sync coordinator refused or failed the operation.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<LogError> for ObserverError {
    fn from(err: LogError) -> Self {
        Self::Sync(SyncError::Log(err))
    }
}

impl ObserverError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Sync(err) => match err {
                SyncError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SyncError::Log(LogError::DuplicateId(_)) => StatusCode::CONFLICT,
                SyncError::Log(LogError::Ledger(_)) => StatusCode::UNPROCESSABLE_ENTITY,
                e if e.is_auth() => StatusCode::UNAUTHORIZED,
                SyncError::Remote(_) | SyncError::Timeout { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let failure = match &self {
            Self::Sync(err) if status.is_server_error() || status == StatusCode::UNAUTHORIZED => {
                Some(SyncFailure::from(err))
            }
            _ => None,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "failure": failure,
        });

        (status, axum::Json(body)).into_response()
    }
}
