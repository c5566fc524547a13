//! Mapping from engine errors to HTTP responses.

use arena_core::{ArenaError, UnpersistedOutcome};
use arena_state::StorageError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    /// Present when the outcome was computed but not fully persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpersisted: Option<UnpersistedOutcome>,
}

#[derive(Debug)]
pub struct AppError(pub ArenaError);

impl From<ArenaError> for AppError {
    fn from(e: ArenaError) -> Self {
        Self(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ArenaError::PersistenceFatal { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ArenaError::InvalidScenario(_) | ArenaError::UnknownAgentKind { .. } => {
                StatusCode::BAD_REQUEST
            }
            ArenaError::PersistenceConflict { .. }
            | ArenaError::Storage(StorageError::Conflict { .. }) => StatusCode::CONFLICT,
            ArenaError::Storage(StorageError::ScenarioNotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            ArenaError::PersistenceFatal { .. } => "persistence_unconfirmed",
            ArenaError::InvalidScenario(_) => "invalid_scenario",
            ArenaError::UnknownAgentKind { .. } => "unknown_agent_kind",
            ArenaError::PersistenceConflict { .. } => "persistence_conflict",
            ArenaError::Storage(_) => "storage",
            _ => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.code(),
            unpersisted: match self.0 {
                ArenaError::PersistenceFatal { detail, .. } => Some(*detail),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
