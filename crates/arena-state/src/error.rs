//! Error types for arena-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the database.
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`AgentStateStore`](crate::AgentStateStore) and
/// [`ScenarioArchive`](crate::ScenarioArchive) implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A concurrent writer committed first; the caller should re-read and retry.
    #[error("version conflict on agent {agent_id} (expected version {expected_version})")]
    Conflict {
        agent_id: String,
        expected_version: u64,
    },

    /// No archived scenario with this id.
    #[error("scenario not found: {scenario_id}")]
    ScenarioNotFound { scenario_id: String },

    /// A scenario with this id was already archived.
    #[error("scenario already archived: {scenario_id}")]
    DuplicateScenario { scenario_id: String },

    /// A mutation produced a state that violates a persisted invariant.
    #[error("invalid agent state for {agent_id}: {reason}")]
    InvalidState { agent_id: String, reason: String },

    /// Row could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Backend I/O failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether retrying the same operation can succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
