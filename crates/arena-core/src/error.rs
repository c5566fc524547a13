//! Error taxonomy for the Arena engine.

use arena_state::{AgentId, StorageError};
use serde::Serialize;

use crate::domain::{Outcome, ScenarioPhase, ScoredResult};

/// Which post-resolution write could not be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistStage {
    Difficulty,
    Learning,
}

/// A computed outcome whose state changes were not fully committed.
///
/// `persisted` agents already carry this scenario's update; only
/// `unpersisted` ones need replaying.
#[derive(Debug, Clone, Serialize)]
pub struct UnpersistedOutcome {
    pub stage: PersistStage,
    pub outcome: Outcome,
    pub results: Vec<ScoredResult>,
    pub persisted: Vec<AgentId>,
    pub unpersisted: Vec<AgentId>,
}

impl std::fmt::Display for UnpersistedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unpersisted: Vec<&str> = self.unpersisted.iter().map(|a| a.as_str()).collect();
        write!(
            f,
            "scenario {} resolved but {:?} persistence failed for [{}]",
            self.outcome.scenario_id,
            self.stage,
            unpersisted.join(", ")
        )
    }
}

/// Arena engine errors.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("agent {agent_id} did not respond within {limit_ms}ms")]
    AgentTimeout { agent_id: AgentId, limit_ms: u64 },

    #[error("scorer failed: {0}")]
    ScorerFailure(String),

    #[error("persistence conflict on agent {agent_id} after {attempts} attempts")]
    PersistenceConflict { agent_id: AgentId, attempts: u32 },

    #[error("{detail}: {reason}")]
    PersistenceFatal {
        detail: Box<UnpersistedOutcome>,
        reason: String,
    },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("no capability binding for agent {agent_id}")]
    UnknownAgentKind { agent_id: AgentId },

    #[error("responder failed for agent {agent_id}: {reason}")]
    Responder { agent_id: AgentId, reason: String },

    #[error("illegal scenario transition {from} -> {to}")]
    InvalidTransition {
        from: ScenarioPhase,
        to: ScenarioPhase,
    },

    #[error("learning sink failed: {0}")]
    Sink(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArenaError {
    /// Failures the engine absorbs or retries without surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArenaError::AgentTimeout { .. }
                | ArenaError::ScorerFailure(_)
                | ArenaError::PersistenceConflict { .. }
        )
    }
}

/// Result type for Arena engine operations.
pub type ArenaResult<T> = std::result::Result<T, ArenaError>;
