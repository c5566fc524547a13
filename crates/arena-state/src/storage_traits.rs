//! Storage trait definitions for Arena
//!
//! - `AgentStateStore`: per-agent difficulty, record and learning history
//! - `ScenarioArchive`: immutable record of every resolved scenario
//!
//! Both traits are async and backend-agnostic. The `memory` module provides
//! in-process implementations; `surreal_store` persists to SurrealDB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Multiplier assigned to an agent on first access.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Lowest multiplier any persisted agent state may carry.
pub const MULTIPLIER_FLOOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// AgentState
// ---------------------------------------------------------------------------

/// Opaque, stable identifier of a competing agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        AgentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

/// Whether a learning event followed a victory or a defeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningKind {
    Victory,
    Defeat,
}

impl LearningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningKind::Victory => "victory",
            LearningKind::Defeat => "defeat",
        }
    }
}

/// Structured feedback recorded after a decided scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvent {
    pub agent_id: AgentId,
    pub kind: LearningKind,
    pub scenario_id: String,
    pub score: u32,
    pub lessons: Vec<String>,
    /// Set on defeats: the agent whose strategy the loser should study.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_winner_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
}

/// Persisted per-agent competitive state.
///
/// `version` increases by one on every committed write and is the
/// compare-and-swap token used by backends that cannot lock rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: AgentId,
    pub difficulty_multiplier: f64,
    pub wins: u64,
    pub losses: u64,
    pub total_games: u64,
    pub xp: u64,
    /// Chronological, oldest first.
    pub learning_history: Vec<LearningEvent>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl AgentState {
    /// Fresh state: multiplier 1.0, empty record.
    pub fn new(agent_id: AgentId) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            difficulty_multiplier: DEFAULT_MULTIPLIER,
            wins: 0,
            losses: 0,
            total_games: 0,
            xp: 0,
            learning_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            last_played_at: None,
            archived_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Fraction of decided games won, `0.0` before the first game.
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_games as f64
        }
    }

    /// Append an event and drop the oldest entries beyond `retention`.
    pub fn push_learning(&mut self, event: LearningEvent, retention: usize) {
        self.learning_history.push(event);
        if self.learning_history.len() > retention {
            let excess = self.learning_history.len() - retention;
            self.learning_history.drain(..excess);
        }
    }

    /// The last `limit` learning events, oldest first.
    pub fn recent_learning(&self, limit: usize) -> &[LearningEvent] {
        let start = self.learning_history.len().saturating_sub(limit);
        &self.learning_history[start..]
    }

    /// Check the invariants every committed state must satisfy.
    pub fn validate(&self) -> StorageResult<()> {
        let reason = if !self.difficulty_multiplier.is_finite() {
            Some(format!(
                "difficulty multiplier is not finite: {}",
                self.difficulty_multiplier
            ))
        } else if self.difficulty_multiplier < MULTIPLIER_FLOOR {
            Some(format!(
                "difficulty multiplier {} below floor {MULTIPLIER_FLOOR}",
                self.difficulty_multiplier
            ))
        } else if self.wins + self.losses > self.total_games {
            Some(format!(
                "wins ({}) + losses ({}) exceed total games ({})",
                self.wins, self.losses, self.total_games
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StorageError::InvalidState {
                agent_id: self.agent_id.0.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Mutation applied inside [`AgentStateStore::update`]. May run more than
/// once when a backend retries internally, so it must be deterministic.
pub type StateMutation<'a> = &'a (dyn Fn(&mut AgentState) + Send + Sync);

/// Per-agent state store.
///
/// Guarantees:
/// - `get` on an unknown agent creates and persists the default state.
/// - `update` is atomic per agent: the mutation sees the latest committed
///   state and its result is committed with `version + 1`, or the call fails
///   without any partial write.
/// - A mutation that breaks [`AgentState::validate`] is rejected.
#[async_trait]
pub trait AgentStateStore: Send + Sync {
    /// Fetch the agent's state, creating it on first access.
    async fn get(&self, agent_id: &AgentId) -> StorageResult<AgentState>;

    /// Read-modify-write the agent's state.
    ///
    /// Returns `StorageError::Conflict` when a concurrent writer won; callers
    /// may retry.
    async fn update(
        &self,
        agent_id: &AgentId,
        mutate: StateMutation<'_>,
    ) -> StorageResult<AgentState>;

    /// Mark the agent archived. Idempotent.
    async fn archive(&self, agent_id: &AgentId) -> StorageResult<AgentState> {
        self.update(agent_id, &|state: &mut AgentState| {
            if state.archived_at.is_none() {
                state.archived_at = Some(Utc::now());
            }
        })
        .await
    }

    /// All known agents, ordered by id.
    async fn list(&self) -> StorageResult<Vec<AgentState>>;
}

// ---------------------------------------------------------------------------
// ScenarioArchive
// ---------------------------------------------------------------------------

/// How an archived scenario resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivedOutcome {
    Decisive,
    Tie,
    NoContest,
}

/// One participant's line in an archived scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedScore {
    pub agent_id: AgentId,
    pub received: bool,
    pub score: u32,
    pub rank: u32,
    pub latency_ms: u64,
}

/// Summary of a resolved scenario kept for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedScenario {
    pub scenario_id: String,
    /// SHA-256 of the scenario's canonical JSON.
    pub fingerprint: String,
    pub category: String,
    pub variant: String,
    pub ultra_complex: bool,
    pub scenario_difficulty: f64,
    pub participants: Vec<AgentId>,
    pub outcome: ArchivedOutcome,
    pub winners: Vec<AgentId>,
    pub losers: Vec<AgentId>,
    pub scores: Vec<ArchivedScore>,
    pub archived_at: DateTime<Utc>,
}

/// Append-only archive of resolved scenarios.
#[async_trait]
pub trait ScenarioArchive: Send + Sync {
    /// Store a scenario. Fails with `DuplicateScenario` if the id exists.
    async fn record(&self, scenario: ArchivedScenario) -> StorageResult<()>;

    /// Fetch one scenario by id.
    async fn get(&self, scenario_id: &str) -> StorageResult<ArchivedScenario>;

    /// Most recent scenarios first, at most `limit`.
    async fn recent(&self, limit: usize) -> StorageResult<Vec<ArchivedScenario>>;

    /// Every archived scenario, oldest first.
    async fn all(&self) -> StorageResult<Vec<ArchivedScenario>>;
}
