//! Records produced while evaluating a scenario.

use arena_state::{AgentId, ArchivedOutcome};
use serde::{Deserialize, Serialize};

/// What one participant sent back, or that it did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub scenario_id: String,
    pub agent_id: AgentId,
    pub answer: String,
    pub latency_ms: u64,
    /// False on timeout or responder failure.
    pub received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// A participant's score and competition rank (1 = best, ties share a rank).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub scenario_id: String,
    pub agent_id: AgentId,
    pub score: u32,
    pub feedback: String,
    pub rank: u32,
    pub received: bool,
    pub latency_ms: u64,
    /// The scorer failed and `score` is the configured fallback.
    #[serde(default)]
    pub scorer_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// A winner or a self-test verdict.
    Decisive,
    /// The top score is shared.
    Tie,
    /// Several participants and none responded.
    NoContest,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Decisive => "decisive",
            OutcomeKind::Tie => "tie",
            OutcomeKind::NoContest => "no_contest",
        }
    }
}

impl From<OutcomeKind> for ArchivedOutcome {
    fn from(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Decisive => ArchivedOutcome::Decisive,
            OutcomeKind::Tie => ArchivedOutcome::Tie,
            OutcomeKind::NoContest => ArchivedOutcome::NoContest,
        }
    }
}

/// Resolved winner/loser classification for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub scenario_id: String,
    pub winners: Vec<AgentId>,
    pub losers: Vec<AgentId>,
    pub tie: bool,
    pub kind: OutcomeKind,
}

impl Outcome {
    /// Whether difficulty and learning updates apply.
    pub fn changes_state(&self) -> bool {
        self.kind == OutcomeKind::Decisive
    }

    pub fn is_winner(&self, agent_id: &AgentId) -> bool {
        self.winners.contains(agent_id)
    }

    /// The sole winner, if any.
    pub fn winner(&self) -> Option<&AgentId> {
        match self.winners.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
