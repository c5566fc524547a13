//! Collaborator contracts consumed by the engine.
//!
//! - [`Responder`]: asks an agent to answer a scenario
//! - [`Scorer`]: grades an answer in `[0, 100]`
//! - [`LearningSink`]: receives learning events, best effort
//!
//! Agents are bound to a responder/scorer pair by kind through the
//! [`CapabilityRegistry`].

use arena_state::{AgentId, LearningEvent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Scenario;
use crate::error::ArenaResult;

pub mod fakes;
pub mod heuristic;
pub mod http;
pub mod registry;
pub mod sink;

pub use heuristic::HeuristicScorer;
pub use http::{HttpResponder, HttpScorer};
pub use registry::{Binding, CapabilityRegistry};
pub use sink::{NullSink, TracingSink};

/// Highest score a scorer can award.
pub const MAX_SCORE: u32 = 100;

/// A bounded score with free-form feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: u32,
    pub feedback: String,
}

impl ScoreCard {
    /// Clamp `score` into `[0, 100]`.
    pub fn new(score: i64, feedback: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0, MAX_SCORE as i64) as u32,
            feedback: feedback.into(),
        }
    }
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce `agent_id`'s answer. The caller enforces the time limit.
    async fn respond(&self, agent_id: &AgentId, scenario: &Scenario) -> ArenaResult<String>;
}

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Grade an answer. Must not mutate engine state.
    async fn score(&self, scenario: &Scenario, answer: &str) -> ArenaResult<ScoreCard>;
}

#[async_trait]
pub trait LearningSink: Send + Sync {
    async fn publish(&self, event: &LearningEvent) -> ArenaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_card_clamps() {
        assert_eq!(ScoreCard::new(140, "").score, 100);
        assert_eq!(ScoreCard::new(-3, "").score, 0);
        assert_eq!(ScoreCard::new(73, "ok").score, 73);
    }
}
