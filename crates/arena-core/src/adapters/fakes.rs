//! Deterministic collaborators for tests and local runs.

use std::collections::HashMap;

use arena_state::{AgentId, LearningEvent};
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{LearningSink, Responder, ScoreCard, Scorer};
use crate::domain::Scenario;
use crate::error::{ArenaError, ArenaResult};

/// Responder backed by a closure.
pub struct FnResponder<F> {
    f: F,
}

impl<F> FnResponder<F>
where
    F: Fn(&AgentId, &Scenario) -> String + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Responder for FnResponder<F>
where
    F: Fn(&AgentId, &Scenario) -> String + Send + Sync,
{
    async fn respond(&self, agent_id: &AgentId, scenario: &Scenario) -> ArenaResult<String> {
        Ok((self.f)(agent_id, scenario))
    }
}

/// Never answers; every call runs into the time limit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentResponder;

#[async_trait]
impl Responder for SilentResponder {
    async fn respond(&self, _agent_id: &AgentId, _scenario: &Scenario) -> ArenaResult<String> {
        std::future::pending().await
    }
}

/// Fails immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingResponder;

#[async_trait]
impl Responder for FailingResponder {
    async fn respond(&self, agent_id: &AgentId, _scenario: &Scenario) -> ArenaResult<String> {
        Err(ArenaError::Responder {
            agent_id: agent_id.clone(),
            reason: "agent unavailable".to_string(),
        })
    }
}

/// Awards the same score to every answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer {
    score: u32,
}

impl FixedScorer {
    pub fn new(score: u32) -> Self {
        Self { score }
    }
}

#[async_trait]
impl Scorer for FixedScorer {
    async fn score(&self, _scenario: &Scenario, _answer: &str) -> ArenaResult<ScoreCard> {
        Ok(ScoreCard::new(self.score as i64, "fixed"))
    }
}

/// Looks the answer up in a table; unknown answers are a scorer failure.
///
/// Pair with a responder that answers with the agent id to script per-agent
/// scores.
#[derive(Debug, Clone, Default)]
pub struct TableScorer {
    scores: HashMap<String, u32>,
}

impl TableScorer {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        Self {
            scores: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl Scorer for TableScorer {
    async fn score(&self, _scenario: &Scenario, answer: &str) -> ArenaResult<ScoreCard> {
        self.scores
            .get(answer)
            .map(|score| ScoreCard::new(*score as i64, format!("table score for {answer}")))
            .ok_or_else(|| ArenaError::ScorerFailure(format!("no score for answer {answer:?}")))
    }
}

/// Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingScorer;

#[async_trait]
impl Scorer for FailingScorer {
    async fn score(&self, _scenario: &Scenario, _answer: &str) -> ArenaResult<ScoreCard> {
        Err(ArenaError::ScorerFailure("grading model offline".to_string()))
    }
}

/// Forwards every published event to a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LearningEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LearningEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl LearningSink for ChannelSink {
    async fn publish(&self, event: &LearningEvent) -> ArenaResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|e| ArenaError::Sink(format!("channel closed: {e}")))
    }
}

/// Rejects every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSink;

#[async_trait]
impl LearningSink for FailingSink {
    async fn publish(&self, _event: &LearningEvent) -> ArenaResult<()> {
        Err(ArenaError::Sink("unreachable".to_string()))
    }
}
