//! Difficulty Scaler: unbounded growth on wins, floored decay on losses.
//!
//! Every agent's change (multiplier, record, XP) is one atomic store update.
//! Agents are written concurrently; the store serializes writers per agent.

use std::sync::Arc;

use arena_state::{AgentId, AgentState, AgentStateStore, MULTIPLIER_FLOOR};
use chrono::Utc;
use futures::future::join_all;
use tracing::instrument;

use crate::config::{ArenaConfig, PersistenceConfig};
use crate::domain::{Outcome, Scenario, ScoredResult};
use crate::obs;
use crate::persist::{update_with_retry, PersistBatch};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingRules {
    pub win_increment: f64,
    pub loss_decrement: f64,
    pub floor: f64,
}

impl Default for ScalingRules {
    fn default() -> Self {
        Self {
            win_increment: 0.5,
            loss_decrement: 0.25,
            floor: MULTIPLIER_FLOOR,
        }
    }
}

impl ScalingRules {
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self {
            win_increment: config.win_increment,
            loss_decrement: config.loss_decrement,
            floor: config.multiplier_floor.max(MULTIPLIER_FLOOR),
        }
    }

    /// No ceiling.
    pub fn after_win(&self, multiplier: f64) -> f64 {
        multiplier + self.win_increment
    }

    pub fn after_loss(&self, multiplier: f64) -> f64 {
        (multiplier - self.loss_decrement).max(self.floor)
    }
}

/// XP earned for a score: `score * xp_reward / 100`.
pub fn earned_xp(score: u32, xp_reward: u64) -> u64 {
    u64::from(score).saturating_mul(xp_reward) / 100
}

pub struct DifficultyScaler {
    store: Arc<dyn AgentStateStore>,
    rules: ScalingRules,
    persistence: PersistenceConfig,
}

impl DifficultyScaler {
    pub fn new(
        store: Arc<dyn AgentStateStore>,
        rules: ScalingRules,
        persistence: PersistenceConfig,
    ) -> Self {
        Self {
            store,
            rules,
            persistence,
        }
    }

    pub fn rules(&self) -> ScalingRules {
        self.rules
    }

    /// Apply a decisive outcome. Ties and no-contests change nothing.
    #[instrument(skip_all, fields(scenario_id = %outcome.scenario_id))]
    pub async fn apply(
        &self,
        scenario: &Scenario,
        outcome: &Outcome,
        results: &[ScoredResult],
    ) -> PersistBatch<AgentState> {
        let mut batch = PersistBatch {
            committed: Vec::new(),
            failed: Vec::new(),
        };
        if !outcome.changes_state() {
            return batch;
        }

        let bonus = scenario.variant.winner_bonus();
        let played_at = Utc::now();
        let updates = outcome
            .winners
            .iter()
            .map(|id| (id, true))
            .chain(outcome.losers.iter().map(|id| (id, false)))
            .map(|(agent_id, won)| {
                let score = results
                    .iter()
                    .find(|r| &r.agent_id == agent_id && r.received)
                    .map(|r| r.score)
                    .unwrap_or(0);
                let xp = earned_xp(score, scenario.xp_reward) + if won { bonus } else { 0 };
                self.update_agent(agent_id.clone(), won, xp, played_at)
            });

        for (agent_id, result) in join_all(updates).await {
            match result {
                Ok(state) => {
                    obs::emit_difficulty_updated(
                        &agent_id,
                        outcome.is_winner(&agent_id),
                        state.difficulty_multiplier,
                        state.total_games,
                    );
                    batch.committed.push(state);
                }
                Err(e) => batch.failed.push((agent_id, e)),
            }
        }
        batch
    }

    async fn update_agent(
        &self,
        agent_id: AgentId,
        won: bool,
        xp: u64,
        played_at: chrono::DateTime<Utc>,
    ) -> (AgentId, crate::error::ArenaResult<AgentState>) {
        let rules = self.rules;
        let mutate = move |s: &mut AgentState| {
            if won {
                s.difficulty_multiplier = rules.after_win(s.difficulty_multiplier);
                s.wins += 1;
            } else {
                s.difficulty_multiplier = rules.after_loss(s.difficulty_multiplier);
                s.losses += 1;
            }
            s.total_games += 1;
            s.xp = s.xp.saturating_add(xp);
            s.last_played_at = Some(played_at);
        };
        let result =
            update_with_retry(self.store.as_ref(), &agent_id, &self.persistence, &mutate).await;
        (agent_id, result)
    }
}
