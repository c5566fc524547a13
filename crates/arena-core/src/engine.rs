//! Arena engine: drives one scenario through its full lifecycle.
//!
//! ```text
//! generate -> enhance -> dispatch -> score/rank -> resolve
//!     -> difficulty (atomic per agent) -> learning -> archive
//! ```
//!
//! Side effects on agent state happen only after resolution. When an agent's
//! state change cannot be committed the computed outcome is returned inside
//! [`ArenaError::PersistenceFatal`] instead of being dropped.

use std::sync::Arc;

use arena_state::{
    AgentId, AgentState, AgentStateStore, ArchivedScenario, ArchivedScore, LearningEvent,
    ScenarioArchive,
};
use chrono::Utc;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, Instrument};

use crate::adapters::{CapabilityRegistry, LearningSink};
use crate::analytics::{self, Analytics};
use crate::config::ArenaConfig;
use crate::coordinator::EvaluationCoordinator;
use crate::cycle::{CycleEntry, CycleSummary};
use crate::domain::{Category, Outcome, PhaseTrail, Scenario, ScenarioPhase, ScoredResult};
use crate::error::{ArenaError, ArenaResult, PersistStage, UnpersistedOutcome};
use crate::learning::LearningDispatcher;
use crate::metrics::METRICS;
use crate::obs;
use crate::persist::PersistBatch;
use crate::scaler::{DifficultyScaler, ScalingRules};
use crate::scenario::{normalize_participants, ComplexityEnhancer, ScenarioGenerator};

/// Everything a completed scenario produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Ranked, best first.
    pub results: Vec<ScoredResult>,
    pub outcome: Outcome,
    /// Participants' state after every update, in participant order.
    pub states: Vec<AgentState>,
    pub learning_events: Vec<LearningEvent>,
    pub phases: Vec<ScenarioPhase>,
}

/// Read-only view of an agent's difficulty and record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultySnapshot {
    pub agent_id: AgentId,
    pub difficulty_multiplier: f64,
    pub wins: u64,
    pub losses: u64,
    pub total_games: u64,
    pub xp: u64,
    pub win_rate: f64,
    pub archived: bool,
}

impl From<&AgentState> for DifficultySnapshot {
    fn from(state: &AgentState) -> Self {
        Self {
            agent_id: state.agent_id.clone(),
            difficulty_multiplier: state.difficulty_multiplier,
            wins: state.wins,
            losses: state.losses,
            total_games: state.total_games,
            xp: state.xp,
            win_rate: state.win_rate(),
            archived: state.is_archived(),
        }
    }
}

pub struct ArenaEngine {
    config: ArenaConfig,
    store: Arc<dyn AgentStateStore>,
    archive: Arc<dyn ScenarioArchive>,
    generator: ScenarioGenerator,
    enhancer: ComplexityEnhancer,
    coordinator: EvaluationCoordinator,
    scaler: DifficultyScaler,
    dispatcher: LearningDispatcher,
}

impl ArenaEngine {
    pub fn new(
        config: ArenaConfig,
        store: Arc<dyn AgentStateStore>,
        archive: Arc<dyn ScenarioArchive>,
        registry: Arc<CapabilityRegistry>,
        sink: Arc<dyn LearningSink>,
    ) -> ArenaResult<Self> {
        config.validate()?;

        Ok(Self {
            generator: ScenarioGenerator::new(Arc::clone(&store), config.time_limit_scale),
            enhancer: ComplexityEnhancer::new(config.ultra_complex_threshold),
            coordinator: EvaluationCoordinator::new(
                registry,
                config.scorer_fallback_score,
                config.pass_threshold,
            ),
            scaler: DifficultyScaler::new(
                Arc::clone(&store),
                ScalingRules::from_config(&config),
                config.persistence,
            ),
            dispatcher: LearningDispatcher::new(
                Arc::clone(&store),
                sink,
                config.learning_retention,
                config.persistence,
            ),
            config,
            store,
            archive,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AgentStateStore> {
        &self.store
    }

    /// Run one scenario for `participants` in `category`.
    pub async fn run_scenario(
        &self,
        participants: &[AgentId],
        category: Category,
    ) -> ArenaResult<ScenarioReport> {
        let participants = normalize_participants(participants.to_vec())?;
        self.coordinator.registry().check(&participants)?;

        let scenario = self.generator.generate(&participants, category).await?;
        let span = obs::scenario_span(&scenario.id);
        self.drive(scenario).instrument(span).await
    }

    async fn drive(&self, scenario: Scenario) -> ArenaResult<ScenarioReport> {
        let mut trail = PhaseTrail::new();
        obs::emit_scenario_created(&scenario);

        let scenario = Arc::new(self.enhancer.enhance(scenario));
        trail.advance(ScenarioPhase::Enhanced)?;
        obs::emit_scenario_enhanced(&scenario);

        trail.advance(ScenarioPhase::Dispatched)?;
        obs::emit_scenario_dispatched(
            &scenario.id,
            scenario.participant_ids.len(),
            scenario.time_limit_ms,
        );
        let responses = self
            .coordinator
            .collect_responses(Arc::clone(&scenario))
            .await?;
        let results = self
            .coordinator
            .score_responses(Arc::clone(&scenario), responses)
            .await?;
        trail.advance(ScenarioPhase::Evaluated)?;

        let outcome = self.coordinator.resolve(&scenario.id, &results);
        trail.advance(ScenarioPhase::Resolved)?;
        obs::emit_scenario_resolved(&scenario.id, outcome.kind, &outcome.winners);
        METRICS.inc_scenarios_resolved();
        if outcome.tie {
            METRICS.inc_ties();
        }

        let mut learning_events = Vec::new();
        if outcome.changes_state() {
            let difficulty = self.scaler.apply(&scenario, &outcome, &results).await;
            check_batch(PersistStage::Difficulty, &outcome, &results, difficulty, |s| {
                s.agent_id.clone()
            })?;
            trail.advance(ScenarioPhase::DifficultyUpdated)?;

            let learning = self.dispatcher.dispatch(&scenario, &outcome, &results).await;
            learning_events =
                check_batch(PersistStage::Learning, &outcome, &results, learning, |e| {
                    e.agent_id.clone()
                })?;
            trail.advance(ScenarioPhase::LearningDispatched)?;
        }

        self.archive_scenario(&scenario, &outcome, &results).await;
        trail.advance(ScenarioPhase::Archived)?;

        let states = try_join_all(scenario.participant_ids.iter().map(|id| self.store.get(id)))
            .await?;

        info!(
            scenario_id = %scenario.id,
            outcome = outcome.kind.as_str(),
            phases = trail.phases().len(),
            "Scenario complete"
        );

        Ok(ScenarioReport {
            scenario: Arc::unwrap_or_clone(scenario),
            results,
            outcome,
            states,
            learning_events,
            phases: trail.phases().to_vec(),
        })
    }

    async fn archive_scenario(&self, scenario: &Scenario, outcome: &Outcome, results: &[ScoredResult]) {
        let fingerprint = scenario.fingerprint();
        let record = ArchivedScenario {
            scenario_id: scenario.id.clone(),
            fingerprint: fingerprint.clone(),
            category: scenario.base_category.as_str().to_string(),
            variant: scenario.variant.as_str().to_string(),
            ultra_complex: scenario.ultra_complex,
            scenario_difficulty: scenario.scenario_difficulty,
            participants: scenario.participant_ids.clone(),
            outcome: outcome.kind.into(),
            winners: outcome.winners.clone(),
            losers: outcome.losers.clone(),
            scores: results
                .iter()
                .map(|r| ArchivedScore {
                    agent_id: r.agent_id.clone(),
                    received: r.received,
                    score: r.score,
                    rank: r.rank,
                    latency_ms: r.latency_ms,
                })
                .collect(),
            archived_at: Utc::now(),
        };

        match self.archive.record(record).await {
            Ok(()) => obs::emit_scenario_archived(&scenario.id, &fingerprint),
            Err(e) => obs::emit_archive_failed(&scenario.id, &e),
        }
    }

    /// Run a scenario for `agent` and optional co-participants.
    ///
    /// Without a category the agent's next category in rotation is used.
    pub async fn force_test(
        &self,
        agent_id: &AgentId,
        co_participants: &[AgentId],
        category: Option<Category>,
    ) -> ArenaResult<ScenarioReport> {
        let mut participants = Vec::with_capacity(co_participants.len() + 1);
        participants.push(agent_id.clone());
        participants.extend(co_participants.iter().cloned());
        let participants = normalize_participants(participants)?;
        self.coordinator.registry().check(&participants)?;

        // Validate before the rotation read, which creates the agent's row.
        let category = match category {
            Some(category) => category,
            None => {
                let state = self.store.get(agent_id).await?;
                Category::ALL[(state.total_games % Category::ALL.len() as u64) as usize]
            }
        };

        self.run_scenario(&participants, category).await
    }

    pub async fn difficulty(&self, agent_id: &AgentId) -> ArenaResult<DifficultySnapshot> {
        let state = self.store.get(agent_id).await?;
        Ok(DifficultySnapshot::from(&state))
    }

    /// The agent's `limit` most recent learning events, oldest first.
    pub async fn learning_history(
        &self,
        agent_id: &AgentId,
        limit: usize,
    ) -> ArenaResult<Vec<LearningEvent>> {
        let state = self.store.get(agent_id).await?;
        Ok(state.recent_learning(limit).to_vec())
    }

    /// Retire an agent from future scenarios. Its history is kept.
    pub async fn archive_agent(&self, agent_id: &AgentId) -> ArenaResult<AgentState> {
        let state = self.store.archive(agent_id).await?;
        info!(agent_id = %agent_id, "Agent archived");
        Ok(state)
    }

    pub async fn analytics(&self, recent: usize) -> ArenaResult<Analytics> {
        let all = self.archive.all().await?;
        let recent = self.archive.recent(recent).await?;
        Ok(analytics::summarize(&all, recent))
    }

    /// One scenario per category, in order, for the same participants.
    ///
    /// A scenario whose outcome could not be persisted is recorded as failed
    /// and the cycle moves on; any other error aborts the cycle.
    pub async fn run_cycle(&self, participants: &[AgentId]) -> ArenaResult<CycleSummary> {
        let participants = normalize_participants(participants.to_vec())?;
        let mut entries = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let entry = match self.run_scenario(&participants, category).await {
                Ok(report) => CycleEntry {
                    category,
                    scenario_id: report.scenario.id,
                    outcome: report.outcome,
                    results: report.results,
                    error: None,
                },
                Err(ArenaError::PersistenceFatal { detail, reason }) => {
                    let error = format!("{detail}: {reason}");
                    let UnpersistedOutcome {
                        outcome, results, ..
                    } = *detail;
                    CycleEntry {
                        category,
                        scenario_id: outcome.scenario_id.clone(),
                        outcome,
                        results,
                        error: Some(error),
                    }
                }
                Err(e) => return Err(e),
            };
            entries.push(entry);
        }

        let summary = CycleSummary::from_entries(participants, entries);
        info!(
            scenarios = summary.entries.len(),
            failed = summary.failed,
            passing = summary.passing_agents.len(),
            "Test cycle complete"
        );
        Ok(summary)
    }
}

/// Turn a partially failed batch into `PersistenceFatal`.
fn check_batch<T>(
    stage: PersistStage,
    outcome: &Outcome,
    results: &[ScoredResult],
    batch: PersistBatch<T>,
    agent_of: impl Fn(&T) -> AgentId,
) -> ArenaResult<Vec<T>> {
    if batch.is_complete() {
        return Ok(batch.committed);
    }

    let reason = batch
        .failed
        .iter()
        .map(|(agent, e)| format!("{agent}: {e}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(ArenaError::PersistenceFatal {
        detail: Box::new(UnpersistedOutcome {
            stage,
            outcome: outcome.clone(),
            results: results.to_vec(),
            persisted: batch.committed.iter().map(agent_of).collect(),
            unpersisted: batch.failed.into_iter().map(|(agent, _)| agent).collect(),
        }),
        reason,
    })
}
