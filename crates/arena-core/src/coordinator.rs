//! Evaluation Coordinator: concurrent fan-out, scoring, ranking, resolution.
//!
//! Each participant's responder call runs in its own task bounded by the
//! scenario's time limit. Missing the deadline cancels only that call; the
//! participant is recorded as not received, scores 0 and ranks last.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arena_state::AgentId;
use tracing::instrument;

use crate::adapters::{Binding, CapabilityRegistry, MAX_SCORE};
use crate::domain::{Outcome, OutcomeKind, ResponseRecord, Scenario, ScoredResult};
use crate::error::{ArenaError, ArenaResult};
use crate::metrics::METRICS;
use crate::obs;

pub struct EvaluationCoordinator {
    registry: Arc<CapabilityRegistry>,
    scorer_fallback_score: u32,
    pass_threshold: u32,
}

impl EvaluationCoordinator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        scorer_fallback_score: u32,
        pass_threshold: u32,
    ) -> Self {
        Self {
            registry,
            scorer_fallback_score,
            pass_threshold,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    fn bindings(&self, scenario: &Scenario) -> ArenaResult<Vec<(AgentId, Binding)>> {
        scenario
            .participant_ids
            .iter()
            .map(|id| Ok((id.clone(), self.registry.binding_for(id)?.clone())))
            .collect()
    }

    /// Ask every participant concurrently. Results follow participant order.
    #[instrument(skip(self, scenario), fields(scenario_id = %scenario.id))]
    pub async fn collect_responses(
        &self,
        scenario: Arc<Scenario>,
    ) -> ArenaResult<Vec<ResponseRecord>> {
        let bindings = self.bindings(&scenario)?;
        let limit = scenario.time_limit();

        let tasks: Vec<_> = bindings
            .into_iter()
            .map(|(agent_id, binding)| {
                let scenario = Arc::clone(&scenario);
                let task_agent = agent_id.clone();
                let handle = tokio::spawn(async move {
                    let started = Instant::now();
                    let result = tokio::time::timeout(
                        limit,
                        binding.responder.respond(&task_agent, &scenario),
                    )
                    .await;
                    (result, started.elapsed())
                });
                (agent_id, handle)
            })
            .collect();

        let mut records = Vec::with_capacity(tasks.len());
        for (agent_id, handle) in tasks {
            let record = |answer: String, latency_ms: u64, failure: Option<String>| ResponseRecord {
                scenario_id: scenario.id.clone(),
                agent_id: agent_id.clone(),
                received: failure.is_none(),
                answer,
                latency_ms,
                failure,
            };

            let record = match handle.await {
                Ok((Ok(Ok(answer)), elapsed)) => record(answer, millis(elapsed), None),
                Ok((Ok(Err(e)), elapsed)) => {
                    obs::emit_responder_failed(&scenario.id, &agent_id, &e);
                    record(String::new(), millis(elapsed), Some(e.to_string()))
                }
                Ok((Err(_elapsed), _)) => {
                    obs::emit_agent_timeout(&scenario.id, &agent_id, scenario.time_limit_ms);
                    METRICS.inc_timeouts();
                    let timeout = ArenaError::AgentTimeout {
                        agent_id: agent_id.clone(),
                        limit_ms: scenario.time_limit_ms,
                    };
                    record(String::new(), scenario.time_limit_ms, Some(timeout.to_string()))
                }
                Err(join_err) => {
                    obs::emit_responder_failed(&scenario.id, &agent_id, &join_err);
                    record(String::new(), 0, Some(format!("responder task failed: {join_err}")))
                }
            };
            records.push(record);
        }
        Ok(records)
    }

    /// Score received answers concurrently and rank all participants.
    ///
    /// A failing scorer yields the configured fallback score for that answer.
    #[instrument(skip(self, scenario, responses), fields(scenario_id = %scenario.id))]
    pub async fn score_responses(
        &self,
        scenario: Arc<Scenario>,
        responses: Vec<ResponseRecord>,
    ) -> ArenaResult<Vec<ScoredResult>> {
        let mut tasks = Vec::with_capacity(responses.len());
        for response in responses {
            if !response.received {
                tasks.push((response, None));
                continue;
            }
            let scorer = Arc::clone(&self.registry.binding_for(&response.agent_id)?.scorer);
            let scenario = Arc::clone(&scenario);
            let answer = response.answer.clone();
            let limit = scenario.time_limit();
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(limit, scorer.score(&scenario, &answer)).await {
                    Ok(result) => result,
                    Err(_) => Err(ArenaError::ScorerFailure(format!(
                        "scorer exceeded {}ms",
                        limit.as_millis()
                    ))),
                }
            });
            tasks.push((response, Some(handle)));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (response, handle) in tasks {
            let (score, feedback, scorer_fallback) = match handle {
                None => (
                    0,
                    response
                        .failure
                        .clone()
                        .unwrap_or_else(|| "no response".to_string()),
                    false,
                ),
                Some(handle) => {
                    let scored = handle
                        .await
                        .map_err(|e| ArenaError::ScorerFailure(format!("scorer task failed: {e}")))
                        .and_then(|r| r);
                    match scored {
                        Ok(card) => (card.score.min(MAX_SCORE), card.feedback, false),
                        Err(e) => {
                            obs::emit_scorer_fallback(
                                &scenario.id,
                                &response.agent_id,
                                self.scorer_fallback_score,
                                &e,
                            );
                            METRICS.inc_scorer_fallbacks();
                            (
                                self.scorer_fallback_score,
                                format!("scorer unavailable: {e}"),
                                true,
                            )
                        }
                    }
                }
            };

            results.push(ScoredResult {
                scenario_id: response.scenario_id,
                agent_id: response.agent_id,
                score,
                feedback,
                rank: 0,
                received: response.received,
                latency_ms: response.latency_ms,
                scorer_fallback,
            });
        }

        rank_results(&mut results);
        obs::emit_scenario_evaluated(
            &scenario.id,
            results.iter().filter(|r| r.received).count(),
            results.len(),
        );
        Ok(results)
    }

    pub fn resolve(&self, scenario_id: &str, ranked: &[ScoredResult]) -> Outcome {
        resolve_outcome(scenario_id, ranked, self.pass_threshold)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Competition ranking, best first.
///
/// Received results rank by score with shared ranks for equal scores.
/// Participants that did not respond share the rank after every received
/// result. Order among equals follows participant order.
pub fn rank_results(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| {
        b.received
            .cmp(&a.received)
            .then_with(|| b.score.cmp(&a.score))
    });

    let received: Vec<u32> = results
        .iter()
        .filter(|r| r.received)
        .map(|r| r.score)
        .collect();
    let last_rank = received.len() as u32 + 1;

    for result in results.iter_mut() {
        result.rank = if result.received {
            1 + received.iter().filter(|s| **s > result.score).count() as u32
        } else {
            last_rank
        };
    }
}

/// Classify a ranked result set.
///
/// - Self-test: win iff the answer arrived and scored at least `pass_threshold`.
/// - Sole top rank among received answers: that agent wins, everyone else loses.
/// - Shared top rank: tie, nobody wins or loses.
/// - Nobody answered: no contest.
pub fn resolve_outcome(scenario_id: &str, ranked: &[ScoredResult], pass_threshold: u32) -> Outcome {
    let outcome = |winners: Vec<AgentId>, losers: Vec<AgentId>, kind: OutcomeKind| Outcome {
        scenario_id: scenario_id.to_string(),
        tie: kind == OutcomeKind::Tie,
        winners,
        losers,
        kind,
    };

    if let [only] = ranked {
        return if only.received && only.score >= pass_threshold {
            outcome(vec![only.agent_id.clone()], vec![], OutcomeKind::Decisive)
        } else {
            outcome(vec![], vec![only.agent_id.clone()], OutcomeKind::Decisive)
        };
    }

    let top: Vec<&ScoredResult> = ranked
        .iter()
        .filter(|r| r.received && r.rank == 1)
        .collect();

    match top.as_slice() {
        [] => outcome(vec![], vec![], OutcomeKind::NoContest),
        [winner] => {
            let losers = ranked
                .iter()
                .filter(|r| r.agent_id != winner.agent_id)
                .map(|r| r.agent_id.clone())
                .collect();
            outcome(vec![winner.agent_id.clone()], losers, OutcomeKind::Decisive)
        }
        _ => outcome(vec![], vec![], OutcomeKind::Tie),
    }
}
