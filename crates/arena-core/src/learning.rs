//! Learning Dispatcher: victory/defeat lessons for every decided scenario.
//!
//! Events are appended to each agent's history in one atomic update per
//! agent, then handed to the [`LearningSink`] on a detached task. A sink
//! failure is logged and counted; it never undoes the history append or the
//! difficulty change that preceded it.

use std::sync::Arc;

use arena_state::{AgentId, AgentState, AgentStateStore, LearningEvent, LearningKind};
use chrono::Utc;
use futures::future::join_all;
use tracing::instrument;

use crate::adapters::LearningSink;
use crate::config::PersistenceConfig;
use crate::domain::{Outcome, Scenario, ScoredResult};
use crate::error::ArenaResult;
use crate::metrics::METRICS;
use crate::obs;
use crate::persist::{update_with_retry, PersistBatch};

const VICTORY_LESSONS: [&str; 3] = [
    "Reinforce successful strategies",
    "Maintain high performance standards",
    "Continue innovative approaches",
];

/// Derive one event per winner and loser, winners first.
///
/// Ties and no-contests produce nothing.
pub fn build_events(
    scenario: &Scenario,
    outcome: &Outcome,
    results: &[ScoredResult],
) -> Vec<LearningEvent> {
    if !outcome.changes_state() {
        return Vec::new();
    }
    let created_at = Utc::now();
    let reference = outcome.winner().cloned();

    let winners = outcome.winners.iter().map(|id| (id, LearningKind::Victory));
    let losers = outcome.losers.iter().map(|id| (id, LearningKind::Defeat));

    winners
        .chain(losers)
        .map(|(agent_id, kind)| {
            let result = results.iter().find(|r| &r.agent_id == agent_id);
            let lessons = match kind {
                LearningKind::Victory => victory_lessons(result),
                LearningKind::Defeat => defeat_lessons(scenario, reference.as_ref(), result),
            };
            LearningEvent {
                agent_id: agent_id.clone(),
                kind,
                scenario_id: scenario.id.clone(),
                score: result.map(|r| r.score).unwrap_or(0),
                lessons,
                reference_winner_id: match kind {
                    LearningKind::Defeat => reference.clone(),
                    LearningKind::Victory => None,
                },
                created_at,
            }
        })
        .collect()
}

fn victory_lessons(result: Option<&ScoredResult>) -> Vec<String> {
    let mut lessons: Vec<String> = VICTORY_LESSONS.iter().map(|s| s.to_string()).collect();
    lessons.extend(feedback_lesson(result));
    lessons
}

fn defeat_lessons(
    scenario: &Scenario,
    winner: Option<&AgentId>,
    result: Option<&ScoredResult>,
) -> Vec<String> {
    let mut lessons = vec!["Analyze what went wrong".to_string()];
    match winner {
        Some(winner) => lessons.push(format!("Study {winner}'s winning strategy")),
        None => lessons.push(match scenario.success_criteria.first() {
            Some(criterion) => format!("Meet the success criteria: {criterion}"),
            None => "Review the scenario's success criteria".to_string(),
        }),
    }
    lessons.push(format!("Improve weak areas in {}", scenario.base_category));
    lessons.push("Adapt to new challenges".to_string());

    if result.is_some_and(|r| !r.received) {
        lessons.push(format!(
            "Respond within the {}ms time limit",
            scenario.time_limit_ms
        ));
    }
    lessons.extend(feedback_lesson(result));
    lessons
}

fn feedback_lesson(result: Option<&ScoredResult>) -> Option<String> {
    result
        .filter(|r| r.received && !r.scorer_fallback && !r.feedback.trim().is_empty())
        .map(|r| format!("Scorer feedback: {}", r.feedback.trim()))
}

pub struct LearningDispatcher {
    store: Arc<dyn AgentStateStore>,
    sink: Arc<dyn LearningSink>,
    retention: usize,
    persistence: PersistenceConfig,
}

impl LearningDispatcher {
    pub fn new(
        store: Arc<dyn AgentStateStore>,
        sink: Arc<dyn LearningSink>,
        retention: usize,
        persistence: PersistenceConfig,
    ) -> Self {
        Self {
            store,
            sink,
            retention,
            persistence,
        }
    }

    /// Append each agent's event to its history and forward it to the sink.
    #[instrument(skip_all, fields(scenario_id = %outcome.scenario_id))]
    pub async fn dispatch(
        &self,
        scenario: &Scenario,
        outcome: &Outcome,
        results: &[ScoredResult],
    ) -> PersistBatch<LearningEvent> {
        let events = build_events(scenario, outcome, results);
        let appends = events.into_iter().map(|event| self.append(event));

        let mut batch = PersistBatch {
            committed: Vec::new(),
            failed: Vec::new(),
        };
        for (event, result) in join_all(appends).await {
            match result {
                Ok(_) => {
                    self.forward(event.clone());
                    batch.committed.push(event);
                }
                Err(e) => batch.failed.push((event.agent_id, e)),
            }
        }

        obs::emit_learning_dispatched(&outcome.scenario_id, batch.committed.len());
        batch
    }

    async fn append(&self, event: LearningEvent) -> (LearningEvent, ArenaResult<AgentState>) {
        let retention = self.retention;
        let mutate = |s: &mut AgentState| s.push_learning(event.clone(), retention);
        let result = update_with_retry(
            self.store.as_ref(),
            &event.agent_id,
            &self.persistence,
            &mutate,
        )
        .await;
        (event, result)
    }

    fn forward(&self, event: LearningEvent) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.publish(&event).await {
                obs::emit_sink_publish_failed(&event.agent_id, &e);
                METRICS.inc_sink_failures();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fakes::{ChannelSink, FailingSink};
    use crate::domain::scenario::sample_scenario;
    use crate::domain::OutcomeKind;
    use arena_state::MemoryAgentStore;

    fn scored(agent: &str, score: u32, received: bool, feedback: &str) -> ScoredResult {
        ScoredResult {
            scenario_id: "scn".into(),
            agent_id: agent.into(),
            score,
            feedback: feedback.to_string(),
            rank: 0,
            received,
            latency_ms: 0,
            scorer_fallback: false,
        }
    }

    fn a_beats_b(scenario: &Scenario) -> Outcome {
        Outcome {
            scenario_id: scenario.id.clone(),
            winners: vec!["a".into()],
            losers: vec!["b".into()],
            tie: false,
            kind: OutcomeKind::Decisive,
        }
    }

    #[test]
    fn defeat_references_the_winner() {
        let scenario = sample_scenario();
        let results = vec![scored("a", 90, true, "solid"), scored("b", 10, true, "")];

        let events = build_events(&scenario, &a_beats_b(&scenario), &results);
        assert_eq!(events.len(), 2);

        let victory = &events[0];
        assert_eq!(victory.kind, LearningKind::Victory);
        assert_eq!(victory.reference_winner_id, None);
        assert_eq!(victory.lessons[0], "Reinforce successful strategies");
        assert_eq!(victory.lessons.last().unwrap(), "Scorer feedback: solid");

        let defeat = &events[1];
        assert_eq!(defeat.kind, LearningKind::Defeat);
        assert_eq!(defeat.reference_winner_id, Some(AgentId::from("a")));
        assert!(defeat.lessons.contains(&"Study a's winning strategy".to_string()));
        assert_eq!(defeat.score, 10);
    }

    #[test]
    fn timed_out_loser_is_told_about_the_limit() {
        let scenario = sample_scenario();
        let results = vec![scored("a", 90, true, ""), scored("b", 0, false, "timeout")];

        let events = build_events(&scenario, &a_beats_b(&scenario), &results);
        assert!(events[1]
            .lessons
            .iter()
            .any(|l| l.starts_with("Respond within")));
        assert!(!events[1].lessons.iter().any(|l| l.contains("timeout")));
    }

    #[test]
    fn failed_self_test_points_at_success_criteria() {
        let mut scenario = sample_scenario();
        scenario.participant_ids.truncate(1);
        let outcome = Outcome {
            scenario_id: scenario.id.clone(),
            winners: vec![],
            losers: vec!["a".into()],
            tie: false,
            kind: OutcomeKind::Decisive,
        };

        let events = build_events(&scenario, &outcome, &[scored("a", 20, true, "")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reference_winner_id, None);
        assert!(events[0].lessons[1].starts_with("Meet the success criteria"));
    }

    #[test]
    fn tie_produces_no_events() {
        let scenario = sample_scenario();
        let outcome = Outcome {
            scenario_id: scenario.id.clone(),
            winners: vec![],
            losers: vec![],
            tie: true,
            kind: OutcomeKind::Tie,
        };
        assert!(build_events(&scenario, &outcome, &[]).is_empty());
    }

    #[tokio::test]
    async fn dispatch_appends_history_and_publishes() {
        let store: Arc<dyn AgentStateStore> = Arc::new(MemoryAgentStore::new());
        let (sink, mut rx) = ChannelSink::channel();
        let dispatcher = LearningDispatcher::new(
            Arc::clone(&store),
            Arc::new(sink),
            500,
            PersistenceConfig::default(),
        );
        let scenario = sample_scenario();
        let results = vec![scored("a", 90, true, ""), scored("b", 10, true, "")];

        let batch = dispatcher
            .dispatch(&scenario, &a_beats_b(&scenario), &results)
            .await;
        assert!(batch.is_complete());
        assert_eq!(batch.committed.len(), 2);

        let b = store.get(&"b".into()).await.unwrap();
        assert_eq!(b.learning_history.len(), 1);
        assert_eq!(b.learning_history[0].kind, LearningKind::Defeat);

        let mut published = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        published.sort_by(|x, y| x.agent_id.cmp(&y.agent_id));
        assert_eq!(published[0].agent_id, AgentId::from("a"));
        assert_eq!(published[1].agent_id, AgentId::from("b"));
    }

    #[tokio::test]
    async fn sink_failure_keeps_history() {
        let store: Arc<dyn AgentStateStore> = Arc::new(MemoryAgentStore::new());
        let dispatcher = LearningDispatcher::new(
            Arc::clone(&store),
            Arc::new(FailingSink),
            500,
            PersistenceConfig::default(),
        );
        let scenario = sample_scenario();
        let results = vec![scored("a", 90, true, ""), scored("b", 10, true, "")];

        let batch = dispatcher
            .dispatch(&scenario, &a_beats_b(&scenario), &results)
            .await;
        assert!(batch.is_complete());
        tokio::task::yield_now().await;

        let a = store.get(&"a".into()).await.unwrap();
        assert_eq!(a.learning_history.len(), 1);
    }

    #[tokio::test]
    async fn history_is_trimmed_to_retention() {
        let store: Arc<dyn AgentStateStore> = Arc::new(MemoryAgentStore::new());
        let dispatcher = LearningDispatcher::new(
            Arc::clone(&store),
            Arc::new(crate::adapters::NullSink),
            2,
            PersistenceConfig::default(),
        );
        let results = vec![scored("a", 90, true, ""), scored("b", 10, true, "")];
        let mut ids = Vec::new();
        for _ in 0..3 {
            let scenario = crate::scenario::build_scenario(
                vec!["a".into(), "b".into()],
                crate::domain::Category::Knowledge,
                1.0,
                1.0,
            );
            ids.push(scenario.id.clone());
            dispatcher
                .dispatch(&scenario, &a_beats_b(&scenario), &results)
                .await;
        }

        let a = store.get(&"a".into()).await.unwrap();
        let kept: Vec<&str> = a
            .learning_history
            .iter()
            .map(|e| e.scenario_id.as_str())
            .collect();
        assert_eq!(kept, vec![ids[1].as_str(), ids[2].as_str()]);
    }
}
