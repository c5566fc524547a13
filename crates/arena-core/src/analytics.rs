//! Summaries over the scenario archive.

use std::collections::BTreeMap;

use arena_state::{AgentId, ArchivedOutcome, ArchivedScenario};
use serde::{Deserialize, Serialize};

/// One agent's record across archived scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub scenarios: u64,
    /// Scenarios that changed state (not ties or no-contests).
    pub decided: u64,
    pub wins: u64,
    pub losses: u64,
    pub average_score: f64,
    /// `wins / decided`, `0.0` when nothing was decided.
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_scenarios: usize,
    pub ties: usize,
    pub no_contests: usize,
    pub ultra_complex: usize,
    pub average_difficulty: f64,
    pub by_category: BTreeMap<String, usize>,
    pub by_variant: BTreeMap<String, usize>,
    pub agents: BTreeMap<AgentId, AgentSummary>,
    /// Newest first.
    pub recent: Vec<ArchivedScenario>,
}

#[derive(Default)]
struct Tally {
    summary: AgentSummary,
    score_sum: u64,
}

/// Summarise `all` archived scenarios and attach `recent` as given.
pub fn summarize(all: &[ArchivedScenario], recent: Vec<ArchivedScenario>) -> Analytics {
    let mut analytics = Analytics {
        total_scenarios: all.len(),
        recent,
        ..Analytics::default()
    };
    let mut tallies: BTreeMap<AgentId, Tally> = BTreeMap::new();
    let mut difficulty_sum = 0.0;

    for scenario in all {
        match scenario.outcome {
            ArchivedOutcome::Tie => analytics.ties += 1,
            ArchivedOutcome::NoContest => analytics.no_contests += 1,
            ArchivedOutcome::Decisive => {}
        }
        if scenario.ultra_complex {
            analytics.ultra_complex += 1;
        }
        difficulty_sum += scenario.scenario_difficulty;
        *analytics
            .by_category
            .entry(scenario.category.clone())
            .or_default() += 1;
        *analytics
            .by_variant
            .entry(scenario.variant.clone())
            .or_default() += 1;

        for line in &scenario.scores {
            let tally = tallies.entry(line.agent_id.clone()).or_default();
            tally.summary.scenarios += 1;
            tally.score_sum += u64::from(line.score);
            if scenario.outcome == ArchivedOutcome::Decisive {
                tally.summary.decided += 1;
                if scenario.winners.contains(&line.agent_id) {
                    tally.summary.wins += 1;
                } else if scenario.losers.contains(&line.agent_id) {
                    tally.summary.losses += 1;
                }
            }
        }
    }

    if !all.is_empty() {
        analytics.average_difficulty = difficulty_sum / all.len() as f64;
    }
    analytics.agents = tallies
        .into_iter()
        .map(|(agent_id, tally)| {
            let mut summary = tally.summary;
            summary.average_score = tally.score_sum as f64 / summary.scenarios as f64;
            if summary.decided > 0 {
                summary.win_rate = summary.wins as f64 / summary.decided as f64;
            }
            (agent_id, summary)
        })
        .collect();
    analytics
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_state::ArchivedScore;
    use chrono::Utc;

    fn archived(
        id: &str,
        category: &str,
        outcome: ArchivedOutcome,
        winner: Option<&str>,
        scores: &[(&str, u32)],
    ) -> ArchivedScenario {
        let participants: Vec<AgentId> = scores.iter().map(|(a, _)| AgentId::from(*a)).collect();
        let winners: Vec<AgentId> = winner.map(AgentId::from).into_iter().collect();
        let losers = if outcome == ArchivedOutcome::Decisive {
            participants
                .iter()
                .filter(|p| !winners.contains(p))
                .cloned()
                .collect()
        } else {
            vec![]
        };
        ArchivedScenario {
            scenario_id: id.to_string(),
            fingerprint: format!("fp-{id}"),
            category: category.to_string(),
            variant: "intermediate".to_string(),
            ultra_complex: false,
            scenario_difficulty: 1.0,
            participants,
            outcome,
            winners,
            losers,
            scores: scores
                .iter()
                .enumerate()
                .map(|(i, (a, s))| ArchivedScore {
                    agent_id: AgentId::from(*a),
                    received: true,
                    score: *s,
                    rank: i as u32 + 1,
                    latency_ms: 5,
                })
                .collect(),
            archived_at: Utc::now(),
        }
    }

    #[test]
    fn empty_archive_summarises_to_zero() {
        let analytics = summarize(&[], vec![]);
        assert_eq!(analytics.total_scenarios, 0);
        assert_eq!(analytics.average_difficulty, 0.0);
        assert!(analytics.agents.is_empty());
    }

    #[test]
    fn per_agent_rates_ignore_ties() {
        let all = vec![
            archived("s1", "security", ArchivedOutcome::Decisive, Some("a"), &[("a", 90), ("b", 40)]),
            archived("s2", "security", ArchivedOutcome::Tie, None, &[("a", 70), ("b", 70)]),
            archived("s3", "knowledge", ArchivedOutcome::Decisive, Some("b"), &[("b", 80), ("a", 60)]),
        ];

        let analytics = summarize(&all, vec![all[2].clone()]);
        assert_eq!(analytics.total_scenarios, 3);
        assert_eq!(analytics.ties, 1);
        assert_eq!(analytics.by_category["security"], 2);
        assert_eq!(analytics.by_category["knowledge"], 1);
        assert_eq!(analytics.by_variant["intermediate"], 3);

        let a = &analytics.agents[&AgentId::from("a")];
        assert_eq!((a.scenarios, a.decided, a.wins, a.losses), (3, 2, 1, 1));
        assert_eq!(a.win_rate, 0.5);
        assert!((a.average_score - 220.0 / 3.0).abs() < 1e-9);
        assert_eq!(analytics.recent[0].scenario_id, "s3");
    }
}
