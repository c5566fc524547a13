//! Test cycles: one scenario per category for a fixed set of participants.

use std::collections::BTreeMap;

use arena_state::AgentId;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Outcome, ScoredResult};

/// Average score at or above which an agent passes a cycle.
pub const PASSING_AVERAGE: f64 = 70.0;

/// One category's result within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEntry {
    pub category: Category,
    pub scenario_id: String,
    pub outcome: Outcome,
    pub results: Vec<ScoredResult>,
    /// Set when the outcome was computed but could not be persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub participants: Vec<AgentId>,
    pub entries: Vec<CycleEntry>,
    pub average_scores: BTreeMap<AgentId, f64>,
    pub passing_agents: Vec<AgentId>,
    pub failed: usize,
}

impl CycleSummary {
    pub fn from_entries(participants: Vec<AgentId>, entries: Vec<CycleEntry>) -> Self {
        let mut sums: BTreeMap<AgentId, (u64, u64)> = BTreeMap::new();
        for result in entries.iter().flat_map(|e| &e.results) {
            let (sum, count) = sums.entry(result.agent_id.clone()).or_default();
            *sum += u64::from(result.score);
            *count += 1;
        }

        let average_scores: BTreeMap<AgentId, f64> = sums
            .into_iter()
            .map(|(agent, (sum, count))| (agent, sum as f64 / count as f64))
            .collect();
        let passing_agents = participants
            .iter()
            .filter(|p| average_scores.get(*p).is_some_and(|avg| *avg >= PASSING_AVERAGE))
            .cloned()
            .collect();
        let failed = entries.iter().filter(|e| e.error.is_some()).count();

        Self {
            participants,
            entries,
            average_scores,
            passing_agents,
            failed,
        }
    }
}
