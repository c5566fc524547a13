//! Structured lifecycle events for scenarios.
//!
//! Each transition emits one `info!` event with an `event` field naming it;
//! recoverable failures are `warn!`. Use [`scenario_span`] to tag everything a
//! scenario logs with its id.

use arena_state::AgentId;
use tracing::{info, warn};

use crate::domain::{OutcomeKind, Scenario};

/// Span carrying the scenario id, for `Instrument::instrument`.
pub fn scenario_span(scenario_id: &str) -> tracing::Span {
    tracing::info_span!("arena.scenario", scenario_id = %scenario_id)
}

pub fn emit_scenario_created(scenario: &Scenario) {
    info!(
        event = "scenario.created",
        scenario_id = %scenario.id,
        category = %scenario.base_category,
        variant = %scenario.variant,
        difficulty = scenario.scenario_difficulty,
        participants = scenario.participant_ids.len(),
    );
}

pub fn emit_scenario_enhanced(scenario: &Scenario) {
    info!(
        event = "scenario.enhanced",
        scenario_id = %scenario.id,
        ultra_complex = scenario.ultra_complex,
        complexity_layers = scenario.complexity_layers,
        technical_depth = scenario.technical_depth,
        objectives = scenario.objectives.len(),
        time_limit_ms = scenario.time_limit_ms,
    );
}

pub fn emit_scenario_dispatched(scenario_id: &str, participants: usize, time_limit_ms: u64) {
    info!(
        event = "scenario.dispatched",
        scenario_id = %scenario_id,
        participants = participants,
        time_limit_ms = time_limit_ms,
    );
}

pub fn emit_scenario_evaluated(scenario_id: &str, received: usize, participants: usize) {
    info!(
        event = "scenario.evaluated",
        scenario_id = %scenario_id,
        received = received,
        participants = participants,
    );
}

pub fn emit_scenario_resolved(scenario_id: &str, kind: OutcomeKind, winners: &[AgentId]) {
    let winners: Vec<&str> = winners.iter().map(|w| w.as_str()).collect();
    info!(
        event = "scenario.resolved",
        scenario_id = %scenario_id,
        outcome = kind.as_str(),
        winners = ?winners,
    );
}

pub fn emit_difficulty_updated(agent_id: &AgentId, won: bool, multiplier: f64, total_games: u64) {
    info!(
        event = "difficulty.updated",
        agent_id = %agent_id,
        won = won,
        multiplier = multiplier,
        total_games = total_games,
    );
}

pub fn emit_learning_dispatched(scenario_id: &str, events: usize) {
    info!(event = "learning.dispatched", scenario_id = %scenario_id, events = events);
}

pub fn emit_scenario_archived(scenario_id: &str, fingerprint: &str) {
    info!(
        event = "scenario.archived",
        scenario_id = %scenario_id,
        fingerprint = %fingerprint,
    );
}

pub fn emit_agent_timeout(scenario_id: &str, agent_id: &AgentId, limit_ms: u64) {
    warn!(
        event = "agent.timeout",
        scenario_id = %scenario_id,
        agent_id = %agent_id,
        limit_ms = limit_ms,
    );
}

pub fn emit_responder_failed(scenario_id: &str, agent_id: &AgentId, error: &dyn std::fmt::Display) {
    warn!(
        event = "agent.responder_failed",
        scenario_id = %scenario_id,
        agent_id = %agent_id,
        error = %error,
    );
}

pub fn emit_scorer_fallback(
    scenario_id: &str,
    agent_id: &AgentId,
    fallback_score: u32,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "scorer.fallback",
        scenario_id = %scenario_id,
        agent_id = %agent_id,
        fallback_score = fallback_score,
        error = %error,
    );
}

pub fn emit_persistence_retry(
    agent_id: &AgentId,
    attempt: u32,
    delay_ms: u64,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "persistence.retry",
        agent_id = %agent_id,
        attempt = attempt,
        delay_ms = delay_ms,
        error = %error,
    );
}

pub fn emit_sink_publish_failed(agent_id: &AgentId, error: &dyn std::fmt::Display) {
    warn!(event = "sink.publish_failed", agent_id = %agent_id, error = %error);
}

pub fn emit_archive_failed(scenario_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "scenario.archive_failed", scenario_id = %scenario_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_emit_inside_scenario_span() {
        let span = scenario_span("scn-1");
        let _entered = span.enter();
        emit_scenario_dispatched("scn-1", 2, 1000);
        emit_agent_timeout("scn-1", &AgentId::from("slow"), 1000);
        emit_sink_publish_failed(&AgentId::from("slow"), &"sink offline");
    }
}
