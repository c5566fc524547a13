//! Scenario Generator: sizes a base scenario to its participants.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arena_state::{AgentId, AgentStateStore, MULTIPLIER_FLOOR};
use chrono::Utc;
use futures::future::try_join_all;
use tracing::instrument;

use super::templates::{template, variant_objectives};
use crate::domain::{complexity_layers, technical_depth, Category, Scenario, Variant};
use crate::error::{ArenaError, ArenaResult};

/// Mean of the participants' multipliers, floored at 0.5 and never capped.
pub fn scenario_difficulty(multipliers: &[f64]) -> f64 {
    if multipliers.is_empty() {
        return MULTIPLIER_FLOOR;
    }
    let mean = multipliers.iter().sum::<f64>() / multipliers.len() as f64;
    mean.max(MULTIPLIER_FLOOR)
}

/// Scale a duration, keeping at least one millisecond.
pub(crate) fn scale_duration(d: Duration, scale: f64) -> Duration {
    let ms = (d.as_millis() as f64 * scale).round().max(1.0);
    Duration::from_millis(ms as u64)
}

/// Drop duplicate ids (first occurrence wins) and reject empty input.
pub fn normalize_participants(participants: Vec<AgentId>) -> ArenaResult<Vec<AgentId>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(participants.len());
    for id in participants {
        if id.as_str().trim().is_empty() {
            return Err(ArenaError::InvalidScenario(
                "participant id must not be blank".to_string(),
            ));
        }
        if seen.insert(id.clone()) {
            unique.push(id);
        }
    }
    if unique.is_empty() {
        return Err(ArenaError::InvalidScenario(
            "a scenario needs at least one participant".to_string(),
        ));
    }
    Ok(unique)
}

/// Assemble the base scenario for a known difficulty.
pub fn build_scenario(
    participants: Vec<AgentId>,
    category: Category,
    difficulty: f64,
    time_limit_scale: f64,
) -> Scenario {
    let variant = Variant::for_difficulty(difficulty);
    let t = template(category);

    let objectives = t
        .objectives
        .iter()
        .chain(variant_objectives(variant))
        .map(|s| s.to_string())
        .collect();
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    Scenario {
        id: format!("scn-{}", uuid::Uuid::new_v4()),
        participant_ids: participants,
        base_category: category,
        variant,
        scenario_difficulty: difficulty,
        complexity_layers: complexity_layers(difficulty),
        technical_depth: technical_depth(difficulty),
        title: format!("{} ({variant})", t.title),
        description: format!(
            "{} Difficulty {difficulty:.2}, {variant} variant.",
            t.prompt
        ),
        objectives,
        constraints: owned(t.constraints),
        success_criteria: owned(t.success_criteria),
        required_skills: owned(t.skills),
        time_limit_ms: scale_duration(variant.base_time_limit(), time_limit_scale).as_millis()
            as u64,
        xp_reward: variant.xp_reward(),
        ultra_complex: false,
        created_at: Utc::now(),
    }
}

pub struct ScenarioGenerator {
    store: Arc<dyn AgentStateStore>,
    time_limit_scale: f64,
}

impl ScenarioGenerator {
    pub fn new(store: Arc<dyn AgentStateStore>, time_limit_scale: f64) -> Self {
        Self {
            store,
            time_limit_scale,
        }
    }

    /// Snapshot each participant's multiplier and build the base scenario.
    ///
    /// Archived agents are rejected.
    #[instrument(skip(self, participants), fields(category = %category, participants = participants.len()))]
    pub async fn generate(
        &self,
        participants: &[AgentId],
        category: Category,
    ) -> ArenaResult<Scenario> {
        let participants = normalize_participants(participants.to_vec())?;

        let states = try_join_all(participants.iter().map(|id| self.store.get(id))).await?;
        if let Some(archived) = states.iter().find(|s| s.is_archived()) {
            return Err(ArenaError::InvalidScenario(format!(
                "agent {} is archived",
                archived.agent_id
            )));
        }

        let multipliers: Vec<f64> = states.iter().map(|s| s.difficulty_multiplier).collect();
        let difficulty = scenario_difficulty(&multipliers);
        Ok(build_scenario(
            participants,
            category,
            difficulty,
            self.time_limit_scale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_state::{AgentState, MemoryAgentStore};

    #[test]
    fn difficulty_is_the_mean() {
        assert_eq!(scenario_difficulty(&[1.5, 0.75]), 1.125);
        assert_eq!(scenario_difficulty(&[1.0]), 1.0);
    }

    #[test]
    fn difficulty_has_floor_but_no_ceiling() {
        assert_eq!(scenario_difficulty(&[0.5, 0.5]), 0.5);
        assert_eq!(scenario_difficulty(&[40.0, 60.0]), 50.0);
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let ids = normalize_participants(vec!["b".into(), "a".into(), "b".into()]).unwrap();
        assert_eq!(ids, vec![AgentId::from("b"), AgentId::from("a")]);
    }

    #[test]
    fn empty_or_blank_participants_are_invalid() {
        assert!(matches!(
            normalize_participants(vec![]),
            Err(ArenaError::InvalidScenario(_))
        ));
        assert!(normalize_participants(vec![" ".into()]).is_err());
    }

    #[test]
    fn build_sets_band_fields() {
        let s = build_scenario(vec!["a".into()], Category::Security, 2.0, 1.0);
        assert_eq!(s.variant, Variant::Advanced);
        assert_eq!(s.complexity_layers, 1);
        assert_eq!(s.technical_depth, 1);
        assert_eq!(s.time_limit_ms, 15 * 60 * 1000);
        assert_eq!(s.xp_reward, 200);
        assert_eq!(s.objectives.len(), 3 + 2);
        assert!(!s.ultra_complex);
    }

    #[test]
    fn time_limit_scale_shrinks_limits() {
        let s = build_scenario(vec!["a".into()], Category::Knowledge, 1.0, 0.001);
        assert_eq!(s.time_limit_ms, 600);
    }

    #[tokio::test]
    async fn generate_reads_current_multipliers() {
        let store = Arc::new(MemoryAgentStore::new());
        store
            .update(&"a".into(), &|s: &mut AgentState| s.difficulty_multiplier = 1.5)
            .await
            .unwrap();
        store
            .update(&"b".into(), &|s: &mut AgentState| s.difficulty_multiplier = 0.75)
            .await
            .unwrap();

        let generator = ScenarioGenerator::new(store, 1.0);
        let scenario = generator
            .generate(&["a".into(), "b".into()], Category::Performance)
            .await
            .unwrap();
        assert_eq!(scenario.scenario_difficulty, 1.125);
        assert_eq!(scenario.variant, Variant::Intermediate);
    }

    #[tokio::test]
    async fn generate_rejects_archived_agents() {
        let store = Arc::new(MemoryAgentStore::new());
        store.archive(&"retired".into()).await.unwrap();
        let generator = ScenarioGenerator::new(store, 1.0);
        let err = generator
            .generate(&["retired".into()], Category::Knowledge)
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::InvalidScenario(_)));
    }
}
