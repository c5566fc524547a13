//! Scenario: one generated challenge dispatched to one or more agents.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use arena_state::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ArenaError;

/// Base category a scenario is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Knowledge,
    CodeQuality,
    Security,
    Performance,
    Innovation,
    SelfImprovement,
    Collaboration,
    Experimental,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Knowledge,
        Category::CodeQuality,
        Category::Security,
        Category::Performance,
        Category::Innovation,
        Category::SelfImprovement,
        Category::Collaboration,
        Category::Experimental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Knowledge => "knowledge",
            Category::CodeQuality => "code_quality",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Innovation => "innovation",
            Category::SelfImprovement => "self_improvement",
            Category::Collaboration => "collaboration",
            Category::Experimental => "experimental",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ArenaError::InvalidScenario(format!("unknown category: {s}")))
    }
}

/// Progressive variant of a category template, selected by difficulty band.
///
/// Bands are open-ended at the top: every difficulty at or above 6.0 selects
/// `Legendary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Basic,
    Intermediate,
    Advanced,
    Expert,
    Master,
    Legendary,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::Basic,
        Variant::Intermediate,
        Variant::Advanced,
        Variant::Expert,
        Variant::Master,
        Variant::Legendary,
    ];

    pub fn for_difficulty(difficulty: f64) -> Self {
        match difficulty {
            d if d < 1.0 => Variant::Basic,
            d if d < 1.5 => Variant::Intermediate,
            d if d < 2.5 => Variant::Advanced,
            d if d < 4.0 => Variant::Expert,
            d if d < 6.0 => Variant::Master,
            _ => Variant::Legendary,
        }
    }

    /// Zero-based position in the band order.
    pub fn level(&self) -> usize {
        *self as usize
    }

    pub fn base_time_limit(&self) -> Duration {
        let minutes = match self {
            Variant::Basic => 5,
            Variant::Intermediate => 10,
            Variant::Advanced => 15,
            Variant::Expert => 20,
            Variant::Master => 30,
            Variant::Legendary => 60,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn xp_reward(&self) -> u64 {
        50 << self.level()
    }

    pub fn winner_bonus(&self) -> u64 {
        25 << self.level()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Basic => "basic",
            Variant::Intermediate => "intermediate",
            Variant::Advanced => "advanced",
            Variant::Expert => "expert",
            Variant::Master => "master",
            Variant::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `max(1, floor(d / 2))`
pub fn complexity_layers(scenario_difficulty: f64) -> u32 {
    ((scenario_difficulty / 2.0).floor() as u32).max(1)
}

/// `max(1, floor(d / 1.5))`
pub fn technical_depth(scenario_difficulty: f64) -> u32 {
    ((scenario_difficulty / 1.5).floor() as u32).max(1)
}

/// A generated challenge. Immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub participant_ids: Vec<AgentId>,
    pub base_category: Category,
    pub variant: Variant,
    pub scenario_difficulty: f64,
    pub complexity_layers: u32,
    pub technical_depth: u32,
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub constraints: Vec<String>,
    pub success_criteria: Vec<String>,
    pub required_skills: Vec<String>,
    pub time_limit_ms: u64,
    pub xp_reward: u64,
    pub ultra_complex: bool,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn is_self_test(&self) -> bool {
        self.participant_ids.len() == 1
    }

    /// SHA-256 hex digest of the scenario content.
    ///
    /// Covers everything an agent is asked to do; excludes the id and
    /// creation time so identical challenges share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let content = serde_json::json!({
            "participants": self.participant_ids,
            "category": self.base_category,
            "variant": self.variant,
            "difficulty": self.scenario_difficulty,
            "complexity_layers": self.complexity_layers,
            "technical_depth": self.technical_depth,
            "title": self.title,
            "description": self.description,
            "objectives": self.objectives,
            "constraints": self.constraints,
            "success_criteria": self.success_criteria,
            "required_skills": self.required_skills,
            "time_limit_ms": self.time_limit_ms,
        });
        let mut hasher = Sha256::new();
        hasher.update(content.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Two-participant basic scenario for unit tests.
#[cfg(test)]
pub(crate) fn sample_scenario() -> Scenario {
    Scenario {
        id: "scn-test".to_string(),
        participant_ids: vec![AgentId::from("a"), AgentId::from("b")],
        base_category: Category::CodeQuality,
        variant: Variant::Intermediate,
        scenario_difficulty: 1.0,
        complexity_layers: 1,
        technical_depth: 1,
        title: "Refactor a payment module".to_string(),
        description: "Review and refactor a legacy payment module.".to_string(),
        objectives: vec![
            "Identify duplicated validation logic".to_string(),
            "Introduce unit tests covering refunds".to_string(),
        ],
        constraints: vec!["Keep the public interface stable".to_string()],
        success_criteria: vec!["All existing behaviour preserved".to_string()],
        required_skills: vec!["Refactoring".to_string()],
        time_limit_ms: 1_000,
        xp_reward: 100,
        ultra_complex: false,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_open_ended() {
        assert_eq!(Variant::for_difficulty(0.5), Variant::Basic);
        assert_eq!(Variant::for_difficulty(1.0), Variant::Intermediate);
        assert_eq!(Variant::for_difficulty(1.49), Variant::Intermediate);
        assert_eq!(Variant::for_difficulty(2.5), Variant::Expert);
        assert_eq!(Variant::for_difficulty(5.99), Variant::Master);
        assert_eq!(Variant::for_difficulty(6.0), Variant::Legendary);
        assert_eq!(Variant::for_difficulty(250.0), Variant::Legendary);
    }

    #[test]
    fn rewards_double_per_band() {
        let xp: Vec<u64> = Variant::ALL.iter().map(|v| v.xp_reward()).collect();
        assert_eq!(xp, vec![50, 100, 200, 400, 800, 1600]);
        let bonus: Vec<u64> = Variant::ALL.iter().map(|v| v.winner_bonus()).collect();
        assert_eq!(bonus, vec![25, 50, 100, 200, 400, 800]);
    }

    #[test]
    fn time_limits_by_band() {
        assert_eq!(Variant::Basic.base_time_limit(), Duration::from_secs(300));
        assert_eq!(Variant::Legendary.base_time_limit(), Duration::from_secs(3600));
    }

    #[test]
    fn layers_and_depth_follow_floors() {
        assert_eq!(complexity_layers(1.0), 1);
        assert_eq!(technical_depth(1.0), 1);
        assert_eq!(complexity_layers(3.0), 1);
        assert_eq!(technical_depth(3.0), 2);
        assert_eq!(complexity_layers(3.5), 1);
        assert_eq!(technical_depth(3.5), 2);
        assert_eq!(complexity_layers(9.0), 4);
        assert_eq!(technical_depth(9.0), 6);
    }

    #[test]
    fn fingerprint_ignores_id_and_timestamp() {
        let a = sample_scenario();
        let mut b = a.clone();
        b.id = "scn-other".to_string();
        b.created_at = a.created_at + chrono::Duration::seconds(5);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.objectives.push("Document the rollback plan".to_string());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn category_parses_dashed_and_snake_forms() {
        assert_eq!("code-quality".parse::<Category>().unwrap(), Category::CodeQuality);
        assert_eq!("self_improvement".parse::<Category>().unwrap(), Category::SelfImprovement);
        assert!("cooking".parse::<Category>().is_err());
    }
}
