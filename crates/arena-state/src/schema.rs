//! SurrealDB row types
//!
//! These mirror the `storage_traits` types with SurrealDB record ids and
//! native datetime encoding, and convert at the backend boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::{
    AgentId, AgentState, ArchivedOutcome, ArchivedScenario, ArchivedScore, LearningEvent,
};

/// Serialize chrono DateTime as a SurrealDB datetime
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Same as `surreal_datetime`, for optional timestamps
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = date.map(SurrealDatetime::from);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Row in the `agent_states` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStateRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub agent_id: String,
    pub difficulty_multiplier: f64,
    pub wins: u64,
    pub losses: u64,
    pub total_games: u64,
    pub xp: u64,
    #[serde(default)]
    pub learning_history: Vec<LearningEvent>,
    pub version: u64,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub last_played_at: Option<DateTime<Utc>>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<&AgentState> for AgentStateRow {
    fn from(state: &AgentState) -> Self {
        Self {
            id: None,
            agent_id: state.agent_id.0.clone(),
            difficulty_multiplier: state.difficulty_multiplier,
            wins: state.wins,
            losses: state.losses,
            total_games: state.total_games,
            xp: state.xp,
            learning_history: state.learning_history.clone(),
            version: state.version,
            created_at: state.created_at,
            updated_at: state.updated_at,
            last_played_at: state.last_played_at,
            archived_at: state.archived_at,
        }
    }
}

impl From<AgentStateRow> for AgentState {
    fn from(row: AgentStateRow) -> Self {
        Self {
            agent_id: AgentId(row.agent_id),
            difficulty_multiplier: row.difficulty_multiplier,
            wins: row.wins,
            losses: row.losses,
            total_games: row.total_games,
            xp: row.xp,
            learning_history: row.learning_history,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_played_at: row.last_played_at,
            archived_at: row.archived_at,
        }
    }
}

/// Row in the `scenarios` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    pub scenario_id: String,
    pub fingerprint: String,
    pub category: String,
    pub variant: String,
    pub ultra_complex: bool,
    pub scenario_difficulty: f64,
    pub participants: Vec<String>,
    pub outcome: ArchivedOutcome,
    pub winners: Vec<String>,
    pub losers: Vec<String>,
    pub scores: Vec<ArchivedScore>,
    #[serde(with = "surreal_datetime")]
    pub archived_at: DateTime<Utc>,
}

fn ids_to_strings(ids: &[AgentId]) -> Vec<String> {
    ids.iter().map(|id| id.0.clone()).collect()
}

fn strings_to_ids(ids: Vec<String>) -> Vec<AgentId> {
    ids.into_iter().map(AgentId).collect()
}

impl From<ArchivedScenario> for ScenarioRow {
    fn from(s: ArchivedScenario) -> Self {
        Self {
            id: None,
            participants: ids_to_strings(&s.participants),
            winners: ids_to_strings(&s.winners),
            losers: ids_to_strings(&s.losers),
            scenario_id: s.scenario_id,
            fingerprint: s.fingerprint,
            category: s.category,
            variant: s.variant,
            ultra_complex: s.ultra_complex,
            scenario_difficulty: s.scenario_difficulty,
            outcome: s.outcome,
            scores: s.scores,
            archived_at: s.archived_at,
        }
    }
}

impl From<ScenarioRow> for ArchivedScenario {
    fn from(row: ScenarioRow) -> Self {
        Self {
            scenario_id: row.scenario_id,
            fingerprint: row.fingerprint,
            category: row.category,
            variant: row.variant,
            ultra_complex: row.ultra_complex,
            scenario_difficulty: row.scenario_difficulty,
            participants: strings_to_ids(row.participants),
            outcome: row.outcome,
            winners: strings_to_ids(row.winners),
            losers: strings_to_ids(row.losers),
            scores: row.scores,
            archived_at: row.archived_at,
        }
    }
}
