//! SurrealDB schema initialization

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Define all Arena tables. Idempotent.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Arena SurrealDB schema");

    init_agent_states_table(db).await?;
    init_scenarios_table(db).await?;

    info!("Arena schema initialization complete");
    Ok(())
}

/// `agent_states`: one row per agent, rewritten by compare-and-swap on
/// `version`.
///
/// ```text
/// TABLE agent_states {
///   agent_id:              STRING (unique)
///   difficulty_multiplier: FLOAT (>= 0.5, enforced in app logic)
///   wins, losses, total_games, xp, version: INT
///   learning_history:      ARRAY<OBJECT>
///   created_at, updated_at: DATETIME
///   last_played_at, archived_at: DATETIME?
/// }
/// ```
async fn init_agent_states_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing agent_states table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS agent_states SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_agent_id ON TABLE agent_states COLUMNS agent_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_agent_version ON TABLE agent_states COLUMNS agent_id, version;
    "#;

    db.query(sql).await?.check()?;
    Ok(())
}

/// `scenarios`: append-only archive of resolved scenarios.
async fn init_scenarios_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing scenarios table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS scenarios SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_scenario_id ON TABLE scenarios COLUMNS scenario_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_archived_at ON TABLE scenarios COLUMNS archived_at;
        DEFINE INDEX IF NOT EXISTS idx_category ON TABLE scenarios COLUMNS category;
    "#;

    db.query(sql).await?.check()?;
    Ok(())
}
