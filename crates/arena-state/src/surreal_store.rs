//! SurrealDB-backed `AgentStateStore` and `ScenarioArchive`
//!
//! Agent updates use optimistic concurrency: the row is rewritten only if its
//! `version` still matches what the mutation was computed from. A lost race
//! surfaces as `StorageError::Conflict` and the caller retries.

use async_trait::async_trait;
use chrono::Utc;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::{AgentStateRow, ScenarioRow};
use crate::storage_traits::{
    AgentId, AgentState, AgentStateStore, ArchivedScenario, ScenarioArchive, StateMutation,
    StorageResult,
};

fn backend(e: surrealdb::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// Transaction conflicts from the KV layer are retryable like a version miss.
fn classify(e: surrealdb::Error, agent_id: &AgentId, expected_version: u64) -> StorageError {
    let msg = e.to_string();
    if msg.to_ascii_lowercase().contains("conflict") {
        StorageError::Conflict {
            agent_id: agent_id.0.clone(),
            expected_version,
        }
    } else {
        StorageError::Backend(msg)
    }
}

/// SurrealDB-backed implementation of [`AgentStateStore`].
#[derive(Clone)]
pub struct SurrealAgentStore {
    db: Surreal<Any>,
}

impl SurrealAgentStore {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    async fn fetch(&self, agent_id: &AgentId) -> StorageResult<Option<AgentStateRow>> {
        let aid = agent_id.0.clone();
        let mut res = self
            .db
            .query("SELECT * FROM agent_states WHERE agent_id = $aid")
            .bind(("aid", aid))
            .await
            .map_err(backend)?;

        let rows: Vec<AgentStateRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().next())
    }

    /// Write `next` only if the stored row is still at `expected_version`.
    ///
    /// On success the committed state (with `version = expected_version + 1`)
    /// is returned.
    pub async fn compare_and_swap(
        &self,
        expected_version: u64,
        mut next: AgentState,
    ) -> StorageResult<AgentState> {
        next.version = expected_version + 1;
        next.updated_at = Utc::now();
        next.validate()?;

        let agent_id = next.agent_id.clone();
        let row = AgentStateRow::from(&next);

        let mut res = self
            .db
            .query(
                "UPDATE agent_states CONTENT $row \
                 WHERE agent_id = $aid AND version = $expected",
            )
            .bind(("row", row))
            .bind(("aid", agent_id.0.clone()))
            .bind(("expected", expected_version))
            .await
            .map_err(|e| classify(e, &agent_id, expected_version))?;

        let rows: Vec<AgentStateRow> = res
            .take(0)
            .map_err(|e| classify(e, &agent_id, expected_version))?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.into()),
            None => {
                debug!(agent_id = %agent_id, expected_version, "agent state version conflict");
                Err(StorageError::Conflict {
                    agent_id: agent_id.0,
                    expected_version,
                })
            }
        }
    }
}

#[async_trait]
impl AgentStateStore for SurrealAgentStore {
    async fn get(&self, agent_id: &AgentId) -> StorageResult<AgentState> {
        if let Some(row) = self.fetch(agent_id).await? {
            return Ok(row.into());
        }

        let fresh = AgentState::new(agent_id.clone());
        let created: StorageResult<Option<AgentStateRow>> = self
            .db
            .create("agent_states")
            .content(AgentStateRow::from(&fresh))
            .await
            .map_err(backend);

        match created {
            Ok(_) => {
                debug!(agent_id = %agent_id, "created agent state");
                Ok(fresh)
            }
            // Lost a create race against the unique index: the winner's row is there now.
            Err(err) => match self.fetch(agent_id).await? {
                Some(row) => Ok(row.into()),
                None => Err(err),
            },
        }
    }

    async fn update(
        &self,
        agent_id: &AgentId,
        mutate: StateMutation<'_>,
    ) -> StorageResult<AgentState> {
        let current = self.get(agent_id).await?;
        let mut next = current.clone();
        mutate(&mut next);
        next.agent_id = agent_id.clone();
        self.compare_and_swap(current.version, next).await
    }

    async fn list(&self) -> StorageResult<Vec<AgentState>> {
        let mut res = self
            .db
            .query("SELECT * FROM agent_states ORDER BY agent_id ASC")
            .await
            .map_err(backend)?;
        let rows: Vec<AgentStateRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(AgentState::from).collect())
    }
}

/// SurrealDB-backed implementation of [`ScenarioArchive`].
#[derive(Clone)]
pub struct SurrealScenarioArchive {
    db: Surreal<Any>,
}

impl SurrealScenarioArchive {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    async fn fetch(&self, scenario_id: &str) -> StorageResult<Option<ScenarioRow>> {
        let sid = scenario_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM scenarios WHERE scenario_id = $sid")
            .bind(("sid", sid))
            .await
            .map_err(backend)?;
        let rows: Vec<ScenarioRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().next())
    }

    async fn select(&self, sql: String) -> StorageResult<Vec<ArchivedScenario>> {
        let mut res = self.db.query(sql).await.map_err(backend)?;
        let rows: Vec<ScenarioRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(ArchivedScenario::from).collect())
    }
}

#[async_trait]
impl ScenarioArchive for SurrealScenarioArchive {
    async fn record(&self, scenario: ArchivedScenario) -> StorageResult<()> {
        let scenario_id = scenario.scenario_id.clone();
        if self.fetch(&scenario_id).await?.is_some() {
            return Err(StorageError::DuplicateScenario { scenario_id });
        }

        debug!(scenario_id = %scenario_id, "archiving scenario");
        let created: Result<Option<ScenarioRow>, surrealdb::Error> = self
            .db
            .create("scenarios")
            .content(ScenarioRow::from(scenario))
            .await;

        match created {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already contains") => {
                Err(StorageError::DuplicateScenario { scenario_id })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn get(&self, scenario_id: &str) -> StorageResult<ArchivedScenario> {
        self.fetch(scenario_id)
            .await?
            .map(ArchivedScenario::from)
            .ok_or_else(|| StorageError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            })
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<ArchivedScenario>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.select(format!(
            "SELECT * FROM scenarios ORDER BY archived_at DESC LIMIT {limit}"
        ))
        .await
    }

    async fn all(&self) -> StorageResult<Vec<ArchivedScenario>> {
        self.select("SELECT * FROM scenarios ORDER BY archived_at ASC".to_string())
            .await
    }
}
