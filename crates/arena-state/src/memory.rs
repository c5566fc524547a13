//! In-process storage backends
//!
//! `MemoryAgentStore` and `MemoryScenarioArchive` satisfy the trait contracts
//! without any external dependencies. Used by tests and by `--memory` runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryAgentStore
// ---------------------------------------------------------------------------

/// Agent store backed by one async mutex per agent.
///
/// The outer map lock is held only to look up or insert an agent's slot, so
/// updates to different agents never wait on each other and updates to the
/// same agent are serialized without conflicts.
#[derive(Debug, Default)]
pub struct MemoryAgentStore {
    agents: RwLock<BTreeMap<AgentId, Arc<tokio::sync::Mutex<AgentState>>>>,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, agent_id: &AgentId) -> Arc<tokio::sync::Mutex<AgentState>> {
        {
            let agents = self.agents.read().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = agents.get(agent_id) {
                return Arc::clone(slot);
            }
        }
        let mut agents = self.agents.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(agents.entry(agent_id.clone()).or_insert_with(|| {
            Arc::new(tokio::sync::Mutex::new(AgentState::new(agent_id.clone())))
        }))
    }
}

#[async_trait]
impl AgentStateStore for MemoryAgentStore {
    async fn get(&self, agent_id: &AgentId) -> StorageResult<AgentState> {
        let slot = self.slot(agent_id);
        let state = slot.lock().await;
        Ok(state.clone())
    }

    async fn update(
        &self,
        agent_id: &AgentId,
        mutate: StateMutation<'_>,
    ) -> StorageResult<AgentState> {
        let slot = self.slot(agent_id);
        let mut current = slot.lock().await;

        let mut next = current.clone();
        mutate(&mut next);
        next.agent_id = agent_id.clone();
        next.version = current.version + 1;
        next.updated_at = Utc::now();
        next.validate()?;

        *current = next.clone();
        Ok(next)
    }

    async fn list(&self) -> StorageResult<Vec<AgentState>> {
        let slots: Vec<_> = {
            let agents = self.agents.read().unwrap_or_else(|e| e.into_inner());
            agents.values().cloned().collect()
        };
        let mut states = Vec::with_capacity(slots.len());
        for slot in slots {
            states.push(slot.lock().await.clone());
        }
        Ok(states)
    }
}

// ---------------------------------------------------------------------------
// MemoryScenarioArchive
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ArchiveInner {
    order: Vec<String>,
    by_id: HashMap<String, ArchivedScenario>,
}

/// Scenario archive backed by an insertion-ordered map.
#[derive(Debug, Default)]
pub struct MemoryScenarioArchive {
    inner: Mutex<ArchiveInner>,
}

impl MemoryScenarioArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScenarioArchive for MemoryScenarioArchive {
    async fn record(&self, scenario: ArchivedScenario) -> StorageResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.by_id.contains_key(&scenario.scenario_id) {
            return Err(StorageError::DuplicateScenario {
                scenario_id: scenario.scenario_id,
            });
        }
        inner.order.push(scenario.scenario_id.clone());
        inner.by_id.insert(scenario.scenario_id.clone(), scenario);
        Ok(())
    }

    async fn get(&self, scenario_id: &str) -> StorageResult<ArchivedScenario> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .by_id
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| StorageError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            })
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<ArchivedScenario>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect())
    }

    async fn all(&self) -> StorageResult<Vec<ArchivedScenario>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect())
    }
}
