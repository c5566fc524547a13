//! Shared startup for the Arena binaries: config, storage and engine.

use std::path::Path;
use std::sync::Arc;

use arena_state::{
    AgentStateStore, MemoryAgentStore, MemoryScenarioArchive, ScenarioArchive, StorageError,
    SurrealHandle,
};
use tracing::{info, warn};

use crate::adapters::{CapabilityRegistry, LearningSink, TracingSink};
use crate::config::ArenaConfig;
use crate::engine::ArenaEngine;
use crate::error::{ArenaError, ArenaResult};

/// Where agent state and the scenario archive live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChoice {
    /// Process-local; everything is lost on exit.
    Memory,
    /// Cloud credentials, then `SURREALDB_URL`, then local SurrealKV.
    FromEnv,
}

/// Backing stores for one engine.
pub struct Storage {
    pub agents: Arc<dyn AgentStateStore>,
    pub archive: Arc<dyn ScenarioArchive>,
}

/// Read the config file if given (defaults otherwise), then apply `ARENA_*`.
pub fn load_config(path: Option<&Path>) -> ArenaResult<ArenaConfig> {
    let config = match path {
        Some(path) => ArenaConfig::from_file(path)?,
        None => ArenaConfig::default(),
    };
    config.with_env_overrides()
}

pub async fn open_storage(choice: StorageChoice) -> ArenaResult<Storage> {
    match choice {
        StorageChoice::Memory => {
            info!("using in-memory storage");
            Ok(Storage {
                agents: Arc::new(MemoryAgentStore::new()),
                archive: Arc::new(MemoryScenarioArchive::new()),
            })
        }
        StorageChoice::FromEnv => {
            let handle = SurrealHandle::setup_from_env()
                .await
                .map_err(|e| ArenaError::Storage(StorageError::Backend(e.to_string())))?;
            Ok(Storage {
                agents: Arc::new(handle.agent_store()),
                archive: Arc::new(handle.scenario_archive()),
            })
        }
    }
}

/// Engine wired with config-defined collaborators and a tracing sink.
pub fn build_engine(config: ArenaConfig, storage: Storage) -> ArenaResult<ArenaEngine> {
    let registry = CapabilityRegistry::from_config(&config)?;
    if registry.kind_tags().is_empty() {
        warn!("no agent kinds configured; every participant will be rejected");
    }
    let sink: Arc<dyn LearningSink> = Arc::new(TracingSink);
    ArenaEngine::new(
        config,
        storage.agents,
        storage.archive,
        Arc::new(registry),
        sink,
    )
}
