//! Arena-State: persistence for the Arena evaluation engine
//!
//! Holds the per-agent competitive state (difficulty multiplier, win/loss
//! record, XP, learning history) and the archive of resolved scenarios.
//!
//! ## Key Components
//!
//! - `AgentStateStore`: atomic per-agent read-modify-write
//! - `ScenarioArchive`: append-only scenario history for analytics
//! - `MemoryAgentStore` / `MemoryScenarioArchive`: in-process backends
//! - `SurrealAgentStore` / `SurrealScenarioArchive`: SurrealDB backends
//! - `SurrealHandle`: connection resolution and schema setup

mod error;
mod handle;
pub mod memory;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{CloudConfig, SurrealHandle};
pub use memory::{MemoryAgentStore, MemoryScenarioArchive};
pub use storage_traits::{
    AgentId, AgentState, AgentStateStore, ArchivedOutcome, ArchivedScenario, ArchivedScore,
    LearningEvent, LearningKind, ScenarioArchive, StateMutation, StorageResult,
    DEFAULT_MULTIPLIER, MULTIPLIER_FLOOR,
};
pub use surreal_store::{SurrealAgentStore, SurrealScenarioArchive};

/// Result type for connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
