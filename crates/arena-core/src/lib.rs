//! Arena Core Library
//!
//! Adaptive competitive evaluation for autonomous agents: scenarios sized to
//! the participants' difficulty, concurrent answering and scoring, and
//! per-agent difficulty that grows without bound on wins and decays to a
//! floor on losses.

pub mod adapters;
pub mod analytics;
pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod cycle;
pub mod domain;
pub mod engine;
pub mod error;
pub mod learning;
pub mod metrics;
pub mod obs;
pub mod persist;
pub mod scaler;
pub mod scenario;
pub mod telemetry;

pub use adapters::{
    Binding, CapabilityRegistry, HeuristicScorer, HttpResponder, HttpScorer, LearningSink,
    NullSink, Responder, ScoreCard, Scorer, TracingSink, MAX_SCORE,
};
pub use analytics::{AgentSummary, Analytics};
pub use bootstrap::{build_engine, load_config, open_storage, Storage, StorageChoice};
pub use config::{
    AgentRegistration, ArenaConfig, KindConfig, PersistenceConfig, ResponderKind, ScorerKind,
};
pub use coordinator::{rank_results, resolve_outcome, EvaluationCoordinator};
pub use cycle::{CycleEntry, CycleSummary, PASSING_AVERAGE};
pub use domain::{
    complexity_layers, technical_depth, Category, Outcome, OutcomeKind, PhaseTrail,
    ResponseRecord, Scenario, ScenarioPhase, ScoredResult, Variant,
};
pub use engine::{ArenaEngine, DifficultySnapshot, ScenarioReport};
pub use error::{ArenaError, ArenaResult, PersistStage, UnpersistedOutcome};
pub use learning::{build_events, LearningDispatcher};
pub use metrics::{MetricsSnapshot, METRICS};
pub use persist::{update_with_retry, PersistBatch};
pub use scaler::{earned_xp, DifficultyScaler, ScalingRules};
pub use scenario::{
    build_scenario, normalize_participants, scenario_difficulty, ComplexityEnhancer,
    ScenarioGenerator,
};
pub use telemetry::init_tracing;

pub use arena_state::{
    AgentId, AgentState, AgentStateStore, ArchivedScenario, LearningEvent, LearningKind,
    ScenarioArchive,
};
