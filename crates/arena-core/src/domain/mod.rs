//! Arena domain types.

pub mod evaluation;
pub mod phase;
pub mod scenario;

pub use evaluation::{Outcome, OutcomeKind, ResponseRecord, ScoredResult};
pub use phase::{PhaseTrail, ScenarioPhase};
pub use scenario::{complexity_layers, technical_depth, Category, Scenario, Variant};
