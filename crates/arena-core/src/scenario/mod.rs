//! Scenario construction: base generation, then complexity layering.

pub mod enhancer;
pub mod generator;
pub mod templates;

pub use enhancer::ComplexityEnhancer;
pub use generator::{build_scenario, normalize_participants, scenario_difficulty, ScenarioGenerator};
