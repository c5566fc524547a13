//! Scenario lifecycle.
//!
//! ```text
//! Created -> Enhanced -> Dispatched -> Evaluated -> Resolved
//!     -> DifficultyUpdated -> LearningDispatched -> Archived
//! Resolved -> Archived            (tie or no contest)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Created,
    Enhanced,
    Dispatched,
    Evaluated,
    Resolved,
    DifficultyUpdated,
    LearningDispatched,
    Archived,
}

impl ScenarioPhase {
    pub fn can_advance_to(self, next: ScenarioPhase) -> bool {
        use ScenarioPhase::*;
        matches!(
            (self, next),
            (Created, Enhanced)
                | (Enhanced, Dispatched)
                | (Dispatched, Evaluated)
                | (Evaluated, Resolved)
                | (Resolved, DifficultyUpdated)
                | (Resolved, Archived)
                | (DifficultyUpdated, LearningDispatched)
                | (LearningDispatched, Archived)
        )
    }

    pub fn advance(self, next: ScenarioPhase) -> ArenaResult<ScenarioPhase> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(ArenaError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ScenarioPhase::Archived
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioPhase::Created => "created",
            ScenarioPhase::Enhanced => "enhanced",
            ScenarioPhase::Dispatched => "dispatched",
            ScenarioPhase::Evaluated => "evaluated",
            ScenarioPhase::Resolved => "resolved",
            ScenarioPhase::DifficultyUpdated => "difficulty_updated",
            ScenarioPhase::LearningDispatched => "learning_dispatched",
            ScenarioPhase::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ScenarioPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of the phases a scenario passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTrail {
    phases: Vec<ScenarioPhase>,
}

impl Default for PhaseTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTrail {
    pub fn new() -> Self {
        Self {
            phases: vec![ScenarioPhase::Created],
        }
    }

    pub fn current(&self) -> ScenarioPhase {
        self.phases
            .last()
            .copied()
            .unwrap_or(ScenarioPhase::Created)
    }

    pub fn advance(&mut self, next: ScenarioPhase) -> ArenaResult<()> {
        let next = self.current().advance(next)?;
        self.phases.push(next);
        Ok(())
    }

    pub fn phases(&self) -> &[ScenarioPhase] {
        &self.phases
    }
}
