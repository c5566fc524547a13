//! Learning sinks shipped with the engine.

use arena_state::LearningEvent;
use async_trait::async_trait;

use super::LearningSink;
use crate::error::ArenaResult;

/// Logs each event at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl LearningSink for TracingSink {
    async fn publish(&self, event: &LearningEvent) -> ArenaResult<()> {
        tracing::info!(
            event = "learning.published",
            agent_id = %event.agent_id,
            kind = event.kind.as_str(),
            scenario_id = %event.scenario_id,
            lessons = event.lessons.len(),
        );
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl LearningSink for NullSink {
    async fn publish(&self, _event: &LearningEvent) -> ArenaResult<()> {
        Ok(())
    }
}
