//! Per-agent state writes with bounded exponential-backoff retry.

use std::time::Duration;

use arena_state::{AgentId, AgentState, AgentStateStore, StateMutation};

use crate::config::PersistenceConfig;
use crate::error::{ArenaError, ArenaResult};
use crate::metrics::METRICS;
use crate::obs;

/// Apply `mutate` atomically, retrying version conflicts.
///
/// Makes `max_retries + 1` attempts, sleeping `backoff_base_ms * 2^(n-1)`
/// after the n-th conflict. Other storage errors fail immediately.
pub async fn update_with_retry(
    store: &dyn AgentStateStore,
    agent_id: &AgentId,
    policy: &PersistenceConfig,
    mutate: StateMutation<'_>,
) -> ArenaResult<AgentState> {
    let max_attempts = policy.max_retries + 1;

    for attempt in 1..=max_attempts {
        match store.update(agent_id, mutate).await {
            Ok(state) => return Ok(state),
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                let delay_ms = policy
                    .backoff_base_ms
                    .saturating_mul(2u64.saturating_pow(attempt - 1));
                obs::emit_persistence_retry(agent_id, attempt, delay_ms, &e);
                METRICS.inc_persistence_retries();
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) if e.is_conflict() => break,
            Err(e) => return Err(ArenaError::Storage(e)),
        }
    }

    Err(ArenaError::PersistenceConflict {
        agent_id: agent_id.clone(),
        attempts: max_attempts,
    })
}

/// Per-agent results of a multi-agent write.
#[derive(Debug, Default)]
pub struct PersistBatch<T> {
    pub committed: Vec<T>,
    pub failed: Vec<(AgentId, ArenaError)>,
}

impl<T> PersistBatch<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
