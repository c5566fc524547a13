use std::sync::Arc;

use arena_core::ArenaEngine;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArenaEngine>,
}

impl AppState {
    pub fn new(engine: ArenaEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
