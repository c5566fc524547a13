//! Arena daemon library: the HTTP surface over [`arena_core::ArenaEngine`].
//!
//! # Routes
//!
//! - `POST /tests/{agent_id}/force` - run one scenario now
//! - `GET /agents/{agent_id}/difficulty` - multiplier and record
//! - `GET /agents/{agent_id}/learning-history?limit=N` - latest learning events
//! - `POST /agents/{agent_id}/archive` - retire an agent
//! - `GET /scenarios/analytics?recent=N` - archive summary
//! - `POST /cycles` - one scenario per category
//! - `GET /health`, `GET /metrics`

pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::router;
pub use state::AppState;
