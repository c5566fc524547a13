//! HTTP handlers.

use arena_core::{
    AgentId, AgentState, Analytics, ArenaError, Category, CycleSummary, DifficultySnapshot, LearningEvent,
    MetricsSnapshot, Outcome, Scenario, ScenarioPhase, ScoredResult, METRICS,
};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_RECENT: usize = 10;
const MAX_RECENT: usize = 100;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/tests/{agent_id}/force", post(force_test))
        .route("/agents/{agent_id}/difficulty", get(get_difficulty))
        .route(
            "/agents/{agent_id}/learning-history",
            get(get_learning_history),
        )
        .route("/agents/{agent_id}/archive", post(archive_agent))
        .route("/scenarios/analytics", get(get_analytics))
        .route("/cycles", post(run_cycle))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics() -> Json<MetricsSnapshot> {
    Json(METRICS.snapshot())
}

#[derive(Debug, Default, Deserialize)]
pub struct ForceTestRequest {
    /// Other agents competing in the same scenario.
    #[serde(default)]
    pub co_participants: Vec<String>,
    /// Defaults to the agent's next category in rotation.
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Serialize)]
pub struct ForceTestResponse {
    pub scenario: Scenario,
    pub outcome: Outcome,
    pub results: Vec<ScoredResult>,
    /// The forced agent's state after the scenario.
    pub state: AgentState,
    pub phases: Vec<ScenarioPhase>,
}

#[instrument(skip(state, request), fields(agent_id = %agent_id))]
pub async fn force_test(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    request: Option<Json<ForceTestRequest>>,
) -> Result<Json<ForceTestResponse>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let agent_id = AgentId::new(agent_id);
    let co: Vec<AgentId> = request
        .co_participants
        .into_iter()
        .map(AgentId::new)
        .collect();

    let report = state
        .engine
        .force_test(&agent_id, &co, request.category)
        .await?;
    let agent_state = match report.states.iter().find(|s| s.agent_id == agent_id) {
        Some(s) => s.clone(),
        None => state
            .engine
            .store()
            .get(&agent_id)
            .await
            .map_err(ArenaError::from)?,
    };

    Ok(Json(ForceTestResponse {
        scenario: report.scenario,
        outcome: report.outcome,
        results: report.results,
        state: agent_state,
        phases: report.phases,
    }))
}

pub async fn get_difficulty(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<DifficultySnapshot>, AppError> {
    let snapshot = state.engine.difficulty(&AgentId::new(agent_id)).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LearningHistoryResponse {
    pub agent_id: AgentId,
    /// Oldest first.
    pub events: Vec<LearningEvent>,
}

pub async fn get_learning_history(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<LearningHistoryResponse>, AppError> {
    let agent_id = AgentId::new(agent_id);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(state.engine.config().learning_retention);
    let events = state.engine.learning_history(&agent_id, limit).await?;
    Ok(Json(LearningHistoryResponse { agent_id, events }))
}

pub async fn archive_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<DifficultySnapshot>, AppError> {
    let archived = state.engine.archive_agent(&AgentId::new(agent_id)).await?;
    Ok(Json(DifficultySnapshot::from(&archived)))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    #[serde(default)]
    pub recent: Option<usize>,
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Analytics>, AppError> {
    let recent = params.recent.unwrap_or(DEFAULT_RECENT).min(MAX_RECENT);
    Ok(Json(state.engine.analytics(recent).await?))
}

#[derive(Debug, Deserialize)]
pub struct CycleRequest {
    pub participants: Vec<String>,
}

#[instrument(skip_all, fields(participants = request.participants.len()))]
pub async fn run_cycle(
    State(state): State<AppState>,
    Json(request): Json<CycleRequest>,
) -> Result<Json<CycleSummary>, AppError> {
    let participants: Vec<AgentId> = request.participants.into_iter().map(AgentId::new).collect();
    Ok(Json(state.engine.run_cycle(&participants).await?))
}
