//! HTTP collaborators.
//!
//! `HttpResponder` posts `{agent_id, scenario}` to the agent's endpoint and
//! expects `{"answer": "..."}`. `HttpScorer` posts `{scenario, answer}` and
//! expects `{"score": n, "feedback": "..."}`; scores are clamped.

use std::collections::HashMap;

use arena_state::AgentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Responder, ScoreCard, Scorer};
use crate::domain::Scenario;
use crate::error::{ArenaError, ArenaResult};

#[derive(Serialize)]
struct RespondRequest<'a> {
    agent_id: &'a AgentId,
    scenario: &'a Scenario,
}

#[derive(Deserialize)]
struct RespondBody {
    answer: String,
}

/// Responder that calls each agent over HTTP.
#[derive(Debug, Clone)]
pub struct HttpResponder {
    client: reqwest::Client,
    endpoints: HashMap<AgentId, String>,
    fallback_endpoint: Option<String>,
}

impl HttpResponder {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoints: HashMap::new(),
            fallback_endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, agent_id: AgentId, url: impl Into<String>) -> Self {
        self.endpoints.insert(agent_id, url.into());
        self
    }

    /// Endpoint for agents without one of their own.
    pub fn with_fallback_endpoint(mut self, url: impl Into<String>) -> Self {
        self.fallback_endpoint = Some(url.into());
        self
    }

    fn endpoint_for(&self, agent_id: &AgentId) -> Option<&str> {
        self.endpoints
            .get(agent_id)
            .or(self.fallback_endpoint.as_ref())
            .map(String::as_str)
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn respond(&self, agent_id: &AgentId, scenario: &Scenario) -> ArenaResult<String> {
        let fail = |reason: String| ArenaError::Responder {
            agent_id: agent_id.clone(),
            reason,
        };
        let url = self
            .endpoint_for(agent_id)
            .ok_or_else(|| fail("no endpoint configured".to_string()))?;

        let body: RespondBody = self
            .client
            .post(url)
            .json(&RespondRequest { agent_id, scenario })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?
            .json()
            .await
            .map_err(|e| fail(format!("malformed response: {e}")))?;

        Ok(body.answer)
    }
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    scenario: &'a Scenario,
    answer: &'a str,
}

#[derive(Deserialize)]
struct ScoreBody {
    score: i64,
    #[serde(default)]
    feedback: String,
}

/// Scorer backed by a remote grading service.
#[derive(Debug, Clone)]
pub struct HttpScorer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScorer {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, scenario: &Scenario, answer: &str) -> ArenaResult<ScoreCard> {
        let body: ScoreBody = self
            .client
            .post(&self.endpoint)
            .json(&ScoreRequest { scenario, answer })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ArenaError::ScorerFailure(e.to_string()))?
            .json()
            .await
            .map_err(|e| ArenaError::ScorerFailure(format!("malformed response: {e}")))?;

        Ok(ScoreCard::new(body.score, body.feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::sample_scenario;

    /// An address nothing listens on.
    async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn responder_without_endpoint_fails() {
        let responder = HttpResponder::new(reqwest::Client::new());
        let err = responder
            .respond(&AgentId::from("ghost"), &sample_scenario())
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::Responder { .. }));
        assert!(err.to_string().contains("no endpoint"));
    }

    #[tokio::test]
    async fn responder_connection_failure_is_responder_error() {
        let url = closed_port_url().await;
        let responder = HttpResponder::new(reqwest::Client::new()).with_fallback_endpoint(url);
        let err = responder
            .respond(&AgentId::from("a"), &sample_scenario())
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::Responder { .. }));
    }

    #[tokio::test]
    async fn scorer_connection_failure_is_scorer_failure() {
        let url = closed_port_url().await;
        let scorer = HttpScorer::new(reqwest::Client::new(), url);
        let err = scorer
            .score(&sample_scenario(), "an answer")
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::ScorerFailure(_)));
    }
}
