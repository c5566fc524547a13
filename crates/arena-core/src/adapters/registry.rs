//! Capability registry: agent kind tag -> responder/scorer binding.

use std::collections::HashMap;
use std::sync::Arc;

use arena_state::AgentId;

use super::{HeuristicScorer, HttpResponder, HttpScorer, Responder, Scorer};
use crate::config::{ArenaConfig, ResponderKind, ScorerKind};
use crate::error::{ArenaError, ArenaResult};

/// How agents of one kind are asked and graded.
#[derive(Clone)]
pub struct Binding {
    pub responder: Arc<dyn Responder>,
    pub scorer: Arc<dyn Scorer>,
}

impl Binding {
    pub fn new(responder: Arc<dyn Responder>, scorer: Arc<dyn Scorer>) -> Self {
        Self { responder, scorer }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    kinds: HashMap<String, Binding>,
    agents: HashMap<AgentId, String>,
    default_kind: Option<String>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, tag: impl Into<String>, binding: Binding) -> Self {
        self.kinds.insert(tag.into(), binding);
        self
    }

    pub fn with_agent(mut self, agent_id: AgentId, tag: impl Into<String>) -> Self {
        self.agents.insert(agent_id, tag.into());
        self
    }

    /// Kind used for agents without an explicit assignment.
    pub fn with_default_kind(mut self, tag: impl Into<String>) -> Self {
        self.default_kind = Some(tag.into());
        self
    }

    /// Build HTTP-backed bindings from `[[kinds]]` and `[[agents]]`.
    pub fn from_config(config: &ArenaConfig) -> ArenaResult<Self> {
        let client = reqwest::Client::new();
        let mut registry = Self::new();

        for kind in &config.kinds {
            let responder: Arc<dyn Responder> = match kind.responder {
                ResponderKind::Http => {
                    let mut responder = HttpResponder::new(client.clone());
                    if let Some(url) = &kind.endpoint {
                        responder = responder.with_fallback_endpoint(url.clone());
                    }
                    for agent in config.agents.iter().filter(|a| a.kind == kind.tag) {
                        if let Some(url) = &agent.endpoint {
                            responder =
                                responder.with_endpoint(AgentId::new(agent.id.clone()), url.clone());
                        }
                    }
                    Arc::new(responder)
                }
            };

            let scorer: Arc<dyn Scorer> = match kind.scorer {
                ScorerKind::Heuristic => Arc::new(HeuristicScorer),
                ScorerKind::Http => {
                    let url = kind.scorer_endpoint.clone().ok_or_else(|| {
                        ArenaError::Config(format!("kind {} has no scorer_endpoint", kind.tag))
                    })?;
                    Arc::new(HttpScorer::new(client.clone(), url))
                }
            };

            registry = registry.with_kind(kind.tag.clone(), Binding::new(responder, scorer));
        }

        for agent in &config.agents {
            registry = registry.with_agent(AgentId::new(agent.id.clone()), agent.kind.clone());
        }
        if let Some(tag) = &config.default_kind {
            registry = registry.with_default_kind(tag.clone());
        }
        Ok(registry)
    }

    pub fn binding_for(&self, agent_id: &AgentId) -> ArenaResult<&Binding> {
        self.agents
            .get(agent_id)
            .or(self.default_kind.as_ref())
            .and_then(|tag| self.kinds.get(tag))
            .ok_or_else(|| ArenaError::UnknownAgentKind {
                agent_id: agent_id.clone(),
            })
    }

    /// Fail on the first participant without a binding.
    pub fn check(&self, participants: &[AgentId]) -> ArenaResult<()> {
        participants
            .iter()
            .try_for_each(|id| self.binding_for(id).map(|_| ()))
    }

    pub fn kind_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
