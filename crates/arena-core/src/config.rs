//! Engine configuration.
//!
//! Loaded from TOML and overridable per field from `ARENA_*` environment
//! variables. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! ultra_complex_threshold = 3.0
//! pass_threshold = 50
//!
//! [persistence]
//! max_retries = 4
//! backoff_base_ms = 10
//!
//! [[kinds]]
//! tag = "remote"
//! responder = "http"
//! scorer = "heuristic"
//!
//! [[agents]]
//! id = "alpha"
//! kind = "remote"
//! endpoint = "http://localhost:9001/respond"
//! ```

use std::path::Path;
use std::str::FromStr;

use arena_state::MULTIPLIER_FLOOR;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

/// Retry policy for per-agent state writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff_base_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    #[default]
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Heuristic,
    Http,
}

/// A capability binding: how agents of this kind are asked and scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindConfig {
    pub tag: String,
    #[serde(default)]
    pub responder: ResponderKind,
    #[serde(default)]
    pub scorer: ScorerKind,
    /// Required when `scorer = "http"`.
    #[serde(default)]
    pub scorer_endpoint: Option<String>,
    /// Used for agents of this kind that have no endpoint of their own.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// A known agent and the kind that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Difficulty at which scenarios gain complexity layers.
    pub ultra_complex_threshold: f64,
    /// Minimum score for a self-test to count as a win.
    pub pass_threshold: u32,
    pub win_increment: f64,
    pub loss_decrement: f64,
    pub multiplier_floor: f64,
    /// Learning events kept per agent.
    pub learning_retention: usize,
    /// Score assigned when the scorer fails.
    pub scorer_fallback_score: u32,
    /// Multiplies every computed time limit.
    pub time_limit_scale: f64,
    pub persistence: PersistenceConfig,
    pub kinds: Vec<KindConfig>,
    pub agents: Vec<AgentRegistration>,
    /// Kind used for agents without a registration.
    pub default_kind: Option<String>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            ultra_complex_threshold: 3.0,
            pass_threshold: 50,
            win_increment: 0.5,
            loss_decrement: 0.25,
            multiplier_floor: MULTIPLIER_FLOOR,
            learning_retention: 500,
            scorer_fallback_score: 0,
            time_limit_scale: 1.0,
            persistence: PersistenceConfig::default(),
            kinds: Vec::new(),
            agents: Vec::new(),
            default_kind: None,
        }
    }
}

impl ArenaConfig {
    pub fn from_toml_str(s: &str) -> ArenaResult<Self> {
        let config: ArenaConfig =
            toml::from_str(s).map_err(|e| ArenaError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ArenaError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply `ARENA_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> ArenaResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ArenaResult<Self> {
        fn parse<T: FromStr>(key: &str, raw: String) -> ArenaResult<T>
        where
            T::Err: std::fmt::Display,
        {
            raw.trim()
                .parse()
                .map_err(|e| ArenaError::Config(format!("{key}={raw}: {e}")))
        }

        if let Some(v) = lookup("ARENA_ULTRA_COMPLEX_THRESHOLD") {
            self.ultra_complex_threshold = parse("ARENA_ULTRA_COMPLEX_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("ARENA_PASS_THRESHOLD") {
            self.pass_threshold = parse("ARENA_PASS_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("ARENA_LEARNING_RETENTION") {
            self.learning_retention = parse("ARENA_LEARNING_RETENTION", v)?;
        }
        if let Some(v) = lookup("ARENA_SCORER_FALLBACK_SCORE") {
            self.scorer_fallback_score = parse("ARENA_SCORER_FALLBACK_SCORE", v)?;
        }
        if let Some(v) = lookup("ARENA_TIME_LIMIT_SCALE") {
            self.time_limit_scale = parse("ARENA_TIME_LIMIT_SCALE", v)?;
        }
        if let Some(v) = lookup("ARENA_MAX_RETRIES") {
            self.persistence.max_retries = parse("ARENA_MAX_RETRIES", v)?;
        }
        if let Some(v) = lookup("ARENA_BACKOFF_BASE_MS") {
            self.persistence.backoff_base_ms = parse("ARENA_BACKOFF_BASE_MS", v)?;
        }
        if let Some(v) = lookup("ARENA_DEFAULT_KIND") {
            self.default_kind = Some(v);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ArenaResult<()> {
        let fail = |msg: String| Err(ArenaError::Config(msg));

        if !self.ultra_complex_threshold.is_finite() || self.ultra_complex_threshold <= 0.0 {
            return fail(format!(
                "ultra_complex_threshold must be positive, got {}",
                self.ultra_complex_threshold
            ));
        }
        if self.pass_threshold > 100 {
            return fail(format!(
                "pass_threshold must be within 0..=100, got {}",
                self.pass_threshold
            ));
        }
        if self.scorer_fallback_score > 100 {
            return fail(format!(
                "scorer_fallback_score must be within 0..=100, got {}",
                self.scorer_fallback_score
            ));
        }
        if !(self.win_increment.is_finite() && self.win_increment >= 0.0) {
            return fail(format!("win_increment must be >= 0, got {}", self.win_increment));
        }
        if !(self.loss_decrement.is_finite() && self.loss_decrement >= 0.0) {
            return fail(format!(
                "loss_decrement must be >= 0, got {}",
                self.loss_decrement
            ));
        }
        if !(self.multiplier_floor.is_finite() && self.multiplier_floor >= MULTIPLIER_FLOOR) {
            return fail(format!(
                "multiplier_floor must be >= {MULTIPLIER_FLOOR}, got {}",
                self.multiplier_floor
            ));
        }
        if self.learning_retention == 0 {
            return fail("learning_retention must be at least 1".to_string());
        }
        if !(self.time_limit_scale.is_finite() && self.time_limit_scale > 0.0) {
            return fail(format!(
                "time_limit_scale must be positive, got {}",
                self.time_limit_scale
            ));
        }

        for kind in &self.kinds {
            if kind.scorer == ScorerKind::Http && kind.scorer_endpoint.is_none() {
                return fail(format!(
                    "kind {} uses the http scorer but has no scorer_endpoint",
                    kind.tag
                ));
            }
        }
        let known = |tag: &str| self.kinds.iter().any(|k| k.tag == tag);
        for agent in &self.agents {
            if !known(&agent.kind) {
                return fail(format!("agent {} has unknown kind {}", agent.id, agent.kind));
            }
        }
        if let Some(tag) = &self.default_kind {
            if !known(tag) {
                return fail(format!("default_kind {tag} is not a declared kind"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ArenaConfig::default();
        assert_eq!(cfg.ultra_complex_threshold, 3.0);
        assert_eq!(cfg.pass_threshold, 50);
        assert_eq!(cfg.win_increment, 0.5);
        assert_eq!(cfg.loss_decrement, 0.25);
        assert_eq!(cfg.multiplier_floor, 0.5);
        assert_eq!(cfg.learning_retention, 500);
        assert_eq!(cfg.persistence.max_retries, 4);
        assert_eq!(cfg.persistence.backoff_base_ms, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ArenaConfig::from_toml_str("").unwrap(), ArenaConfig::default());
    }

    #[test]
    fn parses_kinds_and_agents() {
        let cfg = ArenaConfig::from_toml_str(
            r#"
            pass_threshold = 60
            default_kind = "remote"

            [persistence]
            max_retries = 2

            [[kinds]]
            tag = "remote"
            scorer = "http"
            scorer_endpoint = "http://scorer.local/score"

            [[agents]]
            id = "alpha"
            kind = "remote"
            endpoint = "http://alpha.local/respond"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.pass_threshold, 60);
        assert_eq!(cfg.persistence.max_retries, 2);
        assert_eq!(cfg.persistence.backoff_base_ms, 10);
        assert_eq!(cfg.kinds[0].scorer, ScorerKind::Http);
        assert_eq!(cfg.kinds[0].responder, ResponderKind::Http);
        assert_eq!(cfg.agents[0].endpoint.as_deref(), Some("http://alpha.local/respond"));
    }

    #[test]
    fn rejects_floor_below_invariant() {
        let err = ArenaConfig::from_toml_str("multiplier_floor = 0.25").unwrap_err();
        assert!(matches!(err, ArenaError::Config(_)));
    }

    #[test]
    fn rejects_agent_with_undeclared_kind() {
        let err = ArenaConfig::from_toml_str(
            r#"
            [[agents]]
            id = "alpha"
            kind = "ghost"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn http_scorer_requires_endpoint() {
        let err = ArenaConfig::from_toml_str(
            r#"
            [[kinds]]
            tag = "remote"
            scorer = "http"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("scorer_endpoint"));
    }

    #[test]
    fn overrides_apply_and_validate() {
        let env: HashMap<&str, &str> = [
            ("ARENA_PASS_THRESHOLD", "70"),
            ("ARENA_TIME_LIMIT_SCALE", "0.001"),
            ("ARENA_MAX_RETRIES", "9"),
        ]
        .into_iter()
        .collect();
        let cfg = ArenaConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.pass_threshold, 70);
        assert_eq!(cfg.time_limit_scale, 0.001);
        assert_eq!(cfg.persistence.max_retries, 9);

        let bad = ArenaConfig::default()
            .with_overrides(|k| (k == "ARENA_PASS_THRESHOLD").then(|| "lots".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.toml");
        std::fs::write(&path, "learning_retention = 25\n").unwrap();
        let cfg = ArenaConfig::from_file(&path).unwrap();
        assert_eq!(cfg.learning_retention, 25);

        assert!(ArenaConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
