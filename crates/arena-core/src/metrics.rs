//! Process-global counters for engine activity.
//!
//! Incremented at the call site; [`Metrics::flush`] emits all values as one
//! `info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    scenarios_resolved: AtomicU64,
    ties: AtomicU64,
    timeouts: AtomicU64,
    scorer_fallbacks: AtomicU64,
    persistence_retries: AtomicU64,
    sink_failures: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub scenarios_resolved: u64,
    pub ties: u64,
    pub timeouts: u64,
    pub scorer_fallbacks: u64,
    pub persistence_retries: u64,
    pub sink_failures: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            scenarios_resolved: AtomicU64::new(0),
            ties: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            scorer_fallbacks: AtomicU64::new(0),
            persistence_retries: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    fn bump(counter: &AtomicU64, name: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = name, "counter incremented");
    }

    pub fn inc_scenarios_resolved(&self) {
        Self::bump(&self.scenarios_resolved, "scenarios_resolved");
    }

    pub fn inc_ties(&self) {
        Self::bump(&self.ties, "ties");
    }

    pub fn inc_timeouts(&self) {
        Self::bump(&self.timeouts, "timeouts");
    }

    pub fn inc_scorer_fallbacks(&self) {
        Self::bump(&self.scorer_fallbacks, "scorer_fallbacks");
    }

    pub fn inc_persistence_retries(&self) {
        Self::bump(&self.persistence_retries, "persistence_retries");
    }

    pub fn inc_sink_failures(&self) {
        Self::bump(&self.sink_failures, "sink_failures");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scenarios_resolved: self.scenarios_resolved.load(Ordering::Relaxed),
            ties: self.ties.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            scorer_fallbacks: self.scorer_fallbacks.load(Ordering::Relaxed),
            persistence_retries: self.persistence_retries.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call at natural boundaries (end of a cycle, daemon shutdown).
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            scenarios_resolved = s.scenarios_resolved,
            ties = s.ties,
            timeouts = s.timeouts,
            scorer_fallbacks = s.scorer_fallbacks,
            persistence_retries = s.persistence_retries,
            sink_failures = s.sink_failures,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.scenarios_resolved,
            &self.ties,
            &self.timeouts,
            &self.scorer_fallbacks,
            &self.persistence_retries,
            &self.sink_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
