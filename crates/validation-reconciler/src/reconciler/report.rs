//! Summary of one reconciliation pass.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stage of a pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PassPhase {
    Idle,
    Enumerating,
    ProcessingClusterScoped,
    ProcessingNamespaced,
    ReclaimingDeleted,
}

impl std::fmt::Display for PassPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PassPhase::Idle => "idle",
            PassPhase::Enumerating => "enumerating",
            PassPhase::ProcessingClusterScoped => "processing cluster scoped",
            PassPhase::ProcessingNamespaced => "processing namespaced",
            PassPhase::ReclaimingDeleted => "reclaiming deleted",
        };
        f.write_str(name)
    }
}

/// Counters and timestamps recorded during a pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: u64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Last phase entered; `Idle` once the pass has finished.
    pub phase: PassPhase,
    pub cluster_scoped_kinds: usize,
    pub namespaced_kinds: usize,
    pub namespaces: usize,
    /// Objects recorded in the live set.
    pub objects_observed: usize,
    /// Objects skipped because their revision was already validated.
    pub cache_hits: usize,
    /// Calls made to the evaluation engine.
    pub evaluations: usize,
    /// Objects whose outcome was stored by those calls.
    pub objects_evaluated: usize,
    /// Stale entries reclaimed after the objects disappeared.
    pub deletions: usize,
    /// Set when errors earlier in the pass prevented the deletion diff.
    pub deletions_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassReport {
    pub fn start(pass: u64) -> Self {
        Self {
            pass,
            started_at: Utc::now(),
            finished_at: None,
            phase: PassPhase::Idle,
            cluster_scoped_kinds: 0,
            namespaced_kinds: 0,
            namespaces: 0,
            objects_observed: 0,
            cache_hits: 0,
            evaluations: 0,
            objects_evaluated: 0,
            deletions: 0,
            deletions_skipped: false,
            error: None,
        }
    }

    pub fn enter(&mut self, phase: PassPhase) {
        log::debug!("Pass {}: {}", self.pass, phase);
        self.phase = phase;
    }

    /// Stamps the finish time and the error, if any. The failing phase is kept.
    pub fn finish(&mut self, error: Option<String>) {
        self.finished_at = Some(Utc::now());
        if error.is_none() {
            self.phase = PassPhase::Idle;
        }
        self.error = error;
    }

    pub fn succeeded(&self) -> bool {
        self.finished_at.is_some() && self.error.is_none()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}
