//! Run reports and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnosis::FailureReason;
use crate::types::{EvolutionAttempt, EvolutionId, EvolutionStatus};

// ── Evolution Report ────────────────────────────────────────────────

/// Condensed record of one evolution run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvolutionReport {
    /// Run identifier.
    pub id: EvolutionId,
    /// Terminal status of the run.
    pub status: EvolutionStatus,
    /// Generations executed.
    pub generations: u32,
    /// How many attempts produced a mutated candidate.
    pub mutations_applied: u32,
    /// Distinct failure reasons, in first-seen order.
    pub reasons_seen: Vec<FailureReason>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl EvolutionReport {
    pub fn from_history(
        id: EvolutionId,
        status: EvolutionStatus,
        history: &[EvolutionAttempt],
    ) -> Self {
        let mut reasons_seen = Vec::new();
        for attempt in history {
            if let Some(diagnosis) = &attempt.diagnosis {
                if !reasons_seen.contains(&diagnosis.reason) {
                    reasons_seen.push(diagnosis.reason);
                }
            }
        }
        Self {
            id,
            status,
            generations: history.len() as u32,
            mutations_applied: history.iter().filter(|a| a.mutated).count() as u32,
            reasons_seen,
            finished_at: Utc::now(),
        }
    }

    pub fn accepted(&self) -> bool {
        self.status.is_accepted()
    }
}

impl std::fmt::Display for EvolutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EvolutionReport({}, {}, generations={}, mutations={})",
            self.id, self.status, self.generations, self.mutations_applied,
        )
    }
}

// ── Summary ─────────────────────────────────────────────────────────

/// Aggregate statistics over tracked runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub total_runs: usize,
    pub accepted_runs: usize,
    pub exhausted_runs: usize,
    pub hard_failures: usize,
    pub total_generations: usize,
}

impl std::fmt::Display for EvolutionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evolution(runs={}, accepted={}, exhausted={}, hard_failures={}, generations={})",
            self.total_runs,
            self.accepted_runs,
            self.exhausted_runs,
            self.hard_failures,
            self.total_generations,
        )
    }
}
