//! Core types for the evolution loop.
//!
//! Identifiers, timeline and status enumerations, configuration, and
//! the per-iteration attempt record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graft_types::{Symbol, Value};

use crate::diagnosis::Diagnosis;

// ── Identifiers ─────────────────────────────────────────────────────

/// Unique identifier for one evolution run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvolutionId(pub String);

impl EvolutionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EvolutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EvolutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "evolution:{}", self.0)
    }
}

// ── Timeline ────────────────────────────────────────────────────────

/// Which timeline an evolution run kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKept {
    /// The tentative record satisfied the predicate and was committed.
    Accepted,
    /// The checkpoint was restored.
    Reverted,
}

impl TimelineKept {
    pub fn as_symbol(&self) -> Symbol {
        Symbol::new(self.to_string())
    }
}

impl std::fmt::Display for TimelineKept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Reverted => write!(f, "reverted"),
        }
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Terminal status of an evolution run. Never an error: exhaustion
/// and hard failure are reported, not raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionStatus {
    /// A tentative record satisfied the predicate.
    Accepted,
    /// The attempt bound was reached without acceptance.
    MaxEvolutionReached,
    /// A candidate modifier failed under
    /// [`HardFailurePolicy::Terminal`].
    HardFailure(String),
}

impl EvolutionStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::MaxEvolutionReached)
    }
}

impl std::fmt::Display for EvolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::MaxEvolutionReached => write!(f, "max-evolution-reached"),
            Self::HardFailure(detail) => write!(f, "hard-failure: {}", detail),
        }
    }
}

// ── Hard Failure Policy ─────────────────────────────────────────────

/// What to do when a candidate modifier itself fails during Fork.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardFailurePolicy {
    /// Fold the failure into a `hard-failure` diagnosis and continue
    /// the mutate/retry cycle.
    Diagnose,
    /// End the run immediately with
    /// [`EvolutionStatus::HardFailure`].
    Terminal,
}

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for the evolution loop and the rule mutator.
#[derive(Clone, Debug)]
pub struct EvolutionConfig {
    /// Attempt bound; the loop's only cancellation mechanism.
    pub max_attempts: u32,
    /// Scale factor applied on a `too-high` diagnosis.
    pub shrink_factor: f64,
    /// Scale factor applied on a `too-low` diagnosis.
    pub growth_factor: f64,
    /// Value assigned on a `no-value` diagnosis.
    pub base_default: f64,
    /// Half-width of the bounded perturbation used on an `unknown`
    /// diagnosis — the one sanctioned use of randomness.
    pub perturbation: f64,
    /// Candidate-failure handling during Fork.
    pub hard_failure_policy: HardFailurePolicy,
    /// Maximum run reports retained by the loop engine.
    pub max_tracked_reports: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            shrink_factor: 0.7,
            growth_factor: 1.5,
            base_default: 1.0,
            perturbation: 0.1,
            hard_failure_policy: HardFailurePolicy::Diagnose,
            max_tracked_reports: 256,
        }
    }
}

// ── Evolution Attempt ───────────────────────────────────────────────

/// Record of one loop iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionAttempt {
    /// Generation index, counted from 0.
    pub generation: u32,
    /// Diagnosis when the attempt failed; `None` on acceptance.
    pub diagnosis: Option<Diagnosis>,
    /// Whether the mutation engine produced a new candidate after
    /// this attempt.
    pub mutated: bool,
    /// When the attempt was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl EvolutionAttempt {
    pub fn accepted(generation: u32) -> Self {
        Self {
            generation,
            diagnosis: None,
            mutated: false,
            recorded_at: Utc::now(),
        }
    }

    pub fn failed(generation: u32, diagnosis: Diagnosis, mutated: bool) -> Self {
        Self {
            generation,
            diagnosis: Some(diagnosis),
            mutated,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.diagnosis.is_some()
    }

    /// Audit-trail form of the attempt, tagged with its run id.
    pub fn to_value(&self, id: &EvolutionId) -> Value {
        let mut map = std::collections::BTreeMap::new();
        map.insert("evolution".to_string(), Value::Text(id.0.clone()));
        map.insert("generation".to_string(), Value::Int(self.generation as i64));
        map.insert(
            "reason".to_string(),
            match &self.diagnosis {
                Some(d) => Value::Symbol(d.reason.as_symbol()),
                None => Value::Null,
            },
        );
        map.insert("mutated".to_string(), Value::Bool(self.mutated));
        Value::Map(map)
    }
}

impl std::fmt::Display for EvolutionAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.diagnosis {
            Some(d) => write!(f, "gen {}: {} ({})", self.generation, d.reason, d.field),
            None => write!(f, "gen {}: accepted", self.generation),
        }
    }
}
