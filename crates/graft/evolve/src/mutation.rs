//! The mutation engine — deterministic, table-driven modifier
//! rewriting.

use rand::Rng;

use graft_types::{Modifier, Provenance, Record, Value};

use crate::diagnosis::{Diagnosis, FailureReason};
use crate::types::EvolutionConfig;

// ── Mutator Trait ───────────────────────────────────────────────────

/// Produces a new candidate modifier from a failed one and its
/// diagnosis.
pub trait Mutator: Send + Sync {
    fn mutate(&self, current: &Modifier, diagnosis: &Diagnosis) -> Modifier;

    /// Name of this mutator.
    fn name(&self) -> &str;
}

// ── Corrective Adjustment ───────────────────────────────────────────

/// Numeric correction resolved from the rewrite table at mutation
/// time, so the generated modifier is itself a pure function.
#[derive(Clone, Copy, Debug)]
enum Adjustment {
    /// Multiply the diagnosed field.
    Scale(f64),
    /// Set the diagnosed field outright.
    Assign(f64),
    /// Shift the diagnosed field by a pre-drawn delta.
    Nudge(f64),
}

impl Adjustment {
    fn apply(self, value: Option<f64>) -> Option<f64> {
        match self {
            Self::Scale(factor) => value.map(|v| v * factor),
            Self::Assign(x) => Some(x),
            Self::Nudge(delta) => value.map(|v| v + delta),
        }
    }
}

// ── Rule Mutator ────────────────────────────────────────────────────

/// Default mutation engine.
///
/// Wraps the failed candidate in a new modifier that applies the
/// original, then a corrective adjustment keyed by the symbolic
/// reason: `too-high` scales down, `too-low` scales up, `no-value`
/// assigns the configured base default, and `unknown`/`hard-failure`
/// nudge by a bounded random delta — the single sanctioned use of
/// randomness, drawn once per mutation so each generated modifier
/// stays pure.
pub struct RuleMutator {
    config: EvolutionConfig,
}

impl RuleMutator {
    pub fn new(config: EvolutionConfig) -> Self {
        Self { config }
    }

    fn adjustment_for(&self, reason: FailureReason) -> Adjustment {
        match reason {
            FailureReason::TooHigh => Adjustment::Scale(self.config.shrink_factor),
            FailureReason::TooLow => Adjustment::Scale(self.config.growth_factor),
            FailureReason::NoValue => Adjustment::Assign(self.config.base_default),
            FailureReason::HardFailure | FailureReason::Unknown => {
                let bound = self.config.perturbation.abs();
                let delta = rand::thread_rng().gen_range(-bound..=bound);
                Adjustment::Nudge(delta)
            }
        }
    }
}

impl Default for RuleMutator {
    fn default() -> Self {
        Self::new(EvolutionConfig::default())
    }
}

impl Mutator for RuleMutator {
    fn mutate(&self, current: &Modifier, diagnosis: &Diagnosis) -> Modifier {
        let generation = current.generation() + 1;
        let adjustment = self.adjustment_for(diagnosis.reason);
        let field = diagnosis.field.clone();
        let name = format!("{}~{}", current.name(), diagnosis.reason);
        let seed = current
            .meta()
            .seed
            .clone()
            .unwrap_or_else(|| current.name().to_string());
        let inner = current.clone();

        tracing::debug!(
            parent = %current.name(),
            reason = %diagnosis.reason,
            generation,
            ?adjustment,
            "mutating candidate",
        );

        Modifier::new(name, move |record: &Record| {
            let stepped = inner.apply(record)?;
            let value = stepped.get(&field).and_then(Value::as_f64);
            Ok(match adjustment.apply(value) {
                Some(corrected) => stepped.with_field(field.clone(), Value::Float(corrected)),
                None => stepped,
            })
        })
        .with_seed(seed)
        .with_provenance(Provenance {
            parent: current.name().to_string(),
            reason: diagnosis.reason.as_symbol(),
            generation,
        })
    }

    fn name(&self) -> &str {
        "rule-mutator"
    }
}
