//! The evolution loop — bounded checkpoint/fork/evaluate/mutate
//! cycles over records.
//!
//! A caller hands [`EvolutionLoop::run`] a record, a candidate
//! modifier, and a success predicate. The loop checkpoints the
//! record's payload once, tentatively applies the candidate, and
//! evaluates the result:
//!
//! - **Accepted** — the tentative record is committed and tagged
//!   `timeline_kept = accepted`.
//! - **Reverted** — the checkpoint is restored, the failure is
//!   diagnosed, a failure-memo modifier is appended (a reverted
//!   timeline is never information-free), and the mutation engine
//!   rewrites the candidate for the next generation.
//!
//! The attempt counter is the loop's only bound and its only
//! cancellation mechanism; exhaustion is a reported status, never an
//! error. With an audit cell attached, every run appends its attempt
//! batch to the shared append-only log.

#![deny(unsafe_code)]

pub mod checkpoint;
pub mod diagnosis;
pub mod engine;
pub mod mutation;
pub mod report;
pub mod types;

// ── Re-exports ──────────────────────────────────────────────────────

pub use checkpoint::Checkpoint;
pub use diagnosis::{BandAnalyzer, Diagnosis, FailureAnalyzer, FailureReason};
pub use engine::{EvolutionLoop, EvolutionOutcome};
pub use mutation::{Mutator, RuleMutator};
pub use report::{EvolutionReport, EvolutionSummary};
pub use types::{
    EvolutionAttempt, EvolutionConfig, EvolutionId, EvolutionStatus, HardFailurePolicy,
    TimelineKept,
};
