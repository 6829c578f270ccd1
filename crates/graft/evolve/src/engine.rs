//! The evolution loop — checkpoint, fork, evaluate, revert with
//! memory, mutate, retry.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use graft_ledger::LogCell;
use graft_types::{Modifier, Record, Value, FIELD_TIMELINE_KEPT};

use crate::checkpoint::Checkpoint;
use crate::diagnosis::{BandAnalyzer, Diagnosis, FailureAnalyzer};
use crate::mutation::{Mutator, RuleMutator};
use crate::report::{EvolutionReport, EvolutionSummary};
use crate::types::{
    EvolutionAttempt, EvolutionConfig, EvolutionId, EvolutionStatus, HardFailurePolicy,
    TimelineKept,
};

// ── Evolution Outcome ───────────────────────────────────────────────

/// What a caller of [`EvolutionLoop::run`] always receives — a record
/// plus status, never a raw error from the retry machinery.
#[derive(Clone, Debug)]
pub struct EvolutionOutcome {
    /// Identifier of this run.
    pub id: EvolutionId,
    /// The kept record: tentative on acceptance, reverted otherwise.
    pub record: Record,
    /// Terminal status.
    pub status: EvolutionStatus,
    /// Which timeline was kept.
    pub timeline_kept: TimelineKept,
    /// The accepted modifier, or the last candidate tried.
    pub final_modifier: Modifier,
    /// The abandoned (or restored) checkpoint, retained for audit.
    pub checkpoint: Checkpoint,
    /// Ordered, append-only attempt history.
    pub history: Vec<EvolutionAttempt>,
}

impl EvolutionOutcome {
    pub fn accepted(&self) -> bool {
        self.status.is_accepted()
    }

    /// Number of generations the run went through.
    pub fn generations(&self) -> u32 {
        self.history.len() as u32
    }
}

impl std::fmt::Display for EvolutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EvolutionOutcome({}, {}, generations={})",
            self.id,
            self.status,
            self.generations(),
        )
    }
}

// ── Failure Memo ────────────────────────────────────────────────────

/// Modifier appended to a reverted record so the kept timeline still
/// carries what was tried and why it was rejected. Applying it stamps
/// the failure onto a `last_failure` field.
fn failure_memo(rejected: &Modifier, diagnosis: &Diagnosis, tentative: Option<&Record>) -> Modifier {
    let mut info = BTreeMap::new();
    info.insert(
        "modifier".to_string(),
        Value::Text(rejected.name().to_string()),
    );
    info.insert(
        "reason".to_string(),
        Value::Symbol(diagnosis.reason.as_symbol()),
    );
    info.insert("detail".to_string(), Value::Text(diagnosis.detail.clone()));
    info.insert(
        "tentative".to_string(),
        match tentative {
            Some(record) => Value::Map(record.payload_fields()),
            None => Value::Null,
        },
    );
    let info = Value::Map(info);
    Modifier::new(format!("memo:{}", rejected.name()), move |record: &Record| {
        Ok(record.clone().with_field("last_failure", info.clone()))
    })
    .with_seed(rejected.name().to_string())
}

// ── Evolution Loop ──────────────────────────────────────────────────

/// Engine running bounded fork/evaluate/mutate cycles, with a bounded
/// FIFO of run reports.
///
/// The loop owns its mutator and analyzer behind trait objects so
/// callers can swap either; defaults are the rule mutator and a band
/// analyzer over the `value` field with no bounds.
pub struct EvolutionLoop {
    config: EvolutionConfig,
    mutator: Box<dyn Mutator>,
    analyzer: Box<dyn FailureAnalyzer>,
    audit: Option<Arc<LogCell>>,
    reports: VecDeque<EvolutionReport>,
}

impl EvolutionLoop {
    pub fn new() -> Self {
        Self::with_config(EvolutionConfig::default())
    }

    pub fn with_config(config: EvolutionConfig) -> Self {
        let mutator = RuleMutator::new(config.clone());
        Self {
            config,
            mutator: Box::new(mutator),
            analyzer: Box::new(BandAnalyzer::new("value")),
            audit: None,
            reports: VecDeque::new(),
        }
    }

    /// Swap the mutation engine.
    pub fn with_mutator(mut self, mutator: Box<dyn Mutator>) -> Self {
        self.mutator = mutator;
        self
    }

    /// Swap the failure analyzer.
    pub fn with_analyzer(mut self, analyzer: Box<dyn FailureAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Attach a shared log cell; every run appends its attempt batch.
    pub fn with_audit(mut self, audit: Arc<LogCell>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Run one bounded evolution sequence.
    ///
    /// The checkpoint is captured once here and held fixed across all
    /// retries. Every failed attempt reverts to it, so the exhaustion
    /// result's payload equals the pre-call payload.
    pub fn run<P>(&mut self, record: &Record, candidate: Modifier, predicate: P) -> EvolutionOutcome
    where
        P: Fn(&Record) -> bool,
    {
        let id = EvolutionId::new();
        let checkpoint = Checkpoint::capture(record);
        let max_attempts = self.config.max_attempts.max(1);

        let mut current = record.clone();
        let mut candidate = candidate;
        let mut history: Vec<EvolutionAttempt> = Vec::new();
        let mut terminal: Option<(EvolutionStatus, TimelineKept, Record)> = None;

        for generation in 0..max_attempts {
            // Fork: pure application onto the current record.
            let diagnosis = match candidate.apply(&current) {
                Ok(tentative) => {
                    // Evaluate.
                    if predicate(&tentative) {
                        tracing::debug!(run = %id, generation, "candidate accepted");
                        history.push(EvolutionAttempt::accepted(generation));
                        let kept = tentative.with_field(
                            FIELD_TIMELINE_KEPT,
                            Value::Symbol(TimelineKept::Accepted.as_symbol()),
                        );
                        terminal =
                            Some((EvolutionStatus::Accepted, TimelineKept::Accepted, kept));
                        break;
                    }
                    let diagnosis = self.analyzer.diagnose(&tentative);
                    tracing::debug!(
                        run = %id,
                        generation,
                        reason = %diagnosis.reason,
                        "candidate rejected, reverting",
                    );
                    // Revert with memory.
                    current = checkpoint
                        .restore(&current)
                        .with_field(
                            FIELD_TIMELINE_KEPT,
                            Value::Symbol(TimelineKept::Reverted.as_symbol()),
                        )
                        .with_modifier(failure_memo(&candidate, &diagnosis, Some(&tentative)));
                    diagnosis
                }
                Err(error) => {
                    let diagnosis = Diagnosis::hard_failure(error.to_string());
                    match self.config.hard_failure_policy {
                        HardFailurePolicy::Terminal => {
                            tracing::debug!(run = %id, generation, %error, "hard failure, terminal");
                            history.push(EvolutionAttempt::failed(generation, diagnosis, false));
                            let kept = current.clone().with_field(
                                FIELD_TIMELINE_KEPT,
                                Value::Symbol(TimelineKept::Reverted.as_symbol()),
                            );
                            terminal = Some((
                                EvolutionStatus::HardFailure(error.to_string()),
                                TimelineKept::Reverted,
                                kept,
                            ));
                            break;
                        }
                        HardFailurePolicy::Diagnose => {
                            tracing::debug!(run = %id, generation, %error, "hard failure, diagnosing");
                            current = current
                                .with_field(
                                    FIELD_TIMELINE_KEPT,
                                    Value::Symbol(TimelineKept::Reverted.as_symbol()),
                                )
                                .with_modifier(failure_memo(&candidate, &diagnosis, None));
                            diagnosis
                        }
                    }
                }
            };

            // Mutate while attempts remain.
            if generation + 1 < max_attempts {
                candidate = self.mutator.mutate(&candidate, &diagnosis);
                history.push(EvolutionAttempt::failed(generation, diagnosis, true));
            } else {
                history.push(EvolutionAttempt::failed(generation, diagnosis, false));
            }
        }

        let (status, timeline_kept, kept) = match terminal {
            Some(outcome) => outcome,
            // Exhaustion: the current record is the checkpoint payload
            // plus accumulated memos.
            None => (
                EvolutionStatus::MaxEvolutionReached,
                TimelineKept::Reverted,
                current,
            ),
        };

        if let Some(audit) = &self.audit {
            audit.append(history.iter().map(|attempt| attempt.to_value(&id)));
        }

        let report = EvolutionReport::from_history(id.clone(), status.clone(), &history);
        self.push_report(report);

        EvolutionOutcome {
            id,
            record: kept,
            status,
            timeline_kept,
            final_modifier: candidate,
            checkpoint,
            history,
        }
    }

    fn push_report(&mut self, report: EvolutionReport) {
        if self.reports.len() >= self.config.max_tracked_reports {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }

    /// Find a run report by id.
    pub fn find(&self, id: &EvolutionId) -> Option<&EvolutionReport> {
        self.reports.iter().find(|r| r.id == *id)
    }

    pub fn reports(&self) -> &VecDeque<EvolutionReport> {
        &self.reports
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    /// Summary statistics over the tracked reports.
    pub fn summary(&self) -> EvolutionSummary {
        let total = self.reports.len();
        let accepted = self.reports.iter().filter(|r| r.accepted()).count();
        let exhausted = self
            .reports
            .iter()
            .filter(|r| r.status.is_exhausted())
            .count();
        let hard_failures = self
            .reports
            .iter()
            .filter(|r| matches!(r.status, EvolutionStatus::HardFailure(_)))
            .count();
        let total_generations = self.reports.iter().map(|r| r.generations as usize).sum();

        EvolutionSummary {
            total_runs: total,
            accepted_runs: accepted,
            exhausted_runs: exhausted,
            hard_failures,
            total_generations,
        }
    }
}

impl Default for EvolutionLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EvolutionLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionLoop")
            .field("config", &self.config)
            .field("reports", &self.reports.len())
            .finish_non_exhaustive()
    }
}
