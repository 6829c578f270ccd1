//! Runtime context tying the graft components together.
//!
//! A [`Substrate`] owns one router, one modifier registry, one
//! evolution loop, and one shared audit journal. Registries are
//! explicit state on the context — multiple substrates coexist in a
//! process without interfering.
//!
//! The two-phase contract runs through here: [`Substrate::dispatch`]
//! routes a record to a handler, which may *attach* modifiers; a
//! separate [`Substrate::compose`] call *applies* them. Dispatch
//! never composes implicitly.

#![deny(unsafe_code)]

use std::sync::Arc;

use graft_compose::ModifierRegistry;
use graft_evolve::{EvolutionConfig, EvolutionLoop, EvolutionOutcome, EvolutionSummary};
use graft_ledger::LogCell;
use graft_router::Router;
use graft_types::{DispatchKey, GraftResult, Modifier, Record};

// ── Substrate ───────────────────────────────────────────────────────

/// The explicit runtime context for one engine instance.
pub struct Substrate {
    router: Router,
    modifiers: ModifierRegistry,
    evolution: EvolutionLoop,
    journal: Arc<LogCell>,
}

impl Substrate {
    /// Create a substrate with default configuration; evolution runs
    /// audit into the substrate's journal.
    pub fn new() -> Self {
        Self::with_evolution_config(EvolutionConfig::default())
    }

    pub fn with_evolution_config(config: EvolutionConfig) -> Self {
        let journal = Arc::new(LogCell::new());
        let evolution = EvolutionLoop::with_config(config).with_audit(Arc::clone(&journal));
        Self {
            router: Router::new(),
            modifiers: ModifierRegistry::new(),
            evolution,
            journal,
        }
    }

    /// Replace the evolution loop; it is re-wired to audit into this
    /// substrate's journal.
    pub fn with_evolution(mut self, evolution: EvolutionLoop) -> Self {
        self.evolution = evolution.with_audit(Arc::clone(&self.journal));
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    pub fn evolution(&self) -> &EvolutionLoop {
        &self.evolution
    }

    /// The shared audit journal; readers snapshot it at will.
    pub fn journal(&self) -> &Arc<LogCell> {
        &self.journal
    }

    /// Register a handler under a dispatch key.
    pub fn register_handler(
        &mut self,
        key: DispatchKey,
        handler: impl Fn(Record) -> GraftResult<Record> + Send + Sync + 'static,
    ) {
        self.router.register(key, handler);
    }

    /// Register a named modifier for later attachment.
    pub fn register_modifier(&mut self, modifier: Modifier) {
        self.modifiers.register(modifier);
    }

    /// Clone a registered modifier into a record's modifier list.
    pub fn attach_named(&self, record: &Record, name: &str) -> GraftResult<Record> {
        self.modifiers.attach(record, name)
    }

    /// Phase one: route the record to its handler.
    pub fn dispatch(&self, record: Record) -> GraftResult<Record> {
        self.router.dispatch(record)
    }

    /// Phase two: apply the record's own modifiers.
    pub fn compose(&self, record: &Record) -> GraftResult<Record> {
        graft_compose::compose(record)
    }

    /// Run one bounded evolution sequence against the substrate's
    /// loop; the attempt batch lands in the journal.
    pub fn evolve<P>(
        &mut self,
        record: &Record,
        candidate: Modifier,
        predicate: P,
    ) -> EvolutionOutcome
    where
        P: Fn(&Record) -> bool,
    {
        self.evolution.run(record, candidate, predicate)
    }

    /// Aggregate statistics over tracked evolution runs.
    pub fn summary(&self) -> EvolutionSummary {
        self.evolution.summary()
    }
}

impl Default for Substrate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Substrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Substrate")
            .field("handlers", &self.router.count())
            .field("modifiers", &self.modifiers.count())
            .field("journal_entries", &self.journal.count())
            .finish_non_exhaustive()
    }
}
