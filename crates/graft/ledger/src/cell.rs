//! The shared log cell — concurrent append over an immutable log.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::log::{Log, LogEntry};

/// Concurrency-safe shared cell holding a [`Log`].
///
/// The only mutable shared state in graft. `append` is an optimistic
/// read-modify-write loop over an atomic snapshot pointer: read the
/// current log, extend a copy, compare-and-swap, retry on contention.
/// Readers take snapshots without coordination and never observe a
/// torn write; each appended batch lands as one contiguous unit.
pub struct LogCell {
    inner: ArcSwap<Log>,
}

impl LogCell {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(Log::new()),
        }
    }

    pub fn with_log(log: Log) -> Self {
        Self {
            inner: ArcSwap::from_pointee(log),
        }
    }

    /// Atomically append a batch of entries.
    ///
    /// Retries unboundedly on contention; no backoff is needed at the
    /// scale the cell serves. An empty batch is a no-op.
    pub fn append(&self, items: impl IntoIterator<Item = LogEntry>) {
        let items: Vec<LogEntry> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        loop {
            let cur = self.inner.load_full();
            let next = Arc::new(cur.append(items.iter().cloned()));
            let prev = self.inner.compare_and_swap(&cur, next);
            if Arc::ptr_eq(&prev, &cur) {
                return;
            }
        }
    }

    /// Coordination-free snapshot of the current log.
    pub fn snapshot(&self) -> Arc<Log> {
        self.inner.load_full()
    }

    pub fn count(&self) -> usize {
        self.snapshot().count()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn head(&self) -> Option<LogEntry> {
        self.snapshot().head().cloned()
    }

    pub fn tail(&self) -> Option<LogEntry> {
        self.snapshot().tail().cloned()
    }
}

impl Default for LogCell {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCell")
            .field("entries", &self.count())
            .finish()
    }
}
