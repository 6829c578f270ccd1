//! Dispatch engine — routes records to handlers by symbolic triple.
//!
//! A [`Router`] owns an open table from [`DispatchKey`] to handler
//! plus one mandatory fallback for unmatched keys. Exact-match lookup
//! only; no wildcards or key hierarchies. Dispatch itself never
//! fails — only handlers do, and their errors propagate unchanged.
//!
//! Routers are explicit values owned by their callers. Independent
//! routers never interfere; registration is a method, not a
//! process-global side effect.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use graft_types::{DispatchKey, GraftResult, Record, FIELD_PROCESSED};

/// Handler function stored in the dispatch table.
pub type Handler = Arc<dyn Fn(Record) -> GraftResult<Record> + Send + Sync>;

// ── Router ──────────────────────────────────────────────────────────

/// Open handler table with exact-match lookup and a mandatory
/// fallback.
#[derive(Clone)]
pub struct Router {
    handlers: HashMap<DispatchKey, Handler>,
    fallback: Handler,
}

impl Router {
    /// Create a router with the default fallback, which marks the
    /// record `processed = true` and changes nothing else.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(|record: Record| {
                Ok(record.with_field(FIELD_PROCESSED, true))
            }),
        }
    }

    /// Replace the fallback handler.
    pub fn with_fallback(
        mut self,
        fallback: impl Fn(Record) -> GraftResult<Record> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    /// Register a handler under a key.
    ///
    /// Open extension: entries may be added at any time.
    /// Re-registration under the same key is explicit last-write-wins.
    pub fn register(
        &mut self,
        key: DispatchKey,
        handler: impl Fn(Record) -> GraftResult<Record> + Send + Sync + 'static,
    ) {
        if self.handlers.contains_key(&key) {
            tracing::debug!(key = %key, "handler re-registered, last write wins");
        } else {
            tracing::debug!(key = %key, "handler registered");
        }
        self.handlers.insert(key, Arc::new(handler));
    }

    /// Register under `(domain, action, variant)` given as names.
    pub fn register_fn(
        &mut self,
        domain: &str,
        action: &str,
        variant: &str,
        handler: impl Fn(Record) -> GraftResult<Record> + Send + Sync + 'static,
    ) {
        self.register(DispatchKey::new(domain, action, variant), handler);
    }

    /// Route a record to its handler.
    ///
    /// Derives the normalized key, looks it up exactly, and invokes
    /// either the matched handler or the fallback. Handler errors
    /// propagate to the caller unchanged.
    pub fn dispatch(&self, record: Record) -> GraftResult<Record> {
        let key = DispatchKey::of(&record);
        match self.handlers.get(&key) {
            Some(handler) => {
                tracing::trace!(key = %key, "dispatching to handler");
                handler(record)
            }
            None => {
                tracing::trace!(key = %key, "no handler, dispatching to fallback");
                (self.fallback)(record)
            }
        }
    }

    pub fn contains(&self, key: &DispatchKey) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn count(&self) -> usize {
        self.handlers.len()
    }

    pub fn keys(&self) -> Vec<&DispatchKey> {
        self.handlers.keys().collect()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("handlers", &self.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_types::{GraftError, Value};

    fn tagged(tag: &'static str) -> impl Fn(Record) -> GraftResult<Record> + Send + Sync {
        move |record: Record| Ok(record.with_field("handled_by", tag))
    }

    #[test]
    fn dispatch_exact_match() {
        let mut router = Router::new();
        router.register_fn("billing", "charge", "default", tagged("billing-charge"));
        let record = Record::new().with_key("billing", "charge", "default");
        let out = router.dispatch(record).unwrap();
        assert_eq!(out.get("handled_by").unwrap().as_text(), Some("billing-charge"));
    }

    #[test]
    fn dispatch_normalizes_missing_components() {
        let mut router = Router::new();
        router.register_fn("billing", "default", "default", tagged("billing-any"));
        // Only the domain is present; action and variant normalize.
        let record = Record::new().with_field("domain", Value::symbol("billing"));
        let out = router.dispatch(record).unwrap();
        assert_eq!(out.get("handled_by").unwrap().as_text(), Some("billing-any"));
    }

    #[test]
    fn unmatched_key_falls_back_and_marks_processed() {
        let router = Router::new();
        let record = Record::new()
            .with_key("nowhere", "nothing", "never")
            .with_field("payload", Value::Int(7));
        let out = router.dispatch(record).unwrap();
        assert!(out.processed());
        // Fallback alters nothing else.
        assert_eq!(out.get("payload"), Some(&Value::Int(7)));
        assert_eq!(out.domain().as_str(), "nowhere");
    }

    #[test]
    fn no_partial_matching() {
        let mut router = Router::new();
        router.register_fn("ui", "render", "compact", tagged("compact"));
        let record = Record::new().with_key("ui", "render", "full");
        let out = router.dispatch(record).unwrap();
        assert!(out.processed());
        assert_eq!(out.get("handled_by"), None);
    }

    #[test]
    fn dispatch_determinism() {
        let mut router = Router::new();
        router.register_fn("a", "b", "c", tagged("first"));
        for _ in 0..10 {
            let out = router
                .dispatch(Record::new().with_key("a", "b", "c"))
                .unwrap();
            assert_eq!(out.get("handled_by").unwrap().as_text(), Some("first"));
        }
    }

    #[test]
    fn re_registration_is_last_write_wins() {
        let mut router = Router::new();
        router.register_fn("a", "b", "c", tagged("first"));
        router.register_fn("a", "b", "c", tagged("second"));
        assert_eq!(router.count(), 1);
        let out = router
            .dispatch(Record::new().with_key("a", "b", "c"))
            .unwrap();
        assert_eq!(out.get("handled_by").unwrap().as_text(), Some("second"));
    }

    #[test]
    fn handler_errors_propagate_unchanged() {
        let mut router = Router::new();
        router.register_fn("a", "b", "c", |_record| {
            Err(GraftError::Handler("payment gateway down".into()))
        });
        let err = router
            .dispatch(Record::new().with_key("a", "b", "c"))
            .unwrap_err();
        assert!(err.to_string().contains("payment gateway down"));
    }

    #[test]
    fn custom_fallback() {
        let router = Router::new()
            .with_fallback(|record| Ok(record.with_field("routed", false)));
        let out = router.dispatch(Record::new()).unwrap();
        assert_eq!(out.get("routed"), Some(&Value::Bool(false)));
    }

    #[test]
    fn independent_routers_do_not_interfere() {
        let mut a = Router::new();
        let b = Router::new();
        a.register_fn("x", "y", "z", tagged("a-only"));
        assert!(a.contains(&DispatchKey::new("x", "y", "z")));
        assert!(!b.contains(&DispatchKey::new("x", "y", "z")));
        assert_eq!(b.count(), 0);
    }

    #[test]
    fn handlers_may_attach_modifiers_without_applying_them() {
        use graft_types::Modifier;
        let mut router = Router::new();
        router.register_fn("ui", "prepare", "default", |record: Record| {
            Ok(record.with_modifier(Modifier::numeric("double", "value", |v| v * 2.0)))
        });
        let record = Record::new()
            .with_key("ui", "prepare", "default")
            .with_field("value", Value::Int(10));
        let out = router.dispatch(record).unwrap();
        // Dispatch adds behavior as data; nothing fired.
        assert_eq!(out.modifier_count(), 1);
        assert_eq!(out.get("value"), Some(&Value::Int(10)));
    }

    #[test]
    fn registry_introspection() {
        let mut router = Router::new();
        router.register_fn("a", "b", "c", tagged("x"));
        router.register_fn("d", "e", "f", tagged("y"));
        assert_eq!(router.count(), 2);
        assert_eq!(router.keys().len(), 2);
    }
}
