//! Modifier registry and the single-pass composer.
//!
//! Composition is the explicit second phase of the two-phase design:
//! dispatch may *add* modifiers to a record, and a distinct
//! [`compose`] call *applies* them. [`compose`] reads the record's
//! modifier list exactly once at entry; modifiers appended during the
//! pass ride along in the result but only fire on a later call.
//! Self-modification is therefore one-step-delayed, never same-step.

#![deny(unsafe_code)]

use std::collections::HashMap;

use graft_types::{GraftError, GraftResult, Modifier, Record};

// ── Composer ────────────────────────────────────────────────────────

/// Apply a record's own modifiers in insertion order.
///
/// Left-to-right sequential reduction over a snapshot of the modifier
/// list taken at entry: `m_n(...m_2(m_1(record)))`. A modifier error
/// aborts the pass and propagates.
pub fn compose(record: &Record) -> GraftResult<Record> {
    let snapshot: Vec<Modifier> = record.modifiers().to_vec();
    tracing::trace!(modifiers = snapshot.len(), "composing record");
    let mut current = record.clone();
    for modifier in &snapshot {
        current = modifier.apply(&current)?;
    }
    Ok(current)
}

// ── Modifier Registry ───────────────────────────────────────────────

/// Named modifier lookup table.
///
/// An owned registry value, not process-global state. External code
/// registers modifiers here and clones them into records' modifier
/// lists by name. Re-registration under an existing name is explicit
/// last-write-wins.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Modifier>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a modifier under its own name.
    pub fn register(&mut self, modifier: Modifier) {
        let name = modifier.name().to_string();
        if self.modifiers.contains_key(&name) {
            tracing::debug!(name = %name, "modifier re-registered, last write wins");
        } else {
            tracing::debug!(name = %name, "modifier registered");
        }
        self.modifiers.insert(name, modifier);
    }

    pub fn get(&self, name: &str) -> Option<&Modifier> {
        self.modifiers.get(name)
    }

    /// Clone a registered modifier into a record's modifier list.
    pub fn attach(&self, record: &Record, name: &str) -> GraftResult<Record> {
        let modifier = self
            .get(name)
            .ok_or_else(|| GraftError::Registry(format!("no modifier named '{name}'")))?;
        Ok(record.clone().with_modifier(modifier.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.modifiers.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modifiers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &self.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_types::Value;

    #[test]
    fn compose_applies_in_insertion_order() {
        let record = Record::new()
            .with_field("value", Value::Float(10.0))
            .with_modifier(Modifier::numeric("add-five", "value", |v| v + 5.0))
            .with_modifier(Modifier::numeric("double", "value", |v| v * 2.0));
        let out = compose(&record).unwrap();
        // (10 + 5) * 2, not 10 * 2 + 5.
        assert_eq!(out.get("value").unwrap().as_f64(), Some(30.0));
    }

    #[test]
    fn compose_with_no_modifiers_is_identity() {
        let record = Record::new().with_field("value", Value::Int(1));
        let out = compose(&record).unwrap();
        assert_eq!(out.get("value"), Some(&Value::Int(1)));
        assert_eq!(out.modifier_count(), 0);
    }

    #[test]
    fn snapshot_invariant_self_appended_modifier_is_delayed() {
        // m1 appends m3 while running; m2 increments. One compose call
        // must apply exactly m1 then m2 — m3 fires only next time.
        let m1 = Modifier::new("append-m3", |record: &Record| {
            Ok(record
                .clone()
                .with_modifier(Modifier::numeric("m3-double", "value", |v| v * 2.0)))
        });
        let m2 = Modifier::numeric("add-one", "value", |v| v + 1.0);
        let record = Record::new()
            .with_field("value", Value::Float(10.0))
            .with_modifier(m1)
            .with_modifier(m2);

        let first = compose(&record).unwrap();
        // m3's effect absent: 10 + 1, not (10 + 1) * 2 or 10 * 2 + 1.
        assert_eq!(first.get("value").unwrap().as_f64(), Some(11.0));
        // m3 itself rides along in the result.
        assert_eq!(first.modifier_count(), 3);

        let second = compose(&first).unwrap();
        // Second pass applies m1 (appends another m3), m2, then m3.
        assert_eq!(second.get("value").unwrap().as_f64(), Some(24.0));
        assert_eq!(second.modifier_count(), 4);
    }

    #[test]
    fn compose_error_aborts_and_propagates() {
        let record = Record::new()
            .with_field("value", Value::Float(1.0))
            .with_modifier(Modifier::new("boom", |_r: &Record| {
                Err(GraftError::Modifier("boom".into()))
            }))
            .with_modifier(Modifier::numeric("after", "value", |v| v + 1.0));
        let err = compose(&record).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn registry_register_and_attach() {
        let mut registry = ModifierRegistry::new();
        registry.register(Modifier::numeric("double", "value", |v| v * 2.0));
        assert!(registry.contains("double"));
        assert_eq!(registry.count(), 1);

        let record = Record::new().with_field("value", Value::Float(3.0));
        let record = registry.attach(&record, "double").unwrap();
        assert_eq!(record.modifier_count(), 1);
        let out = compose(&record).unwrap();
        assert_eq!(out.get("value").unwrap().as_f64(), Some(6.0));
    }

    #[test]
    fn registry_attach_unknown_name_errors() {
        let registry = ModifierRegistry::new();
        let err = registry.attach(&Record::new(), "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn registry_last_write_wins() {
        let mut registry = ModifierRegistry::new();
        registry.register(Modifier::numeric("scale", "value", |v| v * 2.0));
        registry.register(Modifier::numeric("scale", "value", |v| v * 3.0));
        assert_eq!(registry.count(), 1);

        let record = Record::new().with_field("value", Value::Float(2.0));
        let record = registry.attach(&record, "scale").unwrap();
        let out = compose(&record).unwrap();
        assert_eq!(out.get("value").unwrap().as_f64(), Some(6.0));
    }

    #[test]
    fn independent_registries_do_not_interfere() {
        let mut a = ModifierRegistry::new();
        let b = ModifierRegistry::new();
        a.register(Modifier::numeric("only-a", "value", |v| v));
        assert!(a.contains("only-a"));
        assert!(!b.contains("only-a"));
    }
}
