//! The universal record — a field map plus an owned modifier list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::modifier::Modifier;
use crate::value::{Symbol, Value};

// ── Reserved Field Names ────────────────────────────────────────────

/// Dispatch-key component: domain.
pub const FIELD_DOMAIN: &str = "domain";
/// Dispatch-key component: action.
pub const FIELD_ACTION: &str = "action";
/// Dispatch-key component: variant.
pub const FIELD_VARIANT: &str = "variant";
/// Flag set by the fallback handler.
pub const FIELD_PROCESSED: &str = "processed";
/// Which timeline the evolution loop kept: `accepted` or `reverted`.
pub const FIELD_TIMELINE_KEPT: &str = "timeline_kept";
/// Normalized value for absent dispatch-key components.
pub const DEFAULT_COMPONENT: &str = "default";

/// Whether `name` is one of the three dispatch-key fields.
pub fn is_control_field(name: &str) -> bool {
    matches!(name, FIELD_DOMAIN | FIELD_ACTION | FIELD_VARIANT)
}

/// Whether `name` is transient candidate bookkeeping.
pub fn is_bookkeeping_field(name: &str) -> bool {
    name == FIELD_TIMELINE_KEPT
}

// ── Record ──────────────────────────────────────────────────────────

/// The universal data carrier.
///
/// A record is a value type: every transformation yields a new record,
/// and nothing mutates one in place across an API boundary. The three
/// reserved control fields route it; the modifier list carries its own
/// future behavior; everything else is domain payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
    // Closures are not data; modifiers do not survive serialization.
    #[serde(skip)]
    modifiers: Vec<Modifier>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the three dispatch-key components at once.
    pub fn with_key(
        self,
        domain: impl Into<Symbol>,
        action: impl Into<Symbol>,
        variant: impl Into<Symbol>,
    ) -> Self {
        self.with_field(FIELD_DOMAIN, Value::Symbol(domain.into()))
            .with_field(FIELD_ACTION, Value::Symbol(action.into()))
            .with_field(FIELD_VARIANT, Value::Symbol(variant.into()))
    }

    /// Builder: set one field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder: remove one field.
    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Builder: append a modifier to the owned list.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Payload view: all fields minus dispatch-key and bookkeeping
    /// fields. This is what checkpoints snapshot and restores compare.
    pub fn payload_fields(&self) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| !is_control_field(name) && !is_bookkeeping_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether the fallback handler has marked this record.
    pub fn processed(&self) -> bool {
        self.get(FIELD_PROCESSED).and_then(Value::as_bool).unwrap_or(false)
    }

    fn key_component(&self, field: &str) -> Symbol {
        match self.get(field) {
            Some(Value::Symbol(s)) => s.clone(),
            Some(Value::Text(t)) => Symbol::new(t.clone()),
            _ => Symbol::default(),
        }
    }

    /// Domain component, normalized to `"default"` when absent.
    pub fn domain(&self) -> Symbol {
        self.key_component(FIELD_DOMAIN)
    }

    /// Action component, normalized to `"default"` when absent.
    pub fn action(&self) -> Symbol {
        self.key_component(FIELD_ACTION)
    }

    /// Variant component, normalized to `"default"` when absent.
    pub fn variant(&self) -> Symbol {
        self.key_component(FIELD_VARIANT)
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Record({}/{}/{}, fields={}, modifiers={})",
            self.domain(),
            self.action(),
            self.variant(),
            self.field_count(),
            self.modifier_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformations_yield_new_records() {
        let base = Record::new().with_field("value", Value::Int(1));
        let bumped = base.clone().with_field("value", Value::Int(2));
        assert_eq!(base.get("value"), Some(&Value::Int(1)));
        assert_eq!(bumped.get("value"), Some(&Value::Int(2)));
    }

    #[test]
    fn key_components_default_when_absent() {
        let r = Record::new();
        assert_eq!(r.domain().as_str(), "default");
        assert_eq!(r.action().as_str(), "default");
        assert_eq!(r.variant().as_str(), "default");
    }

    #[test]
    fn key_components_accept_symbols_and_text() {
        let r = Record::new()
            .with_field(FIELD_DOMAIN, Value::symbol("billing"))
            .with_field(FIELD_ACTION, Value::Text("charge".into()));
        assert_eq!(r.domain().as_str(), "billing");
        assert_eq!(r.action().as_str(), "charge");
        assert_eq!(r.variant().as_str(), "default");
    }

    #[test]
    fn non_symbolic_key_component_normalizes() {
        let r = Record::new().with_field(FIELD_DOMAIN, Value::Int(5));
        assert_eq!(r.domain().as_str(), "default");
    }

    #[test]
    fn payload_excludes_control_and_bookkeeping() {
        let r = Record::new()
            .with_key("a", "b", "c")
            .with_field("value", Value::Int(50))
            .with_field(FIELD_TIMELINE_KEPT, Value::symbol("reverted"));
        let payload = r.payload_fields();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get("value"), Some(&Value::Int(50)));
    }

    #[test]
    fn processed_flag_reads() {
        let r = Record::new();
        assert!(!r.processed());
        let r = r.with_field(FIELD_PROCESSED, true);
        assert!(r.processed());
    }

    #[test]
    fn modifiers_are_owned_per_record() {
        let m = Modifier::new("noop", |r: &Record| Ok(r.clone()));
        let a = Record::new().with_modifier(m);
        let b = a.clone();
        assert_eq!(a.modifier_count(), 1);
        assert_eq!(b.modifier_count(), 1);
        let b = b.with_modifier(Modifier::new("extra", |r: &Record| Ok(r.clone())));
        assert_eq!(a.modifier_count(), 1);
        assert_eq!(b.modifier_count(), 2);
    }

    #[test]
    fn display_summarizes() {
        let r = Record::new()
            .with_key("ui", "render", "default")
            .with_field("value", Value::Int(1));
        let display = r.to_string();
        assert!(display.contains("ui/render/default"));
        assert!(display.contains("fields=4"));
    }

    #[test]
    fn serde_skips_modifiers() {
        let r = Record::new()
            .with_field("value", Value::Int(1))
            .with_modifier(Modifier::new("noop", |r: &Record| Ok(r.clone())));
        let json = serde_json::to_string(&r).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("value"), Some(&Value::Int(1)));
        assert_eq!(back.modifier_count(), 0);
    }
}
