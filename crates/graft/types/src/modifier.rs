//! Modifiers — pure record-to-record functions carried inside records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::error::GraftResult;
use crate::record::Record;
use crate::value::{Symbol, Value};

/// Function signature of a modifier body.
pub type ModifierFn = dyn Fn(&Record) -> GraftResult<Record> + Send + Sync;

// ── Provenance ──────────────────────────────────────────────────────

/// Lineage of a modifier produced by the mutation engine.
///
/// Together with the evolution history this reconstructs the full
/// chain from seed modifier to final candidate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the modifier this one evolved from.
    pub parent: String,
    /// Symbolic reason that triggered the rewrite.
    pub reason: Symbol,
    /// Generation index, counted from the seed at 0.
    pub generation: u32,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <- {} ({})", self.generation, self.parent, self.reason)
    }
}

// ── Modifier Metadata ───────────────────────────────────────────────

/// Introspection metadata attached to a modifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModifierMeta {
    /// Name of the seed function this modifier originates from.
    pub seed: Option<String>,
    /// Field sets the modifier was derived from.
    pub derived_from: Vec<String>,
    /// When the modifier was created.
    pub created_at: DateTime<Utc>,
    /// Mutation lineage, if the mutation engine produced this modifier.
    pub provenance: Option<Provenance>,
}

impl Default for ModifierMeta {
    fn default() -> Self {
        Self {
            seed: None,
            derived_from: Vec::new(),
            created_at: Utc::now(),
            provenance: None,
        }
    }
}

// ── Modifier ────────────────────────────────────────────────────────

/// A named pure function `Record -> Record`, stored by value inside
/// records.
///
/// The closure must not capture hidden mutable environment; everything
/// it needs is closed over explicitly. Failures returned by the
/// closure are "hard failures" to the evolution loop, distinct from a
/// predicate rejecting the result.
#[derive(Clone)]
pub struct Modifier {
    name: String,
    func: Arc<ModifierFn>,
    meta: ModifierMeta,
}

impl Modifier {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&Record) -> GraftResult<Record> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
            meta: ModifierMeta::default(),
        }
    }

    /// A modifier that maps a numeric field through `f`, leaving the
    /// record unchanged when the field is absent or non-numeric.
    pub fn numeric(
        name: impl Into<String>,
        field: impl Into<String>,
        f: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        let field = field.into();
        let derived = field.clone();
        let mut modifier = Self::new(name, move |record: &Record| {
            match record.get(&field).and_then(Value::as_f64) {
                Some(v) => Ok(record.clone().with_field(field.clone(), Value::Float(f(v)))),
                None => Ok(record.clone()),
            }
        });
        modifier.meta.derived_from.push(derived);
        modifier
    }

    /// A modifier that sets `field` to a fixed value.
    pub fn assign(
        name: impl Into<String>,
        field: impl Into<String>,
        value: Value,
    ) -> Self {
        let field = field.into();
        let derived = field.clone();
        let mut modifier = Self::new(name, move |record: &Record| {
            Ok(record.clone().with_field(field.clone(), value.clone()))
        });
        modifier.meta.derived_from.push(derived);
        modifier
    }

    pub fn with_meta(mut self, meta: ModifierMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.meta.seed = Some(seed.into());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.meta.provenance = Some(provenance);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &ModifierMeta {
        &self.meta
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.meta.provenance.as_ref()
    }

    /// Generation index of this modifier (0 for seeds).
    pub fn generation(&self) -> u32 {
        self.meta.provenance.as_ref().map(|p| p.generation).unwrap_or(0)
    }

    /// Apply the modifier, producing a new record.
    pub fn apply(&self, record: &Record) -> GraftResult<Record> {
        (self.func)(record)
    }
}

impl std::fmt::Debug for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modifier")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.meta.provenance {
            Some(p) => write!(f, "{} (gen {})", self.name, p.generation),
            None => write!(f, "{}", self.name),
        }
    }
}

// The closure is not data; only name and metadata serialize.
impl Serialize for Modifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Modifier", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("meta", &self.meta)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_produces_new_record() {
        let m = Modifier::new("bump", |r: &Record| {
            Ok(r.clone().with_field("n", Value::Int(1)))
        });
        let before = Record::new();
        let after = m.apply(&before).unwrap();
        assert_eq!(after.get("n"), Some(&Value::Int(1)));
        assert_eq!(before.get("n"), None);
    }

    #[test]
    fn numeric_maps_int_and_float() {
        let double = Modifier::numeric("double", "value", |v| v * 2.0);
        let r = Record::new().with_field("value", Value::Int(50));
        let out = double.apply(&r).unwrap();
        assert_eq!(out.get("value").unwrap().as_f64(), Some(100.0));
    }

    #[test]
    fn numeric_leaves_missing_field_alone() {
        let double = Modifier::numeric("double", "value", |v| v * 2.0);
        let r = Record::new().with_field("other", Value::Int(1));
        let out = double.apply(&r).unwrap();
        assert_eq!(out.get("value"), None);
        assert_eq!(out.get("other"), Some(&Value::Int(1)));
    }

    #[test]
    fn assign_sets_field() {
        let set = Modifier::assign("seed-value", "value", Value::Float(10.0));
        let out = set.apply(&Record::new()).unwrap();
        assert_eq!(out.get("value"), Some(&Value::Float(10.0)));
    }

    #[test]
    fn provenance_and_generation() {
        let seed = Modifier::numeric("seed", "value", |v| v);
        assert_eq!(seed.generation(), 0);

        let evolved = Modifier::numeric("seed~too-high", "value", |v| v * 0.7)
            .with_seed("seed")
            .with_provenance(Provenance {
                parent: "seed".into(),
                reason: Symbol::new("too-high"),
                generation: 1,
            });
        assert_eq!(evolved.generation(), 1);
        assert_eq!(evolved.provenance().unwrap().parent, "seed");
        assert_eq!(evolved.meta().seed.as_deref(), Some("seed"));
    }

    #[test]
    fn display_includes_generation() {
        let m = Modifier::new("scale", |r: &Record| Ok(r.clone())).with_provenance(Provenance {
            parent: "seed".into(),
            reason: Symbol::new("too-low"),
            generation: 3,
        });
        assert_eq!(m.to_string(), "scale (gen 3)");
    }

    #[test]
    fn serialize_emits_metadata_only() {
        let m = Modifier::numeric("double", "value", |v| v * 2.0);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["name"], "double");
        assert!(json["meta"]["created_at"].is_string());
        assert!(json.get("func").is_none());
    }
}
