//! Dispatch keys — the symbolic triple that selects a handler.

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::Symbol;

/// The `(domain, action, variant)` triple.
///
/// Always derived from a record, never stored back into one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchKey {
    pub domain: Symbol,
    pub action: Symbol,
    pub variant: Symbol,
}

impl DispatchKey {
    pub fn new(
        domain: impl Into<Symbol>,
        action: impl Into<Symbol>,
        variant: impl Into<Symbol>,
    ) -> Self {
        Self {
            domain: domain.into(),
            action: action.into(),
            variant: variant.into(),
        }
    }

    /// Derive the normalized key for a record; absent components
    /// become the `"default"` symbol.
    pub fn of(record: &Record) -> Self {
        Self {
            domain: record.domain(),
            action: record.action(),
            variant: record.variant(),
        }
    }
}

impl std::fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.domain, self.action, self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn derivation_normalizes_missing_components() {
        let r = Record::new().with_field("domain", Value::symbol("billing"));
        let key = DispatchKey::of(&r);
        assert_eq!(key, DispatchKey::new("billing", "default", "default"));
    }

    #[test]
    fn equal_records_derive_equal_keys() {
        let a = Record::new().with_key("ui", "render", "compact");
        let b = Record::new()
            .with_key("ui", "render", "compact")
            .with_field("payload", Value::Int(9));
        assert_eq!(DispatchKey::of(&a), DispatchKey::of(&b));
    }

    #[test]
    fn display_joins_with_slashes() {
        let key = DispatchKey::new("a", "b", "c");
        assert_eq!(key.to_string(), "a/b/c");
    }

    #[test]
    fn keys_hash_by_value() {
        use std::collections::HashMap;
        let mut table = HashMap::new();
        table.insert(DispatchKey::new("a", "b", "c"), 1);
        assert_eq!(table.get(&DispatchKey::new("a", "b", "c")), Some(&1));
        assert_eq!(table.get(&DispatchKey::new("a", "b", "d")), None);
    }
}
