//! Checkpoints — immutable pre-tentative snapshots used for revert.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use graft_types::{is_bookkeeping_field, is_control_field, Record, Value};

/// Snapshot of a record's payload fields.
///
/// Excludes the three dispatch-key fields and candidate bookkeeping
/// (`timeline_kept`). Captured once at the top of an evolution run
/// and held fixed across the whole retry sequence; its lifetime ends
/// when the loop commits or returns the reverted record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    fields: BTreeMap<String, Value>,
    pub taken_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Capture the payload of `record`.
    pub fn capture(record: &Record) -> Self {
        Self {
            fields: record.payload_fields(),
            taken_at: Utc::now(),
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Restore the snapshot onto `target`: payload fields come from
    /// the checkpoint; control fields, bookkeeping, and the modifier
    /// list stay with `target`.
    pub fn restore(&self, target: &Record) -> Record {
        let mut restored = target.clone();
        let stale: Vec<String> = restored
            .fields()
            .keys()
            .filter(|name| !is_control_field(name) && !is_bookkeeping_field(name))
            .cloned()
            .collect();
        for name in stale {
            restored = restored.without_field(&name);
        }
        for (name, value) in &self.fields {
            restored = restored.with_field(name.clone(), value.clone());
        }
        restored
    }

    /// Whether `record`'s payload matches this snapshot field for
    /// field.
    pub fn matches_payload(&self, record: &Record) -> bool {
        record.payload_fields() == self.fields
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Checkpoint({} fields)", self.fields.len())
    }
}
