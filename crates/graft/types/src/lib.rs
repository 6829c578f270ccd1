//! Core value model for the graft substrate.
//!
//! A [`Record`] is the universal carrier: a map of symbolic field
//! names to [`Value`]s plus an owned, ordered list of [`Modifier`]s —
//! pure record-to-record functions the record carries as data. The
//! [`DispatchKey`] triple `(domain, action, variant)` is derived from
//! a record's reserved fields and selects a handler in `graft-router`.
//!
//! Records are value types: every transformation yields a new record.
//! The only shared mutable state anywhere in graft is the log cell in
//! `graft-ledger`.

#![deny(unsafe_code)]

pub mod error;
pub mod key;
pub mod modifier;
pub mod record;
pub mod value;

// ── Re-exports ──────────────────────────────────────────────────────

pub use error::{GraftError, GraftResult};
pub use key::DispatchKey;
pub use modifier::{Modifier, ModifierFn, ModifierMeta, Provenance};
pub use record::{
    is_bookkeeping_field, is_control_field, Record, DEFAULT_COMPONENT, FIELD_ACTION,
    FIELD_DOMAIN, FIELD_PROCESSED, FIELD_TIMELINE_KEPT, FIELD_VARIANT,
};
pub use value::{Symbol, Value};
