//! Append-only history store for the graft substrate.
//!
//! Two modes, one invariant. [`Log`] is a plain immutable value —
//! `append` returns a new log and implies no concurrency guarantee.
//! [`LogCell`] wraps a log in a lock-free shared cell whose atomic
//! compare-and-swap append linearizes concurrent writers: batches
//! land whole, in some valid interleaving, and are never edited or
//! removed afterwards.
//!
//! The evolution loop in `graft-evolve` uses a cell as its audit
//! trail; external persistence layers read it through snapshots with
//! no further coordination.

#![deny(unsafe_code)]

pub mod cell;
pub mod log;

// ── Re-exports ──────────────────────────────────────────────────────

pub use cell::LogCell;
pub use log::{Log, LogEntry};
