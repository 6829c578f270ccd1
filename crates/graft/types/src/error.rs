//! Error types shared across the graft crates.

use thiserror::Error;

/// Errors surfaced by graft operations.
///
/// Routing misses and predicate-false outcomes are not errors; only
/// handler and modifier failures travel this path.
#[derive(Debug, Error)]
pub enum GraftError {
    /// A handler reported a domain-specific failure.
    #[error("handler error: {0}")]
    Handler(String),

    /// A modifier function failed while transforming a record.
    #[error("modifier error: {0}")]
    Modifier(String),

    /// A field required by the operation is absent.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A field held a value of an unexpected kind.
    #[error("field '{field}' is not {expected}")]
    FieldType { field: String, expected: String },

    /// A registry lookup failed.
    #[error("registry error: {0}")]
    Registry(String),
}

/// Result type for graft operations.
pub type GraftResult<T> = Result<T, GraftError>;
