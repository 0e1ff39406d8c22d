//! Error handling for clause execution.
//!
//! All public APIs return `Result<T, ExecError>`. Every failure aborts the
//! in-progress statement; there is no local recovery inside this crate.
//! Rolling back rows already written is the surrounding transaction's job.

use std::io;

use thiserror::Error;

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors that can occur while executing a CREATE clause.
#[derive(Debug, Error)]
pub enum ExecError {
    /// I/O error surfaced by the storage engine.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The pattern requests something the executor does not support,
    /// e.g. an edge with no declared direction, or a rescan of the clause.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    /// A storage-level constraint rejected an inserted row.
    ///
    /// Raised by the storage engine during insertion and surfaced verbatim;
    /// insertion is never retried.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A reused entity no longer exists.
    ///
    /// The variable was bound earlier in the statement and has since been
    /// deleted, either directly by name or indirectly through another
    /// variable bound to the same row.
    #[error("entity assigned to variable {variable} was deleted")]
    StaleReference {
        /// Name of the variable whose binding went stale.
        variable: String,
    },

    /// A bound value did not resolve to the expected kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the pattern requires at this position.
        expected: &'static str,
        /// Kind actually found in the row context.
        found: &'static str,
    },

    /// Malformed input: invalid pattern shape, missing slot, misuse of the
    /// clause lifecycle.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A catalog lookup failed.
    #[error("{0} not found")]
    NotFound(&'static str),
}
