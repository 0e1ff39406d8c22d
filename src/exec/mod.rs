//! Clause execution engine.
//!
//! The operator surface for the CREATE write path: the per-row context, the
//! vertex/edge materializer, and the clause driver that plugs into the
//! pull-based iterator tree.

/// Per-row execution state: output slots, name bindings, path accumulation.
pub mod context;

/// CREATE clause driver and the upstream row-source protocol.
pub mod create;

/// Entity inserter.
pub mod insert;

/// Existence validator for reused entities.
pub mod validate;

mod materialize;

pub use context::{NameBinding, PathAccumulator, RowContext};
pub use create::{ClauseMode, CreateClause, RowSource, ValuesSource};
pub use insert::insert_entity;
pub use validate::still_exists;
