//! Write-path execution engine for graph-pattern CREATE clauses.
//!
//! Given a planner-produced [`Pattern`](pattern::Pattern) of vertices and
//! edges, some bound to existing entities and some new, this crate
//! materializes new entities into storage, threads identifiers between
//! connected elements so every edge gets its endpoint ids, assembles path
//! values for pattern-bound path variables, and publishes every created or
//! reused entity into the shared per-row context downstream operators read.
//!
//! The storage engine, transaction manager, and expression evaluator are
//! collaborators behind traits ([`storage::RelationStore`],
//! [`txn::TxnContext`], [`expr::Evaluator`]); an in-memory reference engine
//! lives in [`storage::mem`].

/// Error handling for clause execution.
pub mod error;

/// Clause execution engine.
pub mod exec;

/// Expression-evaluator boundary.
pub mod expr;

/// Tracing subscriber setup.
pub mod logging;

/// Planner-produced CREATE pattern description.
pub mod pattern;

/// Storage-engine boundary and the in-memory reference engine.
pub mod storage;

/// Command-visibility counters and snapshots.
pub mod txn;

/// Identifier newtypes.
pub mod types;

/// Runtime values.
pub mod value;

pub use error::{ExecError, Result};
pub use exec::{ClauseMode, CreateClause, RowContext, RowSource, ValuesSource};
pub use pattern::{EdgeDirection, NodeKind, Pattern, PatternPath, TargetNode};
pub use value::{EdgeValue, PathValue, PropMap, PropValue, Value, VertexValue};
