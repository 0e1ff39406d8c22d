//! Storage-engine boundary.
//!
//! The executor talks to storage through two object-safe traits: a
//! [`RelationStore`] that opens relations (taking a statement-scoped
//! row-exclusive intent lock) and resolves labels, and a per-relation
//! [`RelationContext`] that inserts rows and scans by identifier. Insertion
//! enforces declared constraints and maintains secondary indices atomically
//! with the row write; the lock is released when the context is dropped.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::txn::Snapshot;
use crate::types::{CommandId, EntityId, GraphId, LabelId, RelationId, RowLocation};
use crate::value::PropMap;

pub mod mem;

/// A fully populated row buffer ready for insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct RowTemplate {
    /// Entity identifier column.
    pub id: EntityId,
    /// Start-vertex identifier (edges only).
    pub start: Option<EntityId>,
    /// End-vertex identifier (edges only).
    pub end: Option<EntityId>,
    /// Property map column.
    pub props: PropMap,
}

impl RowTemplate {
    /// Row buffer for a vertex.
    pub fn vertex(id: EntityId, props: PropMap) -> Self {
        RowTemplate {
            id,
            start: None,
            end: None,
            props,
        }
    }

    /// Row buffer for an edge.
    pub fn edge(id: EntityId, start: EntityId, end: EntityId, props: PropMap) -> Self {
        RowTemplate {
            id,
            start: Some(start),
            end: Some(end),
            props,
        }
    }
}

/// A durable storage row, as returned by insertion.
///
/// Immutable for the remainder of the statement's execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    /// Entity identifier.
    pub id: EntityId,
    /// Start-vertex identifier (edges only).
    pub start: Option<EntityId>,
    /// End-vertex identifier (edges only).
    pub end: Option<EntityId>,
    /// Property map.
    pub props: PropMap,
    /// Storage-assigned physical location.
    pub location: RowLocation,
}

/// An open relation with its intent lock held.
///
/// Dropping the context releases the lock.
pub trait RelationContext {
    /// The relation this context is open on.
    fn relation(&self) -> RelationId;

    /// Writes one row, stamped with the statement's write command id.
    ///
    /// Validates declared constraints and updates every secondary index on
    /// the relation. Never retried internally; any failure propagates to the
    /// statement.
    fn insert_row(&mut self, row: RowTemplate, write_cmd: CommandId) -> Result<EntityRow>;

    /// Equality scan on the identifier under the given snapshot.
    fn scan_by_id(&self, id: EntityId, snapshot: &Snapshot) -> Result<Option<EntityRow>>;
}

/// Opens relations and resolves the catalog.
pub trait RelationStore: Send + Sync {
    /// Opens a relation, acquiring a row-exclusive intent lock.
    ///
    /// The lock is shared between handles of the same statement (re-entrant
    /// across contexts) and held until the returned context is dropped.
    fn open(&self, relation: RelationId) -> Result<Box<dyn RelationContext>>;

    /// Resolves the relation backing a label within a graph.
    fn relation_of_label(&self, graph: GraphId, label: LabelId) -> Result<RelationId>;
}
