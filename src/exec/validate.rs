//! Existence validator for reused entities.

use tracing::trace;

use crate::error::Result;
use crate::storage::RelationStore;
use crate::txn::Snapshot;
use crate::types::{EntityId, GraphId};

/// Re-checks that a previously bound entity still exists.
///
/// An entity bound earlier in the statement may have been deleted by an
/// intervening clause through a *different* variable bound to the same row;
/// the name-binding map cannot catch that, so the relation is re-scanned
/// under the statement's read snapshot. The backing relation is recovered
/// from the id's label component.
pub fn still_exists(
    store: &dyn RelationStore,
    graph: GraphId,
    id: EntityId,
    snapshot: &Snapshot,
) -> Result<bool> {
    let relation = store.relation_of_label(graph, id.label())?;
    let ctx = store.open(relation)?;
    let found = ctx.scan_by_id(id, snapshot)?.is_some();
    trace!(%id, found, "existence re-check");
    Ok(found)
}
