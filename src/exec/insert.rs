//! Entity inserter: writes one new vertex or edge row through storage.

use tracing::trace;

use crate::error::Result;
use crate::storage::{EntityRow, RelationContext, RowTemplate};
use crate::types::CommandId;

/// Inserts a fully populated row into the open relation.
///
/// The storage engine validates declared constraints and maintains secondary
/// indices atomically with the row write. Never retried; a constraint
/// violation propagates to the statement verbatim.
pub fn insert_entity(
    relation: &mut dyn RelationContext,
    template: RowTemplate,
    write_cmd: CommandId,
) -> Result<EntityRow> {
    trace!(
        relation = relation.relation().0,
        id = %template.id,
        "inserting entity row"
    );
    relation.insert_row(template, write_cmd)
}
