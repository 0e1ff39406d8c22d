//! Identifier newtypes shared across the executor and storage boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one graph within the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(pub u32);

/// Identifies one label (vertex or edge kind) within a graph.
///
/// The label id doubles as the partition component of [`EntityId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u16);

/// Handle to a storage relation backing one label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub u32);

/// Storage-assigned physical position of a row within its relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowLocation(pub u64);

/// Intra-transaction command-visibility counter value.
///
/// Every write is stamped with the command id in effect when it happened;
/// a [`Snapshot`](crate::txn::Snapshot) decides visibility by comparing
/// against its ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u32);

impl CommandId {
    /// First command id of a transaction.
    pub const FIRST: CommandId = CommandId(0);

    /// The command id immediately after this one.
    pub fn next(self) -> CommandId {
        CommandId(self.0 + 1)
    }
}

const ENTITY_SEQ_BITS: u32 = 48;
const ENTITY_SEQ_MASK: u64 = (1 << ENTITY_SEQ_BITS) - 1;

/// Graph-scoped entity identifier.
///
/// Packs the owning label id into the high 16 bits and a per-label sequence
/// number into the low 48, so the backing relation can be recovered from the
/// id alone (needed when re-validating an entity bound earlier in the
/// statement).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Packs a label id and sequence number into one id.
    pub fn new(label: LabelId, sequence: u64) -> Self {
        EntityId((u64::from(label.0) << ENTITY_SEQ_BITS) | (sequence & ENTITY_SEQ_MASK))
    }

    /// The label (partition) component.
    pub fn label(self) -> LabelId {
        LabelId((self.0 >> ENTITY_SEQ_BITS) as u16)
    }

    /// The per-label sequence component.
    pub fn sequence(self) -> u64 {
        self.0 & ENTITY_SEQ_MASK
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}.{})", self.label().0, self.sequence())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.label().0, self.sequence())
    }
}
