//! Transaction boundary: command-visibility counter and snapshots.
//!
//! Within one transaction, each clause's writes are stamped with a command
//! id. Instead of mutating an ambient counter around every upstream pull,
//! visibility is a parameter: reads carry a [`Snapshot`] naming the command
//! ceiling they may observe, writes carry the statement's write command id.

use serde::{Deserialize, Serialize};

use crate::types::CommandId;

/// An intra-transaction read snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Writes stamped with a command id below this ceiling are visible.
    pub ceiling: CommandId,
}

impl Snapshot {
    /// Snapshot observing every command strictly before `ceiling`.
    pub fn up_to(ceiling: CommandId) -> Self {
        Snapshot { ceiling }
    }

    /// Whether a row with the given insert/delete stamps is live under this
    /// snapshot.
    pub fn row_visible(&self, insert_cmd: CommandId, delete_cmd: Option<CommandId>) -> bool {
        if insert_cmd >= self.ceiling {
            return false;
        }
        match delete_cmd {
            Some(d) => d >= self.ceiling,
            None => true,
        }
    }
}

/// The transaction manager surface this executor needs.
pub trait TxnContext {
    /// Command id currently in effect for the transaction.
    fn current_command(&self) -> CommandId;

    /// Advances the command counter, making prior writes visible to
    /// subsequent snapshots.
    fn advance_command(&mut self);

    /// The statement's write command id, once established.
    fn write_command(&self) -> Option<CommandId>;

    /// Establishes the statement's write command id.
    fn set_write_command(&mut self, cmd: CommandId);
}

/// In-memory transaction context.
#[derive(Debug, Default)]
pub struct MemTxn {
    current: CommandId,
    write: Option<CommandId>,
}

impl MemTxn {
    /// A fresh transaction at the first command.
    pub fn new() -> Self {
        MemTxn {
            current: CommandId::FIRST,
            write: None,
        }
    }
}

impl TxnContext for MemTxn {
    fn current_command(&self) -> CommandId {
        self.current
    }

    fn advance_command(&mut self) {
        self.current = self.current.next();
    }

    fn write_command(&self) -> Option<CommandId> {
        self.write
    }

    fn set_write_command(&mut self, cmd: CommandId) {
        self.write = Some(cmd);
    }
}
