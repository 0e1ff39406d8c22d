//! Per-row execution state: output slots, name bindings, path accumulation.

use smallvec::SmallVec;

use crate::error::{ExecError, Result};
use crate::storage::EntityRow;
use crate::value::Value;

/// A (variable name, row handle) pair recorded for an entity that later
/// clauses in the statement may reference by name.
#[derive(Clone, Debug)]
pub struct NameBinding {
    /// Variable name.
    pub name: String,
    /// Durable row handle for the entity.
    pub row: EntityRow,
    /// Set when a clause deleted the entity through this name.
    pub deleted: bool,
}

/// Shared per-input-row mutable state.
///
/// Owned by the enclosing iterator-tree row: an addressable array of output
/// values, one slot per query-visible variable, plus a side list of name
/// bindings used for by-name re-validation. A fresh context is built for
/// every input row; nothing carries across rows.
#[derive(Clone, Debug, Default)]
pub struct RowContext {
    slots: Vec<Value>,
    bindings: SmallVec<[NameBinding; 4]>,
}

impl RowContext {
    /// Context over the given slot values.
    pub fn from_slots(slots: Vec<Value>) -> Self {
        RowContext {
            slots,
            bindings: SmallVec::new(),
        }
    }

    /// Grows the slot array to at least `width`, filling with nulls.
    pub fn ensure_width(&mut self, width: usize) {
        if self.slots.len() < width {
            self.slots.resize(width, Value::Null);
        }
    }

    /// All slot values.
    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Reads one slot.
    pub fn slot(&self, index: usize) -> Result<&Value> {
        self.slots
            .get(index)
            .ok_or_else(|| ExecError::InvalidArgument(format!("row slot {index} out of range")))
    }

    /// Publishes a value into a slot.
    pub fn publish(&mut self, index: usize, value: Value) -> Result<()> {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ExecError::InvalidArgument(format!(
                "row slot {index} out of range"
            ))),
        }
    }

    /// Records a name binding for an entity created or bound in this row.
    pub fn bind(&mut self, name: &str, row: EntityRow) {
        self.bindings.push(NameBinding {
            name: name.to_owned(),
            row,
            deleted: false,
        });
    }

    /// Looks up a binding by name.
    pub fn binding(&self, name: &str) -> Option<&NameBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Marks a binding deleted, as a DELETE clause would. Returns whether
    /// the name was bound.
    pub fn mark_deleted(&mut self, name: &str) -> bool {
        match self.bindings.iter_mut().find(|b| b.name == name) {
            Some(binding) => {
                binding.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Whether the named entity was explicitly deleted in this statement.
    pub fn name_deleted(&self, name: &str) -> bool {
        self.binding(name).is_some_and(|b| b.deleted)
    }

    /// Consumes the context, yielding the slot values.
    pub fn into_slots(self) -> Vec<Value> {
        self.slots
    }
}

/// Transient ordered list of entity values collected while walking one path.
///
/// Cleared (taken) after assembly; never persisted.
#[derive(Debug, Default)]
pub struct PathAccumulator {
    values: Vec<Value>,
}

impl PathAccumulator {
    /// Appends a value in traversal order.
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Takes the accumulated values, leaving the accumulator empty.
    pub fn take(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.values)
    }

    /// Puts `prefix` in front of the currently accumulated values.
    ///
    /// Supports the edge splice: the values accumulated before an edge, then
    /// the edge itself, then whatever the next-vertex recursion produced.
    pub fn splice_front(&mut self, mut prefix: Vec<Value>) {
        prefix.append(&mut self.values);
        self.values = prefix;
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
