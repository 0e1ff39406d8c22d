//! Expression-evaluator boundary.
//!
//! The executor never computes values itself: identifier and property values
//! come from compiled expressions evaluated against the current input row.
//! Only the shapes the CREATE path needs are modeled here.

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, Result};
use crate::types::RelationId;
use crate::value::{PropValue, Value};

/// A compiled expression, as handed over by the planner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Expr {
    /// A constant scalar.
    Literal(PropValue),
    /// Reads the value already computed into an input-row slot.
    Slot(usize),
    /// Allocates the next identifier from the relation's sequence.
    NextId(RelationId),
}

/// Evaluates expressions against the current row's slots.
pub trait Evaluator {
    /// Computes the expression's value for the current input row.
    fn evaluate(&mut self, expr: &Expr, slots: &[Value]) -> Result<Value>;
}

/// Shared evaluation of the storage-independent expression forms.
///
/// Implementors of [`Evaluator`] handle [`Expr::NextId`] themselves and
/// delegate the rest here.
pub fn evaluate_basic(expr: &Expr, slots: &[Value]) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(match v {
            PropValue::Null => Value::Null,
            PropValue::Bool(b) => Value::Bool(*b),
            PropValue::Int(i) => Value::Int(*i),
            PropValue::Float(f) => Value::Float(*f),
            PropValue::Str(s) => Value::Str(s.clone()),
            PropValue::Bytes(_) => {
                return Err(ExecError::InvalidArgument(
                    "bytes literal has no slot representation".into(),
                ))
            }
        }),
        Expr::Slot(i) => slots
            .get(*i)
            .cloned()
            .ok_or_else(|| ExecError::InvalidArgument(format!("slot {i} out of range"))),
        Expr::NextId(_) => Err(ExecError::UnsupportedFeature(
            "id allocation requires a storage-backed evaluator",
        )),
    }
}
