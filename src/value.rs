//! Runtime values flowing through the executor.
//!
//! Entity values are a closed tagged-variant type with explicit discriminant
//! checks; a mismatch fails with [`ExecError::TypeMismatch`] rather than an
//! untyped cast.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, Result};
use crate::types::EntityId;

/// Scalar property value stored on a vertex or edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
        }
    }
}

/// Property map attached to one entity.
pub type PropMap = BTreeMap<String, PropValue>;

/// A materialized vertex value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexValue {
    /// Graph-scoped identifier.
    pub id: EntityId,
    /// Label name of the vertex.
    pub label: String,
    /// Property map.
    pub props: PropMap,
}

/// A materialized edge value, carrying both endpoint ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeValue {
    /// Graph-scoped identifier.
    pub id: EntityId,
    /// Identifier of the start vertex.
    pub start: EntityId,
    /// Identifier of the end vertex.
    pub end: EntityId,
    /// Label name of the edge.
    pub label: String,
    /// Property map.
    pub props: PropMap,
}

/// A path value: the ordered vertex/edge values walked for one pattern path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    /// Elements in traversal order, alternating vertex and edge values.
    pub elements: Vec<Value>,
}

/// Runtime value held in a row-context slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
    /// Entity identifier, as produced by an id expression.
    Id(EntityId),
    /// Property map, as produced by a property expression.
    Map(PropMap),
    /// Vertex value.
    Vertex(VertexValue),
    /// Edge value.
    Edge(EdgeValue),
    /// Path value.
    Path(PathValue),
}

impl Value {
    /// Human-readable kind tag, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Id(_) => "id",
            Value::Map(_) => "map",
            Value::Vertex(_) => "vertex",
            Value::Edge(_) => "edge",
            Value::Path(_) => "path",
        }
    }

    /// Requires this value to be a vertex.
    pub fn expect_vertex(&self) -> Result<&VertexValue> {
        match self {
            Value::Vertex(v) => Ok(v),
            other => Err(ExecError::TypeMismatch {
                expected: "vertex",
                found: other.kind(),
            }),
        }
    }

    /// Requires this value to be an entity id.
    pub fn expect_id(&self) -> Result<EntityId> {
        match self {
            Value::Id(id) => Ok(*id),
            other => Err(ExecError::TypeMismatch {
                expected: "id",
                found: other.kind(),
            }),
        }
    }

    /// Requires this value to be a property map; `Null` reads as an empty map.
    pub fn expect_props(&self) -> Result<PropMap> {
        match self {
            Value::Map(m) => Ok(m.clone()),
            Value::Null => Ok(PropMap::new()),
            other => Err(ExecError::TypeMismatch {
                expected: "map",
                found: other.kind(),
            }),
        }
    }
}
