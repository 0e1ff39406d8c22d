//! Planner-produced CREATE pattern description.
//!
//! A [`Pattern`] is a plan artifact: it is built once per query plan, shipped
//! to the executor in serialized form, and read-only during execution.

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, Result};
use crate::expr::Expr;
use crate::types::RelationId;

/// Whether a target node stands for a vertex or an edge occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Vertex occurrence.
    Vertex,
    /// Edge occurrence.
    Edge,
}

/// Declared direction of an edge relative to traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// `(prev)-[e]->(next)`: start = preceding vertex, end = next vertex.
    Right,
    /// `(prev)<-[e]-(next)`: start = next vertex, end = preceding vertex.
    Left,
}

/// One vertex or edge occurrence within a pattern path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetNode {
    /// Vertex or edge.
    pub kind: NodeKind,
    /// True when this occurrence creates a new entity; false when it reuses
    /// one bound earlier in the statement.
    pub insert: bool,
    /// Label name, carried into the entity's output value.
    pub label: String,
    /// Storage relation backing the label. Only meaningful when `insert`.
    pub relation: RelationId,
    /// Expression producing the new entity's identifier. Required when
    /// `insert`, ignored otherwise.
    pub id_expr: Option<Expr>,
    /// Input-row slot holding the computed property-map value.
    pub prop_slot: usize,
    /// Row-context slot where this entity's value is published. Set whenever
    /// anything downstream (directly or through a path) references the
    /// entity; for a reused node it is also where the bound value is read
    /// from.
    pub output_slot: Option<usize>,
    /// Variable name, used for by-name re-validation of reused entities.
    pub variable: Option<String>,
    /// Edge direction. Must be present for edge nodes; an unspecified
    /// direction is a fatal pattern error.
    pub direction: Option<EdgeDirection>,
    /// True when this node's value feeds the enclosing path's assembled
    /// path value.
    pub in_path: bool,
    /// True when the entity was inserted earlier in this same statement and
    /// therefore cannot have been concurrently invalidated.
    pub skip_existence_check: bool,
}

impl TargetNode {
    /// Builds a new-vertex node with the common defaults.
    pub fn new_vertex(label: &str, relation: RelationId, id_expr: Expr, prop_slot: usize) -> Self {
        TargetNode {
            kind: NodeKind::Vertex,
            insert: true,
            label: label.to_owned(),
            relation,
            id_expr: Some(id_expr),
            prop_slot,
            output_slot: None,
            variable: None,
            direction: None,
            in_path: false,
            skip_existence_check: false,
        }
    }

    /// Builds a new-edge node with the common defaults.
    pub fn new_edge(
        label: &str,
        relation: RelationId,
        id_expr: Expr,
        prop_slot: usize,
        direction: EdgeDirection,
    ) -> Self {
        TargetNode {
            kind: NodeKind::Edge,
            insert: true,
            label: label.to_owned(),
            relation,
            id_expr: Some(id_expr),
            prop_slot,
            output_slot: None,
            variable: None,
            direction: Some(direction),
            in_path: false,
            skip_existence_check: false,
        }
    }

    /// Builds a reused-vertex node reading its bound value from `slot`.
    pub fn reused_vertex(label: &str, variable: &str, slot: usize) -> Self {
        TargetNode {
            kind: NodeKind::Vertex,
            insert: false,
            label: label.to_owned(),
            relation: RelationId(0),
            id_expr: None,
            prop_slot: 0,
            output_slot: Some(slot),
            variable: Some(variable.to_owned()),
            direction: None,
            in_path: false,
            skip_existence_check: false,
        }
    }

    /// Sets the output slot.
    pub fn with_output(mut self, slot: usize) -> Self {
        self.output_slot = Some(slot);
        self
    }

    /// Sets the variable name.
    pub fn with_variable(mut self, name: &str) -> Self {
        self.variable = Some(name.to_owned());
        self
    }

    /// Marks the node as feeding the enclosing path value.
    pub fn in_path(mut self) -> Self {
        self.in_path = true;
        self
    }

    /// Marks the node as safe to reuse without an existence re-check.
    pub fn skip_existence_check(mut self) -> Self {
        self.skip_existence_check = true;
        self
    }
}

/// One connected vertex/edge/vertex/... sequence, optionally bound to a
/// path variable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternPath {
    /// Target nodes in traversal order.
    pub nodes: Vec<TargetNode>,
    /// Row-context slot for the assembled path value, when the path itself
    /// is bound to a variable.
    pub path_slot: Option<usize>,
}

impl PatternPath {
    /// A path with no path variable.
    pub fn new(nodes: Vec<TargetNode>) -> Self {
        PatternPath {
            nodes,
            path_slot: None,
        }
    }

    /// A path whose assembled value is published to `slot`.
    pub fn bound(nodes: Vec<TargetNode>, slot: usize) -> Self {
        PatternPath {
            nodes,
            path_slot: Some(slot),
        }
    }

    /// Checks the structural invariants of the node sequence.
    ///
    /// The sequence must be non-empty, start and end with a vertex, strictly
    /// alternate vertex and edge kinds, declare a direction on every edge,
    /// and carry an id expression on every inserting node. Reused nodes must
    /// name the slot their bound value lives in. Running this at clause
    /// begin guarantees a malformed pattern fails before any row is written.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ExecError::InvalidArgument(
                "pattern path has no target nodes".into(),
            ));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let expected = if i % 2 == 0 {
                NodeKind::Vertex
            } else {
                NodeKind::Edge
            };
            if node.kind != expected {
                return Err(ExecError::InvalidArgument(format!(
                    "pattern path node {i} must be a {expected:?}"
                )));
            }
            match node.kind {
                NodeKind::Edge => {
                    if node.direction.is_none() {
                        return Err(ExecError::UnsupportedFeature(
                            "edge direction must be specified in a CREATE clause",
                        ));
                    }
                    if !node.insert {
                        return Err(ExecError::InvalidArgument(format!(
                            "pattern path edge {i} must be a new entity"
                        )));
                    }
                }
                NodeKind::Vertex => {}
            }
            if node.insert && node.id_expr.is_none() {
                return Err(ExecError::InvalidArgument(format!(
                    "pattern path node {i} inserts an entity but has no id expression"
                )));
            }
            if !node.insert && node.output_slot.is_none() {
                return Err(ExecError::InvalidArgument(format!(
                    "pattern path node {i} reuses an entity but names no slot"
                )));
            }
        }
        if self.nodes.len() % 2 == 0 {
            return Err(ExecError::InvalidArgument(
                "pattern path must end with a vertex".into(),
            ));
        }
        Ok(())
    }

    /// Highest row-context slot index this path touches, if any.
    pub fn max_slot(&self) -> Option<usize> {
        self.nodes
            .iter()
            .flat_map(|n| {
                n.output_slot
                    .into_iter()
                    .chain(n.insert.then_some(n.prop_slot))
            })
            .chain(self.path_slot)
            .max()
    }
}

/// The full CREATE clause description: an ordered collection of paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pattern {
    /// Paths in declared order. Processed strictly in this order, no
    /// cross-path reordering.
    pub paths: Vec<PatternPath>,
}

impl Pattern {
    /// Wraps a list of paths.
    pub fn new(paths: Vec<PatternPath>) -> Self {
        Pattern { paths }
    }

    /// Validates every path in the pattern.
    pub fn validate(&self) -> Result<()> {
        for path in &self.paths {
            path.validate()?;
        }
        Ok(())
    }

    /// Number of row-context slots required to execute this pattern.
    pub fn required_width(&self) -> usize {
        self.paths
            .iter()
            .filter_map(PatternPath::max_slot)
            .map(|s| s + 1)
            .max()
            .unwrap_or(0)
    }
}
