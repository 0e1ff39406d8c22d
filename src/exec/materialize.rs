//! Vertex/edge materializer: the core walk over one pattern path.
//!
//! Entities within a path are created left-to-right in traversal order, with
//! one exception: an edge row needs both endpoint ids before it can be
//! written, so the vertex textually after an edge is created before the edge
//! itself. The path accumulator splice keeps the *observable* order (output
//! values, assembled path) strictly left-to-right regardless.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{ExecError, Result};
use crate::exec::context::{PathAccumulator, RowContext};
use crate::exec::{insert, validate};
use crate::expr::Evaluator;
use crate::pattern::{EdgeDirection, PatternPath, TargetNode};
use crate::storage::{RelationContext, RelationStore, RowTemplate};
use crate::txn::Snapshot;
use crate::types::{CommandId, EntityId, GraphId};
use crate::value::{EdgeValue, Value, VertexValue};

/// Relation contexts opened at clause begin, keyed by (path, node) position.
pub(crate) type OpenRelations = FxHashMap<(usize, usize), Box<dyn RelationContext>>;

/// Walks pattern paths for one input row, inserting or reusing entities.
pub(crate) struct Materializer<'a> {
    pub store: &'a dyn RelationStore,
    pub graph: GraphId,
    pub evaluator: &'a mut dyn Evaluator,
    pub open: &'a mut OpenRelations,
    pub write_cmd: CommandId,
    pub read_snapshot: Snapshot,
    path_idx: usize,
}

impl<'a> Materializer<'a> {
    pub fn new(
        store: &'a dyn RelationStore,
        graph: GraphId,
        evaluator: &'a mut dyn Evaluator,
        open: &'a mut OpenRelations,
        write_cmd: CommandId,
        read_snapshot: Snapshot,
    ) -> Self {
        Materializer {
            store,
            graph,
            evaluator,
            open,
            write_cmd,
            read_snapshot,
            path_idx: 0,
        }
    }

    /// Materializes one path, returning the accumulated path-member values
    /// in traversal order.
    pub fn create_path(
        &mut self,
        path_index: usize,
        path: &PatternPath,
        ctx: &mut RowContext,
    ) -> Result<Vec<Value>> {
        self.path_idx = path_index;
        let mut acc = PathAccumulator::default();
        self.create_vertex(0, &path.nodes, ctx, &mut acc)?;
        Ok(acc.take())
    }

    /// Materializes the vertex at `idx` and, if the path continues, the edge
    /// after it. Returns the vertex's id for the caller's endpoint
    /// resolution.
    fn create_vertex(
        &mut self,
        idx: usize,
        nodes: &[TargetNode],
        ctx: &mut RowContext,
        acc: &mut PathAccumulator,
    ) -> Result<EntityId> {
        let node = &nodes[idx];

        let id = if node.insert {
            self.insert_vertex(idx, node, ctx, acc)?
        } else {
            self.reuse_vertex(node, ctx, acc)?
        };

        if idx + 1 < nodes.len() {
            self.create_edge(idx + 1, nodes, id, ctx, acc)?;
        }
        Ok(id)
    }

    fn insert_vertex(
        &mut self,
        idx: usize,
        node: &TargetNode,
        ctx: &mut RowContext,
        acc: &mut PathAccumulator,
    ) -> Result<EntityId> {
        let id_expr = node.id_expr.as_ref().ok_or_else(|| {
            ExecError::InvalidArgument("inserting vertex has no id expression".into())
        })?;
        let id = self.evaluator.evaluate(id_expr, ctx.slots())?.expect_id()?;
        let props = ctx.slot(node.prop_slot)?.expect_props()?;

        let write_cmd = self.write_cmd;
        let relation = self.open_relation(idx)?;
        let row = insert::insert_entity(relation, RowTemplate::vertex(id, props.clone()), write_cmd)?;
        trace!(%id, label = %node.label, "vertex created");

        if let Some(name) = &node.variable {
            ctx.bind(name, row);
        }
        if node.output_slot.is_some() || node.in_path {
            let value = Value::Vertex(VertexValue {
                id,
                label: node.label.clone(),
                props,
            });
            if node.in_path {
                acc.push(value.clone());
            }
            if let Some(slot) = node.output_slot {
                ctx.publish(slot, value)?;
            }
        }
        Ok(id)
    }

    /// Reads a vertex bound earlier in the statement out of its row-context
    /// slot and re-validates it unless it was inserted by this very
    /// statement.
    fn reuse_vertex(
        &mut self,
        node: &TargetNode,
        ctx: &mut RowContext,
        acc: &mut PathAccumulator,
    ) -> Result<EntityId> {
        let slot = node.output_slot.ok_or_else(|| {
            ExecError::InvalidArgument("reused vertex names no row-context slot".into())
        })?;
        let existing = ctx.slot(slot)?.clone();
        let id = existing.expect_vertex()?.id;

        if !node.skip_existence_check {
            // The variable may have been deleted explicitly by name, or the
            // underlying row deleted through another variable. The name map
            // catches the first, the storage re-scan the second; both are
            // needed.
            let deleted_by_name = node
                .variable
                .as_deref()
                .is_some_and(|name| ctx.name_deleted(name));
            if deleted_by_name
                || !validate::still_exists(self.store, self.graph, id, &self.read_snapshot)?
            {
                return Err(ExecError::StaleReference {
                    variable: node.variable.clone().unwrap_or_else(|| id.to_string()),
                });
            }
        }

        if node.in_path {
            acc.push(existing);
        }
        Ok(id)
    }

    /// Materializes the edge at `idx`. The next vertex is created first
    /// because the edge row needs both endpoint ids before it can be
    /// written.
    fn create_edge(
        &mut self,
        idx: usize,
        nodes: &[TargetNode],
        prev_vertex: EntityId,
        ctx: &mut RowContext,
        acc: &mut PathAccumulator,
    ) -> Result<()> {
        let node = &nodes[idx];
        if idx + 1 >= nodes.len() {
            return Err(ExecError::InvalidArgument(
                "edge terminates a pattern path".into(),
            ));
        }

        let prefix = acc.take();
        let next_vertex = self.create_vertex(idx + 1, nodes, ctx, acc)?;

        // Pattern validation at clause begin already rejected missing
        // directions; this is the storage-side guarantee.
        let (start, end) = match node.direction {
            Some(EdgeDirection::Right) => (prev_vertex, next_vertex),
            Some(EdgeDirection::Left) => (next_vertex, prev_vertex),
            None => {
                return Err(ExecError::UnsupportedFeature(
                    "edge direction must be specified in a CREATE clause",
                ))
            }
        };

        let id_expr = node.id_expr.as_ref().ok_or_else(|| {
            ExecError::InvalidArgument("inserting edge has no id expression".into())
        })?;
        let id = self.evaluator.evaluate(id_expr, ctx.slots())?.expect_id()?;
        let props = ctx.slot(node.prop_slot)?.expect_props()?;

        let write_cmd = self.write_cmd;
        let relation = self.open_relation(idx)?;
        let row = insert::insert_entity(
            relation,
            RowTemplate::edge(id, start, end, props.clone()),
            write_cmd,
        )?;
        trace!(%id, %start, %end, label = %node.label, "edge created");

        if let Some(name) = &node.variable {
            ctx.bind(name, row);
        }

        let mut prefix = prefix;
        if node.output_slot.is_some() || node.in_path {
            let value = Value::Edge(EdgeValue {
                id,
                start,
                end,
                label: node.label.clone(),
                props,
            });
            if node.in_path {
                prefix.push(value.clone());
            }
            if let Some(slot) = node.output_slot {
                ctx.publish(slot, value)?;
            }
        }
        // Left-to-right order: values before the edge, the edge, then the
        // values the next-vertex recursion accumulated.
        acc.splice_front(prefix);
        Ok(())
    }

    fn open_relation(&mut self, node_idx: usize) -> Result<&mut (dyn RelationContext + 'static)> {
        self.open
            .get_mut(&(self.path_idx, node_idx))
            .map(|boxed| boxed.as_mut())
            .ok_or_else(|| {
                ExecError::InvalidArgument(format!(
                    "no open relation for pattern node {node_idx}"
                ))
            })
    }
}
