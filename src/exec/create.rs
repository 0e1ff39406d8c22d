//! CREATE clause driver.
//!
//! The iterator-protocol shell around the materializer: pulls input rows
//! from upstream under the statement's read snapshot, materializes the
//! pattern once per row, and either consumes rows (terminal clause) or
//! projects them onward (pass-through clause).

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ExecError, Result};
use crate::exec::context::RowContext;
use crate::exec::materialize::{Materializer, OpenRelations};
use crate::expr::Evaluator;
use crate::pattern::Pattern;
use crate::storage::RelationStore;
use crate::txn::{Snapshot, TxnContext};
use crate::types::{CommandId, GraphId};
use crate::value::{PathValue, Value};

/// Upstream operator in the iterator tree.
///
/// The snapshot parameter makes command visibility explicit: the CREATE
/// driver fixes its read snapshot once at begin, so upstream reads never see
/// the clause's own writes, without any ambient counter juggling around each
/// pull. Pulls are synchronous and may recurse into arbitrary subtrees.
pub trait RowSource {
    /// Produces the next input row, or `None` when exhausted.
    fn next(&mut self, snapshot: &Snapshot) -> Result<Option<RowContext>>;
}

/// A row source over pre-computed slot rows. The canonical leaf operator for
/// tests and embedding.
#[derive(Debug, Default)]
pub struct ValuesSource {
    rows: VecDeque<RowContext>,
}

impl ValuesSource {
    /// Source yielding one context per slot row, in order.
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        ValuesSource {
            rows: rows.into_iter().map(RowContext::from_slots).collect(),
        }
    }

    /// Source yielding already-built row contexts (with name bindings).
    pub fn with_contexts(rows: Vec<RowContext>) -> Self {
        ValuesSource {
            rows: rows.into(),
        }
    }
}

impl RowSource for ValuesSource {
    fn next(&mut self, _snapshot: &Snapshot) -> Result<Option<RowContext>> {
        Ok(self.rows.pop_front())
    }
}

/// Whether the clause is the statement's last (a sink) or feeds further
/// clauses (a 1:1 transform). Fixed at plan time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseMode {
    /// Drains upstream completely and emits no rows.
    Terminal,
    /// Emits exactly one output row per input row.
    PassThrough,
}

/// Executor node for one CREATE clause.
///
/// Lifecycle: [`begin`](CreateClause::begin) once, [`next`](CreateClause::next)
/// until it returns `None`, [`end`](CreateClause::end). Rescan is not
/// supported: entity creation is not idempotent, so re-driving the clause
/// (e.g. from a join) is a fatal error.
pub struct CreateClause {
    pattern: Pattern,
    graph: GraphId,
    mode: ClauseMode,
    store: Arc<dyn RelationStore>,
    evaluator: Box<dyn Evaluator>,
    upstream: Box<dyn RowSource>,
    open: OpenRelations,
    width: usize,
    write_cmd: Option<CommandId>,
    read_snapshot: Option<Snapshot>,
    begun: bool,
    drained: bool,
}

impl CreateClause {
    /// Builds the clause from its plan-time inputs.
    pub fn new(
        pattern: Pattern,
        graph: GraphId,
        mode: ClauseMode,
        store: Arc<dyn RelationStore>,
        evaluator: Box<dyn Evaluator>,
        upstream: Box<dyn RowSource>,
    ) -> Self {
        CreateClause {
            pattern,
            graph,
            mode,
            store,
            evaluator,
            upstream,
            open: OpenRelations::default(),
            width: 0,
            write_cmd: None,
            read_snapshot: None,
            begun: false,
            drained: false,
        }
    }

    /// Prepares the clause for execution.
    ///
    /// Validates the pattern (so a malformed shape or undirected edge fails
    /// before any row is written), opens one relation context per inserting
    /// node with a statement-duration intent lock, establishes the
    /// transaction's write command id if none is set, advances the command
    /// counter, and fixes the read snapshot at the command in effect before
    /// this clause began.
    pub fn begin(&mut self, txn: &mut dyn TxnContext) -> Result<()> {
        if self.begun {
            return Err(ExecError::InvalidArgument(
                "create clause already begun".into(),
            ));
        }
        self.pattern.validate()?;

        for (pi, path) in self.pattern.paths.iter().enumerate() {
            for (ni, node) in path.nodes.iter().enumerate() {
                if !node.insert {
                    continue;
                }
                let ctx = self.store.open(node.relation)?;
                self.open.insert((pi, ni), ctx);
            }
        }
        self.width = self.pattern.required_width();

        // The write command id is established once per statement; the
        // counter advances once per clause, so this clause's reads stop just
        // short of its own writes while later clauses see them.
        let write_cmd = match txn.write_command() {
            Some(cmd) => cmd,
            None => {
                let cmd = txn.current_command();
                txn.set_write_command(cmd);
                cmd
            }
        };
        let ceiling = txn.current_command();
        txn.advance_command();
        self.write_cmd = Some(write_cmd);
        self.read_snapshot = Some(Snapshot::up_to(ceiling));
        self.begun = true;
        debug!(
            graph = self.graph.0,
            paths = self.pattern.paths.len(),
            relations = self.open.len(),
            write_cmd = write_cmd.0,
            mode = ?self.mode,
            "create clause begun"
        );
        Ok(())
    }

    /// Runs the clause one step.
    ///
    /// Terminal mode drains the whole upstream on the first call and returns
    /// `None` (then keeps returning `None`). Pass-through mode pulls one
    /// upstream row, materializes the pattern, and returns the updated row
    /// context.
    pub fn next(&mut self, _txn: &mut dyn TxnContext) -> Result<Option<RowContext>> {
        if !self.begun {
            return Err(ExecError::InvalidArgument(
                "create clause used before begin".into(),
            ));
        }
        let snapshot = self
            .read_snapshot
            .ok_or_else(|| ExecError::InvalidArgument("create clause has no snapshot".into()))?;

        match self.mode {
            ClauseMode::Terminal => {
                if self.drained {
                    return Ok(None);
                }
                while let Some(mut ctx) = self.upstream.next(&snapshot)? {
                    self.process_row(&mut ctx)?;
                }
                self.drained = true;
                Ok(None)
            }
            ClauseMode::PassThrough => match self.upstream.next(&snapshot)? {
                Some(mut ctx) => {
                    self.process_row(&mut ctx)?;
                    Ok(Some(ctx))
                }
                None => Ok(None),
            },
        }
    }

    /// Rejects any rescan attempt, before touching storage.
    pub fn rescan(&self) -> Result<()> {
        Err(ExecError::UnsupportedFeature(
            "create clause cannot be rescanned",
        ))
    }

    /// Closes the clause, dropping open relation contexts and releasing
    /// their intent locks.
    pub fn end(&mut self) {
        self.open.clear();
        debug!(graph = self.graph.0, "create clause finished");
    }

    /// Materializes every path of the pattern into the row context.
    fn process_row(&mut self, ctx: &mut RowContext) -> Result<()> {
        ctx.ensure_width(self.width);
        let write_cmd = self
            .write_cmd
            .ok_or_else(|| ExecError::InvalidArgument("create clause has no write command".into()))?;
        let snapshot = self
            .read_snapshot
            .ok_or_else(|| ExecError::InvalidArgument("create clause has no snapshot".into()))?;

        let mut materializer = Materializer::new(
            self.store.as_ref(),
            self.graph,
            self.evaluator.as_mut(),
            &mut self.open,
            write_cmd,
            snapshot,
        );
        for (pi, path) in self.pattern.paths.iter().enumerate() {
            let values = materializer.create_path(pi, path, ctx)?;
            // The accumulated values become one path value when the path is
            // itself bound to a variable; otherwise they are discarded.
            if let Some(slot) = path.path_slot {
                ctx.publish(slot, Value::Path(PathValue { elements: values }))?;
            }
        }
        Ok(())
    }
}
