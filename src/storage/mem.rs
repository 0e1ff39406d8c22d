//! In-memory reference storage engine.
//!
//! Backs the executor's integration tests and embedding without a full
//! storage stack: per-relation row heaps with command-stamped visibility, a
//! unique-identifier constraint, a secondary id index maintained on insert,
//! shared (row-exclusive) intent locks, and scan/insert counters so tests
//! can assert which access paths were exercised.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::ArcRwLockReadGuard;
use parking_lot::{Mutex, RawRwLock, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{ExecError, Result};
use crate::expr::{evaluate_basic, Evaluator, Expr};
use crate::storage::{EntityRow, RelationContext, RelationStore, RowTemplate};
use crate::txn::Snapshot;
use crate::types::{CommandId, EntityId, GraphId, LabelId, RelationId, RowLocation};
use crate::value::Value;

/// One stored row version with its command stamps.
#[derive(Clone, Debug)]
struct StoredRow {
    row: EntityRow,
    insert_cmd: CommandId,
    delete_cmd: Option<CommandId>,
}

#[derive(Default)]
struct RelationData {
    rows: Vec<StoredRow>,
    /// Secondary index: identifier to row positions.
    by_id: FxHashMap<EntityId, Vec<usize>>,
}

struct MemRelation {
    id: RelationId,
    graph: GraphId,
    label: LabelId,
    name: String,
    /// Row-exclusive intent lock. Shared mode: concurrent holders within a
    /// statement are fine, an exclusive operation would take the write side.
    lock: Arc<RwLock<()>>,
    data: Mutex<RelationData>,
    next_seq: AtomicU64,
}

impl MemRelation {
    fn insert(&self, template: RowTemplate, cmd: CommandId, counters: &Counters) -> Result<EntityRow> {
        // Declared constraint: the id's label component must match the
        // relation, and the id must be unique among non-deleted rows.
        if template.id.label() != self.label {
            return Err(ExecError::ConstraintViolation(format!(
                "id {} does not belong to relation {}",
                template.id, self.name
            )));
        }
        let mut data = self.data.lock();
        if let Some(positions) = data.by_id.get(&template.id) {
            if positions.iter().any(|&i| data.rows[i].delete_cmd.is_none()) {
                return Err(ExecError::ConstraintViolation(format!(
                    "duplicate id {} in relation {}",
                    template.id, self.name
                )));
            }
        }
        let location = RowLocation(data.rows.len() as u64);
        let row = EntityRow {
            id: template.id,
            start: template.start,
            end: template.end,
            props: template.props,
            location,
        };
        let position = data.rows.len();
        data.rows.push(StoredRow {
            row: row.clone(),
            insert_cmd: cmd,
            delete_cmd: None,
        });
        // Index maintenance happens with the heap write, under the same lock.
        data.by_id.entry(row.id).or_default().push(position);
        counters.inserts.fetch_add(1, Ordering::Relaxed);
        trace!(relation = %self.name, id = %row.id, cmd = cmd.0, "row inserted");
        Ok(row)
    }

    fn scan(&self, id: EntityId, snapshot: &Snapshot, counters: &Counters) -> Option<EntityRow> {
        counters.scans.fetch_add(1, Ordering::Relaxed);
        let data = self.data.lock();
        let positions = data.by_id.get(&id)?;
        positions
            .iter()
            .map(|&i| &data.rows[i])
            .find(|stored| snapshot.row_visible(stored.insert_cmd, stored.delete_cmd))
            .map(|stored| stored.row.clone())
    }

    fn mark_deleted(&self, id: EntityId, cmd: CommandId) -> bool {
        let mut data = self.data.lock();
        let Some(positions) = data.by_id.get(&id).cloned() else {
            return false;
        };
        for i in positions {
            if data.rows[i].delete_cmd.is_none() {
                data.rows[i].delete_cmd = Some(cmd);
                return true;
            }
        }
        false
    }
}

#[derive(Default)]
struct Counters {
    inserts: AtomicU64,
    scans: AtomicU64,
}

/// In-memory relation store.
#[derive(Default)]
pub struct MemStore {
    relations: Mutex<FxHashMap<RelationId, Arc<MemRelation>>>,
    labels: Mutex<FxHashMap<(GraphId, LabelId), RelationId>>,
    next_relation: AtomicU64,
    next_label: AtomicU64,
    counters: Arc<Counters>,
}

impl MemStore {
    /// An empty store.
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Creates a relation backing a fresh label in `graph`.
    pub fn create_relation(&self, graph: GraphId, name: &str) -> RelationId {
        let rel = RelationId(self.next_relation.fetch_add(1, Ordering::Relaxed) as u32 + 1);
        let label = LabelId(self.next_label.fetch_add(1, Ordering::Relaxed) as u16 + 1);
        let relation = Arc::new(MemRelation {
            id: rel,
            graph,
            label,
            name: name.to_owned(),
            lock: Arc::new(RwLock::new(())),
            data: Mutex::new(RelationData::default()),
            next_seq: AtomicU64::new(1),
        });
        self.relations.lock().insert(rel, relation);
        self.labels.lock().insert((graph, label), rel);
        debug!(relation = rel.0, label = label.0, name, "relation created");
        rel
    }

    fn relation(&self, rel: RelationId) -> Result<Arc<MemRelation>> {
        self.relations
            .lock()
            .get(&rel)
            .cloned()
            .ok_or(ExecError::NotFound("relation"))
    }

    /// Allocates the next identifier from the relation's sequence.
    pub fn allocate_id(&self, rel: RelationId) -> Result<EntityId> {
        let relation = self.relation(rel)?;
        let seq = relation.next_seq.fetch_add(1, Ordering::Relaxed);
        Ok(EntityId::new(relation.label, seq))
    }

    /// The label a relation backs.
    pub fn label_of(&self, rel: RelationId) -> Result<LabelId> {
        Ok(self.relation(rel)?.label)
    }

    /// Marks the entity's live row deleted as of `cmd`.
    ///
    /// Test/embedding hook standing in for a DELETE clause; returns whether a
    /// live row was found.
    pub fn delete_entity(&self, graph: GraphId, id: EntityId, cmd: CommandId) -> Result<bool> {
        let rel = self.relation_of_label(graph, id.label())?;
        Ok(self.relation(rel)?.mark_deleted(id, cmd))
    }

    /// Total rows inserted across all relations.
    pub fn insert_count(&self) -> u64 {
        self.counters.inserts.load(Ordering::Relaxed)
    }

    /// Total identifier scans across all relations.
    pub fn scan_count(&self) -> u64 {
        self.counters.scans.load(Ordering::Relaxed)
    }
}

impl RelationStore for MemStore {
    fn open(&self, relation: RelationId) -> Result<Box<dyn RelationContext>> {
        let rel = self.relation(relation)?;
        let guard = rel.lock.read_arc();
        trace!(relation = rel.id.0, graph = rel.graph.0, "relation opened");
        Ok(Box::new(MemRelationCtx {
            rel,
            counters: Arc::clone(&self.counters),
            _guard: guard,
        }))
    }

    fn relation_of_label(&self, graph: GraphId, label: LabelId) -> Result<RelationId> {
        self.labels
            .lock()
            .get(&(graph, label))
            .copied()
            .ok_or(ExecError::NotFound("label"))
    }
}

/// Open relation handle holding the intent lock.
struct MemRelationCtx {
    rel: Arc<MemRelation>,
    counters: Arc<Counters>,
    _guard: ArcRwLockReadGuard<RawRwLock, ()>,
}

impl RelationContext for MemRelationCtx {
    fn relation(&self) -> RelationId {
        self.rel.id
    }

    fn insert_row(&mut self, row: RowTemplate, write_cmd: CommandId) -> Result<EntityRow> {
        self.rel.insert(row, write_cmd, &self.counters)
    }

    fn scan_by_id(&self, id: EntityId, snapshot: &Snapshot) -> Result<Option<EntityRow>> {
        Ok(self.rel.scan(id, snapshot, &self.counters))
    }
}

/// Evaluator backed by the store's per-relation id sequences.
pub struct SequenceEvaluator {
    store: Arc<MemStore>,
}

impl SequenceEvaluator {
    /// Evaluator allocating ids from `store`.
    pub fn new(store: Arc<MemStore>) -> Self {
        SequenceEvaluator { store }
    }
}

impl Evaluator for SequenceEvaluator {
    fn evaluate(&mut self, expr: &Expr, slots: &[Value]) -> Result<Value> {
        match expr {
            Expr::NextId(rel) => Ok(Value::Id(self.store.allocate_id(*rel)?)),
            other => evaluate_basic(other, slots),
        }
    }
}
