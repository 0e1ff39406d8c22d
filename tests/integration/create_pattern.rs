#![allow(missing_docs)]

use std::sync::Arc;

use umbra::exec::{ClauseMode, CreateClause, ValuesSource};
use umbra::expr::Expr;
use umbra::storage::mem::{MemStore, SequenceEvaluator};
use umbra::storage::RelationStore;
use umbra::txn::{MemTxn, Snapshot, TxnContext};
use umbra::types::{CommandId, GraphId};
use umbra::{
    EdgeDirection, ExecError, Pattern, PatternPath, PropMap, Result, TargetNode, Value,
};

const GRAPH: GraphId = GraphId(1);

fn clause(
    store: &Arc<MemStore>,
    pattern: Pattern,
    mode: ClauseMode,
    rows: Vec<Vec<Value>>,
) -> CreateClause {
    CreateClause::new(
        pattern,
        GRAPH,
        mode,
        Arc::clone(store) as Arc<dyn RelationStore>,
        Box::new(SequenceEvaluator::new(Arc::clone(store))),
        Box::new(ValuesSource::new(rows)),
    )
}

#[test]
fn two_vertices_and_a_right_edge() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");
    let knows = store.create_relation(GRAPH, "knows");

    // CREATE (a)-[e:KNOWS]->(b), everything new, no path variable.
    let pattern = Pattern::new(vec![PatternPath::new(vec![
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0)
            .with_output(1)
            .with_variable("a"),
        TargetNode::new_edge("knows", knows, Expr::NextId(knows), 0, EdgeDirection::Right)
            .with_output(2)
            .with_variable("e"),
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0)
            .with_output(3)
            .with_variable("b"),
    ])]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::PassThrough, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    assert!(create.next(&mut txn)?.is_none());
    create.end();

    assert_eq!(store.insert_count(), 3, "two vertices and one edge");

    let a = out.slot(1)?.expect_vertex()?.clone();
    let b = out.slot(3)?.expect_vertex()?.clone();
    let e = match out.slot(2)? {
        Value::Edge(e) => e.clone(),
        other => panic!("slot 2 holds {other:?}"),
    };
    assert_eq!(e.start, a.id, "right edge starts at the preceding vertex");
    assert_eq!(e.end, b.id, "right edge ends at the next vertex");
    assert_eq!(a.label, "Person");
    assert_eq!(e.label, "knows");

    // The rows are durable and visible to the next command.
    let later = Snapshot::up_to(txn.current_command());
    let rel = store.open(person)?;
    assert!(rel.scan_by_id(a.id, &later)?.is_some());
    assert!(rel.scan_by_id(b.id, &later)?.is_some());
    let stored_edge = store
        .open(knows)?
        .scan_by_id(e.id, &later)?
        .expect("edge row");
    assert_eq!(stored_edge.start, Some(a.id));
    assert_eq!(stored_edge.end, Some(b.id));
    Ok(())
}

#[test]
fn left_edge_swaps_endpoints() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");
    let knows = store.create_relation(GRAPH, "knows");

    // CREATE (a)<-[e:KNOWS]-(b).
    let pattern = Pattern::new(vec![PatternPath::new(vec![
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).with_output(1),
        TargetNode::new_edge("knows", knows, Expr::NextId(knows), 0, EdgeDirection::Left)
            .with_output(2),
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).with_output(3),
    ])]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::PassThrough, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    create.end();

    let a = out.slot(1)?.expect_vertex()?.id;
    let b = out.slot(3)?.expect_vertex()?.id;
    let Value::Edge(e) = out.slot(2)? else {
        panic!("slot 2 is not an edge");
    };
    assert_eq!(e.start, b, "left edge starts at the next vertex");
    assert_eq!(e.end, a, "left edge ends at the preceding vertex");
    Ok(())
}

#[test]
fn undirected_edge_fails_before_any_write() {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");
    let knows = store.create_relation(GRAPH, "knows");

    let mut edge = TargetNode::new_edge("knows", knows, Expr::NextId(knows), 0, EdgeDirection::Right);
    edge.direction = None;
    let pattern = Pattern::new(vec![PatternPath::new(vec![
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0),
        edge,
        TargetNode::new_vertex("Person", person, Expr::NextId(person), 0),
    ])]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::Terminal, vec![vec![Value::Null]]);
    let err = create.begin(&mut txn).unwrap_err();
    assert!(matches!(err, ExecError::UnsupportedFeature(_)));
    assert_eq!(store.insert_count(), 0, "no row written");
    assert_eq!(store.scan_count(), 0, "storage untouched");
}

#[test]
fn bound_path_assembles_values_in_declared_order() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");
    let knows = store.create_relation(GRAPH, "knows");

    // CREATE p = (a)-[e1]->(b)<-[e2]-(c), path bound to slot 1.
    let pattern = Pattern::new(vec![PatternPath::bound(
        vec![
            TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).in_path(),
            TargetNode::new_edge("knows", knows, Expr::NextId(knows), 0, EdgeDirection::Right)
                .in_path(),
            TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).in_path(),
            TargetNode::new_edge("knows", knows, Expr::NextId(knows), 0, EdgeDirection::Left)
                .in_path(),
            TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).in_path(),
        ],
        1,
    )]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::PassThrough, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    create.end();

    let Value::Path(path) = out.slot(1)? else {
        panic!("slot 1 is not a path");
    };
    assert_eq!(path.elements.len(), 5);
    let kinds: Vec<&str> = path.elements.iter().map(Value::kind).collect();
    assert_eq!(kinds, ["vertex", "edge", "vertex", "edge", "vertex"]);

    // Endpoint threading across the whole path.
    let ids: Vec<_> = path
        .elements
        .iter()
        .map(|v| match v {
            Value::Vertex(v) => v.id,
            Value::Edge(e) => e.id,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    let (Value::Edge(e1), Value::Edge(e2)) = (&path.elements[1], &path.elements[3]) else {
        panic!("interior elements are not edges");
    };
    assert_eq!(e1.start, ids[0]);
    assert_eq!(e1.end, ids[2]);
    assert_eq!(e2.start, ids[4], "left edge starts at the following vertex");
    assert_eq!(e2.end, ids[2]);
    Ok(())
}

#[test]
fn paths_in_one_pattern_run_in_order_with_separate_accumulators() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");

    let pattern = Pattern::new(vec![
        PatternPath::bound(
            vec![TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).in_path()],
            1,
        ),
        PatternPath::bound(
            vec![TargetNode::new_vertex("Person", person, Expr::NextId(person), 0).in_path()],
            2,
        ),
    ]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::PassThrough, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    create.end();

    let (Value::Path(first), Value::Path(second)) = (out.slot(1)?, out.slot(2)?) else {
        panic!("path slots not populated");
    };
    assert_eq!(first.elements.len(), 1, "accumulator cleared between paths");
    assert_eq!(second.elements.len(), 1);
    let Value::Vertex(v1) = &first.elements[0] else {
        panic!()
    };
    let Value::Vertex(v2) = &second.elements[0] else {
        panic!()
    };
    assert!(
        v1.id.sequence() < v2.id.sequence(),
        "first declared path materialized first"
    );
    Ok(())
}

#[test]
fn properties_flow_from_the_property_slot() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");

    let pattern = Pattern::new(vec![PatternPath::new(vec![TargetNode::new_vertex(
        "Person",
        person,
        Expr::NextId(person),
        0,
    )
    .with_output(1)])]);

    let props = PropMap::from([("name".to_owned(), umbra::PropValue::Str("ada".into()))]);
    let mut txn = MemTxn::new();
    let mut create = clause(
        &store,
        pattern,
        ClauseMode::PassThrough,
        vec![vec![Value::Map(props.clone())]],
    );
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    create.end();

    let vertex = out.slot(1)?.expect_vertex()?.clone();
    assert_eq!(vertex.props, props);

    let later = Snapshot::up_to(txn.current_command());
    let stored = store
        .open(person)?
        .scan_by_id(vertex.id, &later)?
        .expect("stored row");
    assert_eq!(stored.props, props);
    Ok(())
}

#[test]
fn pattern_is_a_serializable_plan_artifact() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");

    let pattern = Pattern::new(vec![PatternPath::new(vec![TargetNode::new_vertex(
        "Person",
        person,
        Expr::NextId(person),
        0,
    )
    .with_output(1)])]);

    // Ship the pattern the way the planner would: serialized.
    let json = serde_json::to_string(&pattern).expect("pattern serializes");
    let shipped: Pattern = serde_json::from_str(&json).expect("pattern deserializes");

    let mut txn = MemTxn::new();
    let mut create = clause(&store, shipped, ClauseMode::Terminal, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    assert!(create.next(&mut txn)?.is_none());
    create.end();
    assert_eq!(store.insert_count(), 1);
    Ok(())
}

#[test]
fn write_command_is_stamped_on_inserted_rows() -> Result<()> {
    let store = Arc::new(MemStore::new());
    let person = store.create_relation(GRAPH, "Person");

    let pattern = Pattern::new(vec![PatternPath::new(vec![TargetNode::new_vertex(
        "Person",
        person,
        Expr::NextId(person),
        0,
    )
    .with_output(1)])]);

    let mut txn = MemTxn::new();
    let mut create = clause(&store, pattern, ClauseMode::PassThrough, vec![vec![Value::Null]]);
    create.begin(&mut txn)?;
    let out = create.next(&mut txn)?.expect("one output row");
    create.end();
    let id = out.slot(1)?.expect_vertex()?.id;

    // Invisible under the clause's own read snapshot, visible afterwards.
    assert_eq!(txn.write_command(), Some(CommandId(0)));
    let own = Snapshot::up_to(CommandId(0));
    let later = Snapshot::up_to(txn.current_command());
    let rel = store.open(person)?;
    assert!(rel.scan_by_id(id, &own)?.is_none());
    assert!(rel.scan_by_id(id, &later)?.is_some());
    Ok(())
}
