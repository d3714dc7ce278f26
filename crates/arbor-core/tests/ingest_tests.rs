// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use arbor_core::{
    Connector, ConnectorId, ConnectorKind, GraphBackend, IntegrityError, NodeId, NodeLabel,
    NodeTable, RawNode, Skeleton, SkeletonError,
};
mod common;
use common::{chain, chain_rows, neuron};

fn integrity(result: Result<Skeleton, SkeletonError>) -> IntegrityError {
    match result {
        Err(SkeletonError::DataIntegrity(e)) => e,
        other => unreachable!("expected an integrity error, got {other:?}"),
    }
}

#[test]
fn two_cycle_is_rejected_with_both_ids() {
    let rows = [
        RawNode::new(1, Some(2), [0.0; 3]),
        RawNode::new(2, Some(1), [1.0, 0.0, 0.0]),
    ];
    let err = integrity(Skeleton::from_rows("cyc", rows));
    assert_eq!(err, IntegrityError::Cycle(vec![NodeId(1), NodeId(2)]));
    assert!(err.to_string().contains("[1, 2]"));
}

#[test]
fn long_cycle_terminates() {
    let n = 50_000;
    let rows = (1..=n).map(|i| RawNode::new(i, Some(if i == n { 1 } else { i + 1 }), [0.0; 3]));
    let err = integrity(Skeleton::from_rows("ring", rows));
    let IntegrityError::Cycle(members) = err else {
        unreachable!("ring is a cycle");
    };
    assert_eq!(members.len(), n as usize);
    assert_eq!(members.first(), Some(&NodeId(1)));
}

#[test]
fn cycle_behind_a_valid_tree_is_found() {
    let mut rows = chain_rows(5);
    rows.push(RawNode::new(10, Some(11), [0.0; 3]));
    rows.push(RawNode::new(11, Some(12), [0.0; 3]));
    rows.push(RawNode::new(12, Some(10), [0.0; 3]));
    rows.push(RawNode::new(13, Some(12), [0.0; 3]));
    let err = integrity(Skeleton::from_rows("mixed", rows));
    assert_eq!(err, IntegrityError::Cycle(vec![NodeId(10), NodeId(11), NodeId(12)]));
}

#[test]
fn malformed_rows_name_the_offender() {
    let dangling = [RawNode::new(1, None, [0.0; 3]), RawNode::new(2, Some(7), [0.0; 3])];
    assert_eq!(
        integrity(Skeleton::from_rows("d", dangling)),
        IntegrityError::DanglingParent {
            node: NodeId(2),
            parent: NodeId(7)
        }
    );

    let duplicate = [RawNode::new(1, None, [0.0; 3]), RawNode::new(1, None, [1.0; 3])];
    assert_eq!(
        integrity(Skeleton::from_rows("d", duplicate)),
        IntegrityError::DuplicateNodeId(NodeId(1))
    );

    let nan = [RawNode::new(1, None, [0.0, f64::NAN, 0.0])];
    assert_eq!(
        integrity(Skeleton::from_rows("n", nan)),
        IntegrityError::NonFinitePosition(NodeId(1))
    );

    let radius = [RawNode::new(4, None, [0.0; 3]).with_radius(-2.0)];
    assert!(matches!(
        integrity(Skeleton::from_rows("r", radius)),
        IntegrityError::InvalidRadius { node: NodeId(4), .. }
    ));
}

#[test]
fn swc_rows_use_negative_sentinels() {
    let rows = [
        RawNode::from_row(1, -1, 0.0, 0.0, 0.0, 2.5),
        RawNode::from_row(2, 1, 1.0, 0.0, 0.0, -1.0),
    ];
    let Ok(s) = Skeleton::from_rows("swc", rows) else {
        unreachable!("valid swc rows");
    };
    assert_eq!(s.roots(), vec![NodeId(1)]);
    assert_eq!(s.node(NodeId(1)).map(|r| r.radius), Ok(Some(2.5)));
    assert_eq!(s.node(NodeId(2)).map(|r| r.radius), Ok(None));
}

#[test]
fn connectors_must_reference_nodes_unless_allowed() {
    let strict = Skeleton::builder("c")
        .nodes(chain_rows(3))
        .connector(Connector::new(9, 42, ConnectorKind::Presynapse))
        .build();
    assert_eq!(
        integrity(strict),
        IntegrityError::DanglingConnector {
            connector: ConnectorId(9),
            node: NodeId(42)
        }
    );

    let Ok(lenient) = Skeleton::builder("c")
        .nodes(chain_rows(3))
        .connector(Connector::new(9, 42, ConnectorKind::Presynapse))
        .connector(Connector::new(3, 2, ConnectorKind::Postsynapse))
        .allow_orphaned_connectors(true)
        .build()
    else {
        unreachable!("orphans allowed");
    };
    assert_eq!(lenient.orphaned_connectors(), vec![ConnectorId(9)]);
    assert_eq!(lenient.connectors_of(NodeId(2)).count(), 1);
}

#[test]
fn soma_must_exist() {
    let err = integrity(Skeleton::builder("s").nodes(chain_rows(2)).soma(5).build());
    assert_eq!(err, IntegrityError::DanglingSoma(NodeId(5)));
}

#[test]
fn table_keeps_ascending_id_order_and_columns() {
    let rows = [
        RawNode::new(30, Some(10), [3.0, 0.0, 0.0]),
        RawNode::new(10, None, [1.0, 0.0, 0.0]).with_label(NodeLabel::Soma),
        RawNode::new(20, Some(10), [2.0, 0.0, 0.0]),
    ];
    let Ok(table) = NodeTable::from_rows(rows) else {
        unreachable!("valid rows");
    };
    let ids: Vec<NodeId> = table.ids().collect();
    assert_eq!(ids, vec![NodeId(10), NodeId(20), NodeId(30)]);
    let cols = table.columns();
    assert_eq!(cols.parents, vec![None, Some(NodeId(10)), Some(NodeId(10))]);
    assert_eq!(table.to_rows()[0].label, Some(NodeLabel::Soma));
}

#[test]
fn backends_build_identical_topologies() {
    let mut reference = neuron();
    let mut compact = neuron();
    reference.set_backend(GraphBackend::Reference);
    compact.set_backend(GraphBackend::Compact);
    let (r, c) = (reference.topology(), compact.topology());
    assert_eq!(r.order(), c.order());
    for i in 0..r.len() {
        assert_eq!(r.children(i), c.children(i));
        assert_eq!(r.depth(i), c.depth(i));
    }
    assert_eq!(reference.segments(), compact.segments());
}

#[test]
fn digests_are_stable_and_sensitive() {
    let a = chain(6);
    let b = chain(6);
    assert_eq!(a.table_digest(), b.table_digest());
    assert_eq!(a.edge_digest(), b.edge_digest());
    let mut moved = chain(6);
    assert!(moved.set_position(NodeId(3), arbor_core::Vec3::new(2.0, 1.0, 0.0)).is_ok());
    assert_ne!(a.table_digest(), moved.table_digest());
    // Geometry does not enter the edge digest.
    assert_eq!(a.edge_digest(), moved.edge_digest());
    assert_eq!(arbor_core::to_hex(&a.edge_digest()).len(), 64);
}
