// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use arbor_core::{Connector, ConnectorKind, NodeId, RawNode, Skeleton};
use proptest::prelude::*;

/// Straight chain `1..=n` along +x with unit spacing, rooted at 1.
pub fn chain_rows(n: i64) -> Vec<RawNode> {
    (1..=n)
        .map(|i| RawNode::new(i, (i > 1).then_some(i - 1), [(i - 1) as f64, 0.0, 0.0]))
        .collect()
}

pub fn chain(n: i64) -> Skeleton {
    Skeleton::from_rows("chain", chain_rows(n)).unwrap_or_else(|e| unreachable!("chain: {e}"))
}

/// Small neuron with two branch points and synapses on both arbors.
///
/// ```text
///            5 - 6        (outputs on 6)
///           /
/// 1 - 2 - 3 - 4           (outputs on 4)
///       \
///        7 - 8            (inputs on 8)
/// ```
pub fn neuron() -> Skeleton {
    let rows = [
        RawNode::new(1, None, [0.0, 0.0, 0.0]).with_radius(1.0),
        RawNode::new(2, Some(1), [1.0, 0.0, 0.0]).with_radius(1.0),
        RawNode::new(3, Some(2), [2.0, 0.0, 0.0]).with_radius(1.0),
        RawNode::new(4, Some(3), [3.0, 0.0, 0.0]).with_radius(1.0),
        RawNode::new(5, Some(3), [3.0, 1.0, 0.0]).with_radius(1.0),
        RawNode::new(6, Some(5), [4.0, 1.0, 0.0]).with_radius(1.0),
        RawNode::new(7, Some(2), [1.0, -1.0, 0.0]).with_radius(1.0),
        RawNode::new(8, Some(7), [1.0, -2.0, 0.0]).with_radius(1.0),
    ];
    Skeleton::builder("neuron")
        .nodes(rows)
        .soma(1)
        .connector(Connector::new(100, 4, ConnectorKind::Presynapse))
        .connector(Connector::new(101, 6, ConnectorKind::Presynapse))
        .connector(Connector::new(102, 8, ConnectorKind::Postsynapse))
        .connector(Connector::new(103, 8, ConnectorKind::Postsynapse))
        .build()
        .unwrap_or_else(|e| unreachable!("neuron: {e}"))
}

/// Undirected edge set as sorted `(min, max)` pairs.
pub fn undirected_edges(skel: &Skeleton) -> Vec<(NodeId, NodeId)> {
    let mut edges: Vec<_> = skel
        .topology()
        .edges()
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect();
    edges.sort_unstable();
    edges
}

/// Parent choice for one generated node: `None` starts a new tree, otherwise
/// the index selects an earlier node.
pub type ParentChoice = (bool, prop::sample::Index, [f64; 3]);

/// Random rooted forest: generated node `i` hangs from an earlier generated
/// node unless it is the first node or its root flag is set. Ids `1..=n` are
/// then handed out in shuffled order, so parents carry larger ids about as
/// often as smaller ones.
pub fn forest_strategy(max_nodes: usize) -> impl Strategy<Value = Skeleton> {
    shuffled(prop::collection::vec(
        (
            prop::bool::weighted(0.08),
            any::<prop::sample::Index>(),
            prop::array::uniform3(-100.0..100.0f64),
        ),
        1..max_nodes,
    ))
}

/// Random single tree, ids shuffled as in [`forest_strategy`].
pub fn tree_strategy(max_nodes: usize) -> impl Strategy<Value = Skeleton> {
    shuffled(prop::collection::vec(
        (
            Just(false),
            any::<prop::sample::Index>(),
            prop::array::uniform3(-100.0..100.0f64),
        ),
        1..max_nodes,
    ))
}

fn shuffled(
    choices: impl Strategy<Value = Vec<ParentChoice>>,
) -> impl Strategy<Value = Skeleton> {
    choices
        .prop_flat_map(|choices| {
            let ids: Vec<i64> = (1..=choices.len() as i64).collect();
            (Just(choices), Just(ids).prop_shuffle())
        })
        .prop_map(|(choices, ids)| forest_from(&choices, &ids))
}

/// Builds the forest described by `choices`, naming generated node `i` with
/// `ids[i]`.
pub fn forest_from(choices: &[ParentChoice], ids: &[i64]) -> Skeleton {
    let rows = choices.iter().enumerate().map(|(i, (new_root, pick, pos))| {
        let parent = if i == 0 || *new_root {
            None
        } else {
            Some(ids[pick.index(i)])
        };
        RawNode::new(ids[i], parent, *pos)
    });
    Skeleton::from_rows("random", rows).unwrap_or_else(|e| unreachable!("generated forest: {e}"))
}
