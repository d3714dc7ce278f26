// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::mask::NodeMask;
use crate::skeleton::Skeleton;
use crate::topology::Topology;

/// Total Euclidean length of all parent-child edges.
///
/// Summed in ascending child id order so the result is bit-for-bit
/// reproducible for a given table.
#[must_use]
pub fn cable_length(skel: &Skeleton) -> f64 {
    let topo = skel.topology();
    (0..topo.len()).map(|i| skel.edge_length(topo, i)).sum()
}

/// Cable restricted to a node subset.
///
/// The edge from a node to its parent is counted when the node (the child
/// end) is selected; the parent need not be. Masked cable is therefore
/// additive over any partition of the nodes.
#[must_use]
pub fn cable_length_masked(skel: &Skeleton, mask: &NodeMask) -> f64 {
    let topo = skel.topology();
    let selected = mask.select(skel.table());
    (0..topo.len())
        .filter(|&i| selected[i])
        .map(|i| skel.edge_length(topo, i))
        .sum()
}

/// Cable per segment, in segment order, including the edge to each
/// segment's anchor.
#[must_use]
pub fn segment_cable(skel: &Skeleton) -> Vec<f64> {
    let topo = skel.topology();
    skel.segment_index()
        .runs()
        .iter()
        .map(|run| run.nodes.iter().map(|&i| skel.edge_length(topo, i)).sum())
        .collect()
}

/// Cable of each node's subtree, excluding the edge to its own parent.
pub(crate) fn distal_cable(skel: &Skeleton, topo: &Topology) -> Vec<f64> {
    let mut distal = vec![0.0; topo.len()];
    for &i in topo.order().iter().rev() {
        if let Some(p) = topo.parent(i) {
            distal[p] += distal[i] + skel.edge_length(topo, i);
        }
    }
    distal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::NodeId;
    use crate::record::RawNode;

    fn line() -> Skeleton {
        let rows = (1..=3).map(|i| RawNode::new(i, (i > 1).then_some(i - 1), [(i - 1) as f64, 0.0, 0.0]));
        Skeleton::from_rows("line", rows).unwrap_or_else(|_| unreachable!("valid line"))
    }

    #[test]
    fn line_cable_is_two() {
        let s = line();
        assert!((cable_length(&s) - 2.0).abs() < 1e-12);
        assert_eq!(segment_cable(&s), vec![2.0]);
    }

    #[test]
    fn masked_cable_counts_child_edges() {
        let s = line();
        let distal = NodeMask::nodes([3i64]);
        let proximal = NodeMask::nodes([1i64, 2]);
        let a = cable_length_masked(&s, &distal);
        let b = cable_length_masked(&s, &proximal);
        assert!((a - 1.0).abs() < 1e-12);
        assert!((a + b - cable_length(&s)).abs() < 1e-12);
    }

    #[test]
    fn distal_cable_accumulates_subtrees() {
        let s = line();
        let topo = s.topology();
        let d = distal_cable(&s, topo);
        assert_eq!(topo.index_of(NodeId(1)).map(|i| d[i]), Some(2.0));
        assert_eq!(topo.index_of(NodeId(3)).map(|i| d[i]), Some(0.0));
    }
}
