// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::metrics::NodeMap;
use crate::skeleton::Skeleton;
use crate::topology::Topology;

/// Strahler ordering rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrahlerMethod {
    /// Classic: `max + 1` only when two or more children share the maximum.
    #[default]
    Standard,
    /// Every branch point increments: `max + 1` whenever there are two or more children.
    Greedy,
}

fn order_at(topo: &Topology, order: &[u32], i: usize, method: StrahlerMethod) -> u32 {
    let kids = topo.children(i);
    if kids.is_empty() {
        return 1;
    }
    let max = kids.iter().map(|&c| order[c]).max().unwrap_or(1);
    let bump = match method {
        StrahlerMethod::Standard => kids.iter().filter(|&&c| order[c] == max).count() >= 2,
        StrahlerMethod::Greedy => kids.len() >= 2,
    };
    if bump {
        max + 1
    } else {
        max
    }
}

/// Strahler index of every node.
///
/// Leaves are 1. Segments are processed distal first; within a segment all
/// members share the value computed at its distal end (slab nodes inherit
/// from their single child). Root branch points, which belong to no
/// segment, are resolved last.
#[must_use]
pub fn strahler_index(skel: &Skeleton, method: StrahlerMethod) -> NodeMap<u32> {
    let topo = skel.topology();
    let dense = strahler_dense(skel, method);
    (0..topo.len()).map(|i| (topo.id(i), dense[i])).collect()
}

pub(crate) fn strahler_dense(skel: &Skeleton, method: StrahlerMethod) -> Vec<u32> {
    let topo = skel.topology();
    let mut order = vec![0u32; topo.len()];
    for run in skel.segment_index().runs() {
        let Some(&first) = run.nodes.first() else {
            continue;
        };
        let value = order_at(topo, &order, first, method);
        for &i in &run.nodes {
            order[i] = value;
        }
    }
    for &root in topo.root_indices() {
        if topo.is_branch(root) {
            order[root] = order_at(topo, &order, root, method);
        }
    }
    order
}
