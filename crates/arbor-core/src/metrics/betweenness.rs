// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Betweenness centrality in closed form.
//!
//! In a tree every pair of nodes is joined by exactly one path, so
//! betweenness reduces to subtree-size arithmetic and costs `O(n)` instead of
//! the general-graph Brandes algorithm. Values are unnormalized pair counts
//! within each component.
use crate::metrics::NodeMap;
use crate::skeleton::Skeleton;

/// Number of node pairs whose path passes through each node (endpoints excluded).
///
/// Removing `v` splits its component of `n` nodes into the child subtrees
/// (sizes `s_c`) and the part above it (`p = n - 1 - Σ s_c`). With
/// `S = n - 1` the count is `(S² - Σ s_c² - p²) / 2`.
#[must_use]
pub fn node_betweenness(skel: &Skeleton) -> NodeMap<u64> {
    let topo = skel.topology();
    let sizes = topo.subtree_sizes();
    let comp = topo.component_sizes();
    (0..topo.len())
        .map(|i| {
            let total = (comp[topo.component(i)] - 1) as u64;
            let mut squares = 0u64;
            let mut below = 0u64;
            for &c in topo.children(i) {
                let s = sizes[c] as u64;
                squares += s * s;
                below += s;
            }
            let above = total - below;
            squares += above * above;
            (topo.id(i), (total * total - squares) / 2)
        })
        .collect()
}

/// Number of node pairs whose path uses each edge, keyed by the edge's child node.
///
/// An edge with `s` nodes below it in a component of `n` nodes carries
/// `s × (n - s)` paths. Roots have no parent edge and are absent.
#[must_use]
pub fn edge_betweenness(skel: &Skeleton) -> NodeMap<u64> {
    let topo = skel.topology();
    let sizes = topo.subtree_sizes();
    let comp = topo.component_sizes();
    (0..topo.len())
        .filter(|&i| topo.parent(i).is_some())
        .map(|i| {
            let n = comp[topo.component(i)] as u64;
            let s = sizes[i] as u64;
            (topo.id(i), s * (n - s))
        })
        .collect()
}
