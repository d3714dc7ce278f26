// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dense graph view derived from a node table.
//!
//! Node ids are mapped to dense indices `0..n` in ascending id order; every
//! algorithm in the crate runs on those indices. Children are stored in a
//! compressed (CSR) layout, sorted by index, so per-node child iteration is a
//! slice borrow.
//!
//! How the children index is built is a strategy ([`TopologyBuilder`]). The
//! reference builder groups through an ordered map; the compact builder uses
//! a counting sort. Both must produce the identical layout, and the choice is
//! made once through [`GraphBackend`], never detected at runtime.
use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::table::NodeTable;

/// CSR children index: children of `i` are `children[offsets[i]..offsets[i + 1]]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildIndex {
    /// Row offsets, length `n + 1`.
    pub offsets: Vec<usize>,
    /// Concatenated child indices, ascending within each row.
    pub children: Vec<usize>,
}

/// Strategy that builds the children index from dense parent links.
pub trait TopologyBuilder: Send + Sync {
    /// Short name for logs and benchmarks.
    fn name(&self) -> &'static str;

    /// Inverts `parents` into a [`ChildIndex`].
    fn child_index(&self, parents: &[Option<usize>]) -> ChildIndex;
}

/// Ordered-map grouping. Simple and obviously correct; the baseline.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceBuilder;

impl TopologyBuilder for ReferenceBuilder {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn child_index(&self, parents: &[Option<usize>]) -> ChildIndex {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (child, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                groups.entry(*p).or_default().push(child);
            }
        }
        let mut offsets = Vec::with_capacity(parents.len() + 1);
        let mut children = Vec::with_capacity(parents.len());
        offsets.push(0);
        for node in 0..parents.len() {
            if let Some(kids) = groups.get(&node) {
                children.extend_from_slice(kids);
            }
            offsets.push(children.len());
        }
        ChildIndex { offsets, children }
    }
}

/// Counting sort over parent indices; two linear passes, no per-node allocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompactBuilder;

impl TopologyBuilder for CompactBuilder {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn child_index(&self, parents: &[Option<usize>]) -> ChildIndex {
        let n = parents.len();
        let mut offsets = vec![0usize; n + 1];
        for p in parents.iter().flatten() {
            offsets[p + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut children = vec![0usize; offsets[n]];
        for (child, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[cursor[*p]] = child;
                cursor[*p] += 1;
            }
        }
        ChildIndex { offsets, children }
    }
}

/// Configuration-time selection of the topology strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GraphBackend {
    /// [`ReferenceBuilder`].
    #[default]
    Reference,
    /// [`CompactBuilder`].
    Compact,
}

impl GraphBackend {
    /// The strategy instance for this backend.
    #[must_use]
    pub fn builder(self) -> &'static dyn TopologyBuilder {
        match self {
            Self::Reference => &ReferenceBuilder,
            Self::Compact => &CompactBuilder,
        }
    }
}

/// Structural role of a node, derived from child counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// No parent. Takes precedence over the child-count roles.
    Root,
    /// Two or more children.
    Branch,
    /// Exactly one child.
    Slab,
    /// No children.
    Leaf,
}

/// Derived tree/forest view of a node table.
#[derive(Clone, Debug)]
pub struct Topology {
    ids: Vec<NodeId>,
    index: FxHashMap<NodeId, usize>,
    parent: Vec<Option<usize>>,
    child_index: ChildIndex,
    roots: Vec<usize>,
    order: Vec<usize>,
    component: Vec<usize>,
    depth: Vec<u32>,
}

impl Topology {
    /// Builds the view. The table must already be validated.
    ///
    /// Runs in `O(n)` plus the builder's cost; traversal is an explicit
    /// queue, so chain depth is unbounded.
    #[must_use]
    pub fn build(table: &NodeTable, builder: &dyn TopologyBuilder) -> Self {
        let ids: Vec<NodeId> = table.ids().collect();
        let index = table.index_map().clone();
        let parent: Vec<Option<usize>> = table
            .iter()
            .map(|(_, r)| r.parent.and_then(|p| index.get(&p).copied()))
            .collect();
        let child_index = builder.child_index(&parent);
        let roots: Vec<usize> = (0..ids.len()).filter(|&i| parent[i].is_none()).collect();

        let n = ids.len();
        let mut order = Vec::with_capacity(n);
        let mut component = vec![usize::MAX; n];
        let mut depth = vec![0u32; n];
        let mut queue = VecDeque::new();
        for (c, &root) in roots.iter().enumerate() {
            component[root] = c;
            queue.push_back(root);
            while let Some(node) = queue.pop_front() {
                order.push(node);
                let kids = &child_index.children
                    [child_index.offsets[node]..child_index.offsets[node + 1]];
                for &child in kids {
                    component[child] = c;
                    depth[child] = depth[node] + 1;
                    queue.push_back(child);
                }
            }
        }
        debug!(
            nodes = n,
            roots = roots.len(),
            builder = builder.name(),
            "topology built"
        );
        Self {
            ids,
            index,
            parent,
            child_index,
            roots,
            order,
            component,
            depth,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` for an empty skeleton.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dense index to id, ascending.
    #[must_use]
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Id of dense index `i`.
    #[must_use]
    pub fn id(&self, i: usize) -> NodeId {
        self.ids[i]
    }

    /// Dense index of `id`.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Dense index of `id`, or `NotFound`.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn require(&self, id: NodeId) -> Result<usize, SkeletonError> {
        self.index_of(id)
            .ok_or_else(|| SkeletonError::node_not_found(id))
    }

    /// Parent index of `i`.
    #[must_use]
    pub fn parent(&self, i: usize) -> Option<usize> {
        self.parent[i]
    }

    /// Child indices of `i`, ascending.
    #[must_use]
    pub fn children(&self, i: usize) -> &[usize] {
        let ChildIndex { offsets, children } = &self.child_index;
        &children[offsets[i]..offsets[i + 1]]
    }

    /// Number of children of `i`.
    #[must_use]
    pub fn child_count(&self, i: usize) -> usize {
        self.children(i).len()
    }

    /// Raw CSR layout.
    #[must_use]
    pub fn child_index(&self) -> &ChildIndex {
        &self.child_index
    }

    /// Root indices, ascending.
    #[must_use]
    pub fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    /// Breadth-first order, proximal to distal, roots in ascending id order.
    ///
    /// Every node appears after its parent; iterate in reverse for a
    /// children-before-parent pass.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Component number of `i` (index of its root in [`Self::root_indices`]).
    #[must_use]
    pub fn component(&self, i: usize) -> usize {
        self.component[i]
    }

    /// Number of connected components (= roots).
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.roots.len()
    }

    /// Edge count from `i` to its root.
    #[must_use]
    pub fn depth(&self, i: usize) -> u32 {
        self.depth[i]
    }

    /// Structural role of `i`.
    #[must_use]
    pub fn kind(&self, i: usize) -> NodeKind {
        if self.parent[i].is_none() {
            return NodeKind::Root;
        }
        match self.child_count(i) {
            0 => NodeKind::Leaf,
            1 => NodeKind::Slab,
            _ => NodeKind::Branch,
        }
    }

    /// No children (roots included).
    #[must_use]
    pub fn is_leaf(&self, i: usize) -> bool {
        self.child_count(i) == 0
    }

    /// Two or more children (roots included).
    #[must_use]
    pub fn is_branch(&self, i: usize) -> bool {
        self.child_count(i) >= 2
    }

    /// Undirected neighbours of `i`: parent first, then children.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.parent[i].into_iter().chain(self.children(i).iter().copied())
    }

    /// Subtree sizes (node counts, inclusive) per index.
    #[must_use]
    pub fn subtree_sizes(&self) -> Vec<usize> {
        let mut size = vec![1usize; self.len()];
        for &i in self.order.iter().rev() {
            if let Some(p) = self.parent[i] {
                size[p] += size[i];
            }
        }
        size
    }

    /// Node counts per component.
    #[must_use]
    pub fn component_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.roots.len()];
        for &c in &self.component {
            sizes[c] += 1;
        }
        sizes
    }

    /// Marks every index in the subtree of `i` (inclusive).
    #[must_use]
    pub fn subtree_mask(&self, i: usize) -> Vec<bool> {
        let mut mask = vec![false; self.len()];
        let mut stack = vec![i];
        while let Some(node) = stack.pop() {
            mask[node] = true;
            stack.extend_from_slice(self.children(node));
        }
        mask
    }

    /// Indices on the path from `i` up to its root, starting with `i`.
    #[must_use]
    pub fn path_to_root(&self, i: usize) -> Vec<usize> {
        let mut path = vec![i];
        let mut cursor = self.parent[i];
        while let Some(p) = cursor {
            path.push(p);
            cursor = self.parent[p];
        }
        path
    }

    // ---- id-level API -------------------------------------------------------

    /// Children of `id`, ascending.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, SkeletonError> {
        let i = self.require(id)?;
        Ok(self.children(i).iter().map(|&c| self.ids[c]).collect())
    }

    /// Undirected neighbours of `id`: parent first, then children.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn neighbors_of(&self, id: NodeId) -> Result<Vec<NodeId>, SkeletonError> {
        let i = self.require(id)?;
        Ok(self.neighbors(i).map(|n| self.ids[n]).collect())
    }

    /// Root ids, ascending.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.roots.iter().map(|&r| self.ids[r]).collect()
    }

    /// `true` when the forest has at most one tree.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.roots.len() <= 1
    }

    /// Components as ascending id lists, ordered by root id.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut out = vec![Vec::new(); self.roots.len()];
        for (i, &c) in self.component.iter().enumerate() {
            out[c].push(self.ids[i]);
        }
        out
    }

    /// Directed edges `(child, parent)` in ascending child id order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        (0..self.len()).filter_map(|i| self.parent[i].map(|p| (self.ids[i], self.ids[p])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawNode;

    fn table(rows: &[(i64, Option<i64>)]) -> NodeTable {
        let rows = rows
            .iter()
            .map(|&(id, parent)| RawNode::new(id, parent, [0.0, 0.0, 0.0]));
        NodeTable::from_rows(rows).unwrap_or_default()
    }

    #[test]
    fn builders_agree() {
        let parents = [None, Some(0), Some(0), Some(2), None, Some(4), Some(2)];
        assert_eq!(
            ReferenceBuilder.child_index(&parents),
            CompactBuilder.child_index(&parents)
        );
    }

    #[test]
    fn forest_roots_components_and_kinds() {
        let t = table(&[
            (10, None),
            (11, Some(10)),
            (12, Some(10)),
            (13, Some(12)),
            (20, None),
        ]);
        let topo = Topology::build(&t, GraphBackend::Compact.builder());
        assert_eq!(topo.roots(), vec![NodeId(10), NodeId(20)]);
        assert!(!topo.is_connected());
        assert_eq!(
            topo.components(),
            vec![
                vec![NodeId(10), NodeId(11), NodeId(12), NodeId(13)],
                vec![NodeId(20)]
            ]
        );
        assert_eq!(topo.children_of(NodeId(10)), Ok(vec![NodeId(11), NodeId(12)]));
        let kind = |id: i64| topo.index_of(NodeId(id)).map(|i| topo.kind(i));
        assert_eq!(kind(10), Some(NodeKind::Root));
        assert_eq!(kind(11), Some(NodeKind::Leaf));
        assert_eq!(kind(12), Some(NodeKind::Slab));
        assert_eq!(kind(20), Some(NodeKind::Root));
        assert!(topo.children_of(NodeId(99)).is_err());
    }

    #[test]
    fn order_visits_parents_first_and_tracks_depth() {
        let t = table(&[(1, None), (2, Some(1)), (3, Some(2)), (4, Some(1))]);
        let topo = Topology::build(&t, &ReferenceBuilder);
        let mut seen = vec![false; topo.len()];
        for &i in topo.order() {
            if let Some(p) = topo.parent(i) {
                assert!(seen[p]);
            }
            seen[i] = true;
        }
        assert_eq!(topo.index_of(NodeId(3)).map(|i| topo.depth(i)), Some(2));
        assert_eq!(topo.subtree_sizes(), vec![4, 2, 1, 1]);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let n = 200_000i64;
        let rows = (0..n).map(|i| RawNode::new(i, (i > 0).then_some(i - 1), [0.0; 3]));
        let Ok(t) = NodeTable::from_rows(rows) else {
            unreachable!("valid chain");
        };
        let topo = Topology::build(&t, &CompactBuilder);
        assert_eq!(topo.index_of(NodeId(n - 1)).map(|i| topo.depth(i)), Some(199_999));
        assert_eq!(topo.path_to_root(topo.len() - 1).len(), n as usize);
    }
}
