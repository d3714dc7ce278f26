// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use arbor_geom::Aabb;
use tracing::debug;

use super::{apply, EditMode};
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::mask::NodeMask;
use crate::metrics::geodesic::{GeodesicIndex, Weighting};
use crate::metrics::strahler::{strahler_dense, StrahlerMethod};
use crate::segments::{branch_reach, follow_main};
use crate::skeleton::Skeleton;
use crate::units::Length;

/// Which nodes a prune removes.
#[derive(Clone, Debug)]
pub enum PruneTarget {
    /// Exactly these nodes. Unknown ids are an error.
    Nodes(BTreeSet<NodeId>),
    /// Nodes selected by a mask.
    Mask(NodeMask),
    /// The subtree below `node`, and `node` itself when `inclusive`.
    DistalTo {
        /// Cut point.
        node: NodeId,
        /// Remove `node` too.
        inclusive: bool,
    },
    /// Everything in `node`'s tree outside its subtree, and `node` itself
    /// when `inclusive`. The subtree is kept under either orphan policy.
    ProximalTo {
        /// Cut point.
        node: NodeId,
        /// Remove `node` too.
        inclusive: bool,
    },
    /// Nodes farther than `max` (geodesic, cable-weighted) from `from`.
    /// Nodes in other trees are infinitely far and always removed.
    BeyondDistance {
        /// Reference node.
        from: NodeId,
        /// Distance threshold.
        max: Length,
    },
    /// Terminal segments hanging from a branch point whose cable, including
    /// the edge to the branch point, is shorter than `max_length`. One pass.
    Twigs {
        /// Length threshold.
        max_length: Length,
    },
    /// Nodes whose Strahler index is below the threshold.
    StrahlerBelow(u32),
    /// Nodes outside (`keep_inside`) or inside (`!keep_inside`) a box.
    Region {
        /// Box in coordinate units.
        bounds: Aabb,
        /// Keep nodes inside the box.
        keep_inside: bool,
    },
}

impl PruneTarget {
    /// Explicit node list.
    pub fn nodes<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        Self::Nodes(ids.into_iter().map(Into::into).collect())
    }
}

/// What happens to nodes whose parent is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrphanPolicy {
    /// They become roots; the skeleton may turn into a forest.
    #[default]
    KeepAsRoots,
    /// They are removed together with their subtrees.
    DropDetached,
}

#[derive(PartialEq)]
struct Candidate {
    reach: f64,
    index: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reach
            .total_cmp(&other.reach)
            .then(other.index.cmp(&self.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Skeleton {
    /// Removes the nodes selected by `target`.
    ///
    /// Connectors and soma entries on removed nodes are dropped. Removing
    /// every node is allowed and yields an empty skeleton.
    ///
    /// # Errors
    /// `NotFound` for unknown reference nodes; `InvalidOperation` for
    /// lengths that cannot be converted into coordinate units.
    pub fn prune(
        &mut self,
        target: &PruneTarget,
        orphans: OrphanPolicy,
        mode: EditMode,
    ) -> Result<Cow<'_, Self>, SkeletonError> {
        let (removed, protected) = self.removal_set(target)?;
        apply(self, mode, |s| s.remove_dense(&removed, protected.as_deref(), orphans))
    }

    /// Keeps the `n` longest neurites of a single-rooted skeleton.
    ///
    /// The first neurite is the main path from the root; each further
    /// neurite is the main path from whichever side branch off the kept
    /// arbor carries the most cable (ties: lowest node id). Main paths follow
    /// the child with more distal cable at every fork.
    ///
    /// # Errors
    /// `InvalidOperation` when `n` is zero or the skeleton is not a single tree.
    pub fn longest_neurite(&mut self, n: usize, mode: EditMode) -> Result<Cow<'_, Self>, SkeletonError> {
        if n == 0 {
            return Err(SkeletonError::invalid("longest_neurite", "n must be at least 1"));
        }
        let topo = self.topology();
        let &[root] = topo.root_indices() else {
            return Err(SkeletonError::invalid(
                "longest_neurite",
                format!("expected a single tree, found roots {:?}", topo.roots()),
            ));
        };
        let reach = branch_reach(self, topo);
        let mut keep = vec![false; topo.len()];
        let mut heap = BinaryHeap::new();
        heap.push(Candidate {
            reach: reach[root],
            index: root,
        });
        for _ in 0..n {
            let Some(next) = heap.pop() else {
                break;
            };
            let path = follow_main(topo, &reach, next.index);
            for &i in &path {
                keep[i] = true;
            }
            for &i in &path {
                for &c in topo.children(i) {
                    if !keep[c] {
                        heap.push(Candidate {
                            reach: reach[c],
                            index: c,
                        });
                    }
                }
            }
        }
        let removed: Vec<bool> = keep.iter().map(|k| !k).collect();
        apply(self, mode, |s| s.remove_dense(&removed, None, OrphanPolicy::KeepAsRoots))
    }

    /// Dense removal flags plus an optional set exempt from orphan dropping.
    fn removal_set(&self, target: &PruneTarget) -> Result<(Vec<bool>, Option<Vec<bool>>), SkeletonError> {
        let topo = self.topology();
        let n = topo.len();
        let removed = match target {
            PruneTarget::Nodes(ids) => {
                let mut removed = vec![false; n];
                for &id in ids {
                    removed[topo.require(id)?] = true;
                }
                removed
            }
            PruneTarget::Mask(mask) => mask.select(self.table()),
            PruneTarget::DistalTo { node, inclusive } => {
                let at = topo.require(*node)?;
                let mut removed = topo.subtree_mask(at);
                removed[at] = *inclusive;
                removed
            }
            PruneTarget::ProximalTo { node, inclusive } => {
                let at = topo.require(*node)?;
                let subtree = topo.subtree_mask(at);
                let comp = topo.component(at);
                let removed = (0..n)
                    .map(|i| (topo.component(i) == comp && !subtree[i]) || (i == at && *inclusive))
                    .collect();
                let mut protected = subtree;
                protected[at] = !*inclusive;
                return Ok((removed, Some(protected)));
            }
            PruneTarget::BeyondDistance { from, max } => {
                let at = topo.require(*from)?;
                let max = self.units().to_coordinates(*max)?;
                let geo = GeodesicIndex::new(self, Weighting::Cable);
                (0..n).map(|i| geo.distance_index(at, i) > max).collect()
            }
            PruneTarget::Twigs { max_length } => {
                let max = self.units().to_coordinates(*max_length)?;
                let mut removed = vec![false; n];
                for run in self.segment_index().runs() {
                    let terminal = run.nodes.first().is_some_and(|&i| topo.is_leaf(i));
                    if !terminal || run.anchor.is_none() {
                        continue;
                    }
                    let cable: f64 = run.nodes.iter().map(|&i| self.edge_length(topo, i)).sum();
                    if cable < max {
                        for &i in &run.nodes {
                            removed[i] = true;
                        }
                    }
                }
                removed
            }
            PruneTarget::StrahlerBelow(threshold) => strahler_dense(self, StrahlerMethod::Standard)
                .into_iter()
                .map(|order| order < *threshold)
                .collect(),
            PruneTarget::Region {
                bounds,
                keep_inside,
            } => self
                .table()
                .iter()
                .map(|(_, r)| bounds.contains(&r.position) != *keep_inside)
                .collect(),
        };
        Ok((removed, None))
    }

    /// Applies dense removal flags.
    pub(crate) fn remove_dense(
        &mut self,
        removed: &[bool],
        protected: Option<&[bool]>,
        orphans: OrphanPolicy,
    ) -> Result<(), SkeletonError> {
        let topo = self.topology();
        let mut removed = removed.to_vec();
        if orphans == OrphanPolicy::DropDetached {
            for &i in topo.order() {
                let exempt = protected.is_some_and(|p| p[i]);
                if let Some(p) = topo.parent(i) {
                    if removed[p] && !exempt {
                        removed[i] = true;
                    }
                }
            }
        }
        let mut nodes = BTreeMap::new();
        for (i, (id, record)) in self.table().iter().enumerate() {
            if removed[i] {
                continue;
            }
            let mut record = record.clone();
            record.parent = topo.parent(i).filter(|&p| !removed[p]).map(|p| topo.id(p));
            nodes.insert(id, record);
        }
        debug!(
            skeleton = %self.name(),
            removed = removed.iter().filter(|r| **r).count(),
            kept = nodes.len(),
            "pruned"
        );
        self.replace_nodes(nodes)
    }
}
