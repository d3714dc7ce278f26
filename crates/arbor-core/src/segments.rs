// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decomposition of a forest into maximal linear runs.
//!
//! A segment starts at a leaf or at a non-root branch point and walks
//! proximally, collecting nodes until the next node would be a branch point
//! (which becomes the segment's anchor) or until it has collected a root
//! that is not itself a branch point.
//!
//! Consequences:
//! - every non-root node belongs to exactly one segment;
//! - a root with fewer than two children closes the segment that reaches it;
//! - a root branch point belongs to no segment and only appears as an anchor.
//!
//! Segments are ordered by `(depth of first node descending, id ascending)`,
//! so each segment is listed before the segment containing its anchor. Any
//! children-before-parent computation can run segment by segment.
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::metrics::cable::distal_cable;
use crate::skeleton::Skeleton;
use crate::topology::Topology;

/// A segment as node ids, distal to proximal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Member nodes, distal first.
    pub nodes: Vec<NodeId>,
    /// Branch point the segment hangs from; not a member.
    pub anchor: Option<NodeId>,
}

/// A segment as dense indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    /// Member indices, distal first.
    pub nodes: Vec<usize>,
    /// Anchor index.
    pub anchor: Option<usize>,
}

/// Cached segment decomposition of a topology.
#[derive(Clone, Debug, Default)]
pub struct SegmentIndex {
    runs: Vec<Run>,
    segment_of: Vec<Option<usize>>,
}

impl SegmentIndex {
    /// Decomposes `topo`. Iterative, `O(n)` after sorting the starts.
    #[must_use]
    pub fn build(topo: &Topology) -> Self {
        let n = topo.len();
        let mut starts: Vec<usize> = (0..n)
            .filter(|&i| topo.is_leaf(i) || (topo.is_branch(i) && topo.parent(i).is_some()))
            .collect();
        starts.sort_by(|&a, &b| topo.depth(b).cmp(&topo.depth(a)).then(a.cmp(&b)));

        let mut runs = Vec::with_capacity(starts.len());
        let mut segment_of = vec![None; n];
        for start in starts {
            let mut nodes = vec![start];
            let mut anchor = None;
            let mut cursor = topo.parent(start);
            while let Some(p) = cursor {
                if topo.is_branch(p) {
                    anchor = Some(p);
                    break;
                }
                nodes.push(p);
                cursor = topo.parent(p);
            }
            let seg = runs.len();
            for &i in &nodes {
                segment_of[i] = Some(seg);
            }
            runs.push(Run { nodes, anchor });
        }
        Self { runs, segment_of }
    }

    /// Runs, distal first.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns `true` when there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Segment containing index `i`; `None` for root branch points.
    #[must_use]
    pub fn segment_of(&self, i: usize) -> Option<usize> {
        self.segment_of[i]
    }

    /// Id-level copy.
    #[must_use]
    pub fn to_segments(&self, topo: &Topology) -> Vec<Segment> {
        self.runs
            .iter()
            .map(|run| Segment {
                nodes: run.nodes.iter().map(|&i| topo.id(i)).collect(),
                anchor: run.anchor.map(|a| topo.id(a)),
            })
            .collect()
    }
}

/// Walks distally from `start`, at every fork taking the child whose
/// subtree plus connecting edge carries the most cable. Equal cable goes to
/// the lowest id.
pub(crate) fn follow_main(topo: &Topology, reach: &[f64], start: usize) -> Vec<usize> {
    let mut path = vec![start];
    let mut cursor = start;
    loop {
        let mut best: Option<usize> = None;
        for &c in topo.children(cursor) {
            match best {
                Some(b) if reach[c] <= reach[b] => {}
                _ => best = Some(c),
            }
        }
        match best {
            Some(next) => {
                path.push(next);
                cursor = next;
            }
            None => return path,
        }
    }
}

/// Cable reachable from each node through its parent edge: the node's
/// subtree cable plus the edge to its parent.
pub(crate) fn branch_reach(skel: &Skeleton, topo: &Topology) -> Vec<f64> {
    let distal = distal_cable(skel, topo);
    (0..topo.len())
        .map(|i| distal[i] + skel.edge_length(topo, i))
        .collect()
}

impl Skeleton {
    /// Main path from `from` to a leaf, proximal to distal.
    ///
    /// At each branch point the child with the greater cumulative distal
    /// cable length is followed; ties go to the lower node id. The rule is
    /// independent of traversal order.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `from` is absent.
    pub fn main_path(&self, from: NodeId) -> Result<Vec<NodeId>, SkeletonError> {
        let topo = self.topology();
        let start = topo.require(from)?;
        let reach = branch_reach(self, topo);
        Ok(follow_main(topo, &reach, start)
            .into_iter()
            .map(|i| topo.id(i))
            .collect())
    }
}
