// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconnecting fragments by nearest-node edges.
//!
//! Healing computes a minimum spanning forest over the fragments with
//! Borůvka's algorithm: each round, every fragment group asks the spatial
//! index for its nearest eligible node in a different group, and all those
//! cheapest outgoing edges are merged at once. The number of groups at least
//! halves per round, so `F` fragments need `O(log F)` rounds instead of the
//! `O(F²)` pairwise scan.
//!
//! Candidate edges are totally ordered by `(squared distance, lower node id,
//! higher node id)`, which keeps the forest cycle-free under ties and makes
//! the result independent of the search strategy.
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use arbor_geom::{KdTree, LinearScan, NearestNeighbor};
use tracing::{debug, warn};

use super::{apply, EditMode};
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::mask::NodeMask;
use crate::skeleton::Skeleton;
use crate::units::Length;

/// Which nodes may receive a healing edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Eligibility {
    /// Any node.
    #[default]
    All,
    /// Only leaves and roots (fragment endpoints).
    LeavesAndRoots,
}

/// Nearest-neighbour strategy used while healing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    /// Brute-force scan; the reference.
    Linear,
    /// k-d tree.
    #[default]
    KdTree,
}

/// Healing parameters.
#[derive(Clone, Debug, Default)]
pub struct HealOptions {
    /// Only node pairs where both ends are selected are eligible.
    pub mask: NodeMask,
    /// Structural eligibility of endpoints.
    pub eligibility: Eligibility,
    /// Longest edge that may be added; unlimited when `None`.
    pub max_distance: Option<Length>,
    /// Spatial search strategy.
    pub strategy: SearchStrategy,
}

/// An edge added by healing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealEdge {
    /// Node of the attached fragment; its fragment is rerooted here.
    pub child: NodeId,
    /// Node it now hangs from.
    pub parent: NodeId,
    /// Edge length in coordinate units.
    pub distance: f64,
}

#[derive(Clone, Copy)]
struct Candidate {
    d2: f64,
    lo: usize,
    hi: usize,
}

impl Candidate {
    fn new(d2: f64, a: usize, b: usize) -> Self {
        Self {
            d2,
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    fn key(&self, other: &Self) -> Ordering {
        self.d2
            .total_cmp(&other.d2)
            .then(self.lo.cmp(&other.lo))
            .then(self.hi.cmp(&other.hi))
    }
}

/// Union-find with the smallest member as representative.
struct Groups {
    parent: Vec<usize>,
}

impl Groups {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[drop] = keep;
        true
    }
}

struct Plan {
    parents: Vec<Option<usize>>,
    edges: Vec<HealEdge>,
}

impl Skeleton {
    /// Connects the skeleton's trees into as few trees as the options allow.
    ///
    /// Each group of connected fragments keeps one base fragment unchanged:
    /// the fragment holding the lowest soma node, else the largest, else the
    /// one with the lowest root id. Every other fragment is rerooted at its
    /// healing endpoint and hung from its partner node.
    ///
    /// # Errors
    /// `InvalidOperation` when `max_distance` cannot be converted into
    /// coordinate units.
    pub fn heal(&mut self, options: &HealOptions, mode: EditMode) -> Result<Cow<'_, Self>, SkeletonError> {
        let plan = self.plan_heal(options)?;
        apply(self, mode, |s| {
            if plan.edges.is_empty() {
                return Ok(());
            }
            s.apply_parents(&plan.parents)
        })
    }

    /// The edges [`Self::heal`] would add, in attachment order.
    ///
    /// # Errors
    /// As for [`Self::heal`].
    pub fn heal_edges(&self, options: &HealOptions) -> Result<Vec<HealEdge>, SkeletonError> {
        Ok(self.plan_heal(options)?.edges)
    }

    fn plan_heal(&self, options: &HealOptions) -> Result<Plan, SkeletonError> {
        let max_d2 = match options.max_distance {
            Some(len) => {
                let d = self.units().to_coordinates(len)?;
                Some(d * d)
            }
            None => None,
        };
        let topo = self.topology();
        let mut parents: Vec<Option<usize>> = (0..topo.len()).map(|i| topo.parent(i)).collect();
        let fragments = topo.component_count();
        if fragments <= 1 {
            return Ok(Plan {
                parents,
                edges: Vec::new(),
            });
        }

        let positions = self.positions();
        let selected = options.mask.select(self.table());
        let candidates: Vec<usize> = (0..topo.len())
            .filter(|&i| selected[i])
            .filter(|&i| match options.eligibility {
                Eligibility::All => true,
                Eligibility::LeavesAndRoots => topo.is_leaf(i) || topo.parent(i).is_none(),
            })
            .collect();
        let items = candidates.iter().enumerate().map(|(k, &i)| (k, positions[i]));
        let index: Box<dyn NearestNeighbor> = match options.strategy {
            SearchStrategy::Linear => Box::new(LinearScan::new(items)),
            SearchStrategy::KdTree => Box::new(KdTree::build(items)),
        };

        // Borůvka rounds over fragment groups.
        let mut groups = Groups::new(fragments);
        let mut chosen: Vec<Candidate> = Vec::new();
        loop {
            let label: Vec<usize> = candidates
                .iter()
                .map(|&i| groups.find(topo.component(i)))
                .collect();
            let mut best: Vec<Option<Candidate>> = vec![None; fragments];
            for (k, &u) in candidates.iter().enumerate() {
                let own = label[k];
                let Some(hit) = index.nearest_where(&positions[u], &|j: usize| label[j] != own) else {
                    continue;
                };
                if max_d2.is_some_and(|m| hit.distance_squared > m) {
                    continue;
                }
                let cand = Candidate::new(hit.distance_squared, u, candidates[hit.id]);
                match &best[own] {
                    Some(b) if cand.key(b) != Ordering::Less => {}
                    _ => best[own] = Some(cand),
                }
            }
            let mut round: Vec<Candidate> = best.into_iter().flatten().collect();
            round.sort_by(Candidate::key);
            let mut merged = 0;
            for cand in round {
                if groups.union(topo.component(cand.lo), topo.component(cand.hi)) {
                    chosen.push(cand);
                    merged += 1;
                }
            }
            if merged == 0 {
                break;
            }
        }

        // Orient: walk each group outward from its base fragment.
        let mut links: Vec<Vec<(usize, usize, f64)>> = vec![Vec::new(); fragments];
        for c in &chosen {
            let (a, b) = (c.lo, c.hi);
            links[topo.component(a)].push((a, b, c.d2));
            links[topo.component(b)].push((b, a, c.d2));
        }
        let sizes = topo.component_sizes();
        let mut soma_fragment: BTreeMap<usize, usize> = BTreeMap::new();
        for id in self.soma() {
            if let Some(i) = topo.index_of(*id) {
                let c = topo.component(i);
                soma_fragment.entry(groups.find(c)).or_insert(c);
            }
        }
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for c in 0..fragments {
            members.entry(groups.find(c)).or_default().push(c);
        }

        let mut edges = Vec::with_capacity(chosen.len());
        let mut visited = vec![false; fragments];
        for (rep, comps) in &members {
            let base = soma_fragment.get(rep).copied().unwrap_or_else(|| {
                comps
                    .iter()
                    .copied()
                    .max_by(|&a, &b| sizes[a].cmp(&sizes[b]).then(b.cmp(&a)))
                    .unwrap_or(*rep)
            });
            visited[base] = true;
            let mut queue = VecDeque::from([base]);
            while let Some(c) = queue.pop_front() {
                for &(from, to, d2) in &links[c] {
                    let target = topo.component(to);
                    if visited[target] {
                        continue;
                    }
                    visited[target] = true;
                    reroot_dense(&mut parents, to);
                    parents[to] = Some(from);
                    edges.push(HealEdge {
                        child: topo.id(to),
                        parent: topo.id(from),
                        distance: d2.sqrt(),
                    });
                    queue.push_back(target);
                }
            }
        }

        let remaining = members.len();
        debug!(
            skeleton = %self.name(),
            fragments,
            edges = edges.len(),
            "heal planned"
        );
        if remaining > 1 {
            warn!(
                skeleton = %self.name(),
                remaining,
                "fragments left unconnected"
            );
        }
        Ok(Plan { parents, edges })
    }

    fn apply_parents(&mut self, parents: &[Option<usize>]) -> Result<(), SkeletonError> {
        let topo = self.topology();
        let nodes = self
            .table()
            .iter()
            .enumerate()
            .map(|(i, (id, r))| {
                let mut r = r.clone();
                r.parent = parents[i].map(|p| topo.id(p));
                (id, r)
            })
            .collect();
        self.replace_nodes(nodes)
    }
}

/// Flips the parent chain above `node` in a dense parent array.
fn reroot_dense(parents: &mut [Option<usize>], node: usize) {
    let mut prev: Option<usize> = None;
    let mut cursor = Some(node);
    while let Some(i) = cursor {
        let next = parents[i];
        parents[i] = prev;
        prev = Some(i);
        cursor = next;
    }
}

/// Merges separate skeletons into one and heals it.
///
/// The first fragment keeps its ids. A later fragment whose node (or
/// connector) ids collide with those already merged is shifted past the
/// current maximum as a block. Name, units and strategy come from the first
/// fragment.
///
/// # Errors
/// `InvalidOperation` for an empty list or mismatched units; errors from
/// [`Skeleton::heal`].
pub fn stitch(fragments: Vec<Skeleton>, options: &HealOptions) -> Result<Skeleton, SkeletonError> {
    let mut parts = fragments.into_iter();
    let Some(mut merged) = parts.next() else {
        return Err(SkeletonError::invalid("stitch", "no fragments given"));
    };
    for (k, mut part) in parts.enumerate() {
        if part.units() != merged.units() {
            return Err(SkeletonError::invalid(
                "stitch",
                format!(
                    "fragment #{} `{}` has units {} but `{}` has {}",
                    k + 1,
                    part.name(),
                    part.units(),
                    merged.name(),
                    merged.units()
                ),
            ));
        }
        let node_offset = match (merged.table().max_id(), part.table().ids().next()) {
            (Some(max), Some(min)) if part.table().ids().any(|id| merged.contains(id)) => {
                max.0 + 1 - min.0
            }
            _ => 0,
        };
        let ids = merged.connector_map();
        let connector_offset = match (ids.keys().next_back(), part.connector_map().keys().next()) {
            (Some(max), Some(min)) if part.connector_map().keys().any(|id| ids.contains_key(id)) => {
                max.0 + 1 - min.0
            }
            _ => 0,
        };
        if node_offset != 0 || connector_offset != 0 {
            debug!(
                fragment = k + 1,
                node_offset,
                connector_offset,
                "renumbering colliding fragment"
            );
        }
        part.renumber(node_offset, connector_offset);
        merged.absorb(part)?;
    }
    merged.heal(options, EditMode::InPlace)?;
    Ok(merged)
}
