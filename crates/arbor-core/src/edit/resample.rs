// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resampling node density along the arbor.
//!
//! Fixed nodes are roots, leaves, branch points and soma nodes. Between two
//! fixed nodes lies a run of interior nodes; every run of arc length `L` is
//! replaced by `k = max(1, round(L / S))` equal intervals, i.e. `k - 1`
//! interpolated interior nodes. Topology (roots, leaves, branch points) is
//! preserved by construction. Results larger than a node limit are refused
//! before anything is allocated.
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use arbor_geom::Vec3;
use tracing::debug;

use super::{apply, EditMode};
use crate::error::SkeletonError;
use crate::ident::{ConnectorId, NodeId};
use crate::record::{NodeLabel, NodeRecord};
use crate::skeleton::Skeleton;
use crate::topology::Topology;
use crate::units::Length;

/// Node count above which [`Skeleton::resample`] refuses to run.
pub const DEFAULT_RESAMPLE_LIMIT: usize = 10_000_000;

/// Desired density.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResampleTarget {
    /// Target distance between consecutive nodes.
    Spacing(Length),
    /// Approximate total node count after resampling.
    ///
    /// Translated into a spacing `S = L / (n - F + P)` where `L` is the
    /// resampled cable, `F` the number of fixed nodes and `P` the number of
    /// runs. Must be at least `F`.
    Count(usize),
}

/// Interior stretch between a distal fixed node and a proximal fixed node.
struct Stretch {
    /// Dense indices `[distal fixed, interior..., proximal fixed]`.
    path: Vec<usize>,
    /// Cumulative arc length at each point of `path`.
    arc: Vec<f64>,
}

impl Stretch {
    fn length(&self) -> f64 {
        self.arc.last().copied().unwrap_or(0.0)
    }

    /// Position, radius and label at arc length `t` from the distal end.
    ///
    /// The label is that of the original node nearest by arc length, the
    /// distal one on ties.
    fn sample(
        &self,
        t: f64,
        positions: &[Vec3],
        radii: &[Option<f64>],
        labels: &[Option<NodeLabel>],
    ) -> (Vec3, Option<f64>, Option<NodeLabel>) {
        let last = self.path.len() - 1;
        let mut s = 0;
        while s + 1 < last && self.arc[s + 1] < t {
            s += 1;
        }
        let (a, b) = (self.path[s], self.path[s + 1]);
        let span = self.arc[s + 1] - self.arc[s];
        let frac = if span > 0.0 {
            ((t - self.arc[s]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let radius = match (radii[a], radii[b]) {
            (Some(ra), Some(rb)) => Some(ra + (rb - ra) * frac),
            _ => None,
        };
        let label = if frac <= 0.5 { labels[a] } else { labels[b] };
        (positions[a].lerp(&positions[b], frac), radius, label)
    }
}

fn stretches(topo: &Topology, fixed: &[bool], positions: &[Vec3]) -> Vec<Stretch> {
    let mut out = Vec::new();
    for (start, &is_fixed) in fixed.iter().enumerate() {
        if !is_fixed || topo.parent(start).is_none() {
            continue;
        }
        let mut path = vec![start];
        let mut arc = vec![0.0];
        let mut cursor = topo.parent(start);
        while let Some(p) = cursor {
            let prev = path[path.len() - 1];
            arc.push(arc[arc.len() - 1] + positions[prev].distance(&positions[p]));
            path.push(p);
            if fixed[p] {
                break;
            }
            cursor = topo.parent(p);
        }
        out.push(Stretch { path, arc });
    }
    out
}

impl Skeleton {
    /// Resamples every run between fixed nodes to the target density.
    ///
    /// New nodes get ids above the current maximum, assigned run by run in
    /// ascending order of the run's distal node and distal to proximal
    /// within a run. Positions and radii are linearly interpolated along the
    /// original polyline; a radius is unknown when either neighbouring
    /// original radius is. A new node takes the label of the nearest original
    /// node on its polyline segment. Connectors on removed nodes move to the
    /// nearest node of the same run by arc position (ties: the more distal
    /// node).
    ///
    /// Refuses results above [`DEFAULT_RESAMPLE_LIMIT`] nodes; see
    /// [`Self::resample_with_limit`].
    ///
    /// # Errors
    /// `InvalidOperation` for a non-positive spacing, a count below the number
    /// of fixed nodes, a result above the node limit, or lengths that cannot
    /// be converted.
    pub fn resample(&mut self, target: ResampleTarget, mode: EditMode) -> Result<Cow<'_, Self>, SkeletonError> {
        self.resample_with_limit(target, DEFAULT_RESAMPLE_LIMIT, mode)
    }

    /// [`Self::resample`] with an explicit cap on the resulting node count.
    ///
    /// # Errors
    /// As [`Self::resample`], with `max_nodes` as the limit.
    pub fn resample_with_limit(
        &mut self,
        target: ResampleTarget,
        max_nodes: usize,
        mode: EditMode,
    ) -> Result<Cow<'_, Self>, SkeletonError> {
        let topo = self.topology();
        let soma: BTreeSet<NodeId> = self.soma().iter().copied().collect();
        let fixed: Vec<bool> = (0..topo.len())
            .map(|i| topo.parent(i).is_none() || topo.child_count(i) != 1 || soma.contains(&topo.id(i)))
            .collect();
        let positions = self.positions();
        let radii: Vec<Option<f64>> = self.table().iter().map(|(_, r)| r.radius).collect();
        let labels: Vec<Option<NodeLabel>> = self.table().iter().map(|(_, r)| r.label).collect();
        let runs = stretches(topo, &fixed, &positions);
        let total: f64 = runs.iter().map(Stretch::length).sum();
        let fixed_count = fixed.iter().filter(|f| **f).count();

        let spacing = match target {
            ResampleTarget::Spacing(len) => {
                let s = self.units().to_coordinates(len)?;
                if s <= 0.0 {
                    return Err(SkeletonError::invalid("resample", "spacing must be positive"));
                }
                s
            }
            ResampleTarget::Count(n) => {
                if n < fixed_count {
                    return Err(SkeletonError::invalid(
                        "resample",
                        format!("count {n} is below the {fixed_count} fixed nodes"),
                    ));
                }
                let slots = n - fixed_count + runs.len();
                if runs.is_empty() || total <= 0.0 || slots == 0 {
                    return apply(self, mode, |_| Ok(()));
                }
                total / slots as f64
            }
        };

        // Interval count per run, checked against the limit in floating point
        // so a tiny spacing cannot overflow or allocate.
        let intervals: Vec<f64> = runs
            .iter()
            .map(|run| (run.length() / spacing).round().max(1.0))
            .collect();
        let planned = fixed_count as f64 + intervals.iter().map(|k| k - 1.0).sum::<f64>();
        if planned > max_nodes as f64 {
            return Err(SkeletonError::invalid(
                "resample",
                format!("spacing {spacing} would create {planned:.0} nodes, above the limit of {max_nodes}"),
            ));
        }

        let mut next_id = self.table().max_id().map_or(0, |m| m.0 + 1);
        let mut nodes: BTreeMap<NodeId, NodeRecord> = BTreeMap::new();
        for (i, (id, r)) in self.table().iter().enumerate() {
            if fixed[i] {
                nodes.insert(id, r.clone());
            }
        }
        let interior_of: BTreeMap<usize, (usize, f64)> = runs
            .iter()
            .enumerate()
            .flat_map(|(k, run)| {
                let last = run.path.len() - 1;
                (1..last).map(move |p| (run.path[p], (k, run.arc[p])))
            })
            .collect();

        // Per run: ids along the new run, distal fixed first, proximal fixed last.
        let mut new_runs: Vec<(Vec<NodeId>, Vec<f64>)> = Vec::with_capacity(runs.len());
        for (run, &k) in runs.iter().zip(&intervals) {
            let len = run.length();
            let k = k as usize;
            let distal = topo.id(run.path[0]);
            let proximal = topo.id(run.path[run.path.len() - 1]);
            let mut ids = vec![distal];
            let mut arcs = vec![0.0];
            for j in 1..k {
                let t = len * j as f64 / k as f64;
                let (position, radius, label) = run.sample(t, &positions, &radii, &labels);
                let id = NodeId(next_id);
                next_id += 1;
                nodes.insert(
                    id,
                    NodeRecord {
                        parent: None,
                        position,
                        radius,
                        label,
                    },
                );
                ids.push(id);
                arcs.push(t);
            }
            ids.push(proximal);
            arcs.push(len);
            for pair in ids.windows(2) {
                if let Some(r) = nodes.get_mut(&pair[0]) {
                    r.parent = Some(pair[1]);
                }
            }
            new_runs.push((ids, arcs));
        }

        let mut moves: BTreeMap<ConnectorId, NodeId> = BTreeMap::new();
        for c in self.connector_map().values() {
            let Some(i) = topo.index_of(c.node) else {
                continue;
            };
            let Some(&(k, at)) = interior_of.get(&i) else {
                continue;
            };
            let (ids, arcs) = &new_runs[k];
            let mut best = 0;
            for (j, a) in arcs.iter().enumerate() {
                if (a - at).abs() < (arcs[best] - at).abs() {
                    best = j;
                }
            }
            moves.insert(c.id, ids[best]);
        }

        debug!(
            skeleton = %self.name(),
            spacing,
            runs = runs.len(),
            nodes_before = topo.len(),
            nodes_after = nodes.len(),
            "resampled"
        );
        apply(self, mode, |s| s.replace_nodes_moving(nodes, &moves))
    }
}
