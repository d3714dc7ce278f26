// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Nearest-neighbour interfaces and two interchangeable implementations.
//!
//! Determinism contract (applies to all implementations used here):
//! - Candidates are ranked by `(squared distance, id)`; among equally distant
//!   points the lowest id wins.
//! - Radius queries return hits sorted by that same key.
//! - Radius bounds are inclusive.
//!
//! `LinearScan` is the `O(n)` per-query baseline kept as the correctness
//! reference; `KdTree` is the accelerated strategy used for healing large
//! fragment sets. Callers pick one at construction time; algorithm code only
//! sees the trait.

use core::cmp::Ordering;

use crate::types::vec3::Vec3;

#[doc = "Bucketed k-d tree over 3D points."]
pub mod kdtree;
#[doc = "Brute-force reference strategy."]
pub mod linear;

/// A query hit: the item id and its squared distance to the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Caller-assigned id of the point.
    pub id: usize,
    /// Squared Euclidean distance to the query point.
    pub distance_squared: f64,
}

impl Neighbor {
    /// Euclidean distance to the query point.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }

    /// Canonical ranking: nearer first, then lower id.
    #[must_use]
    pub fn rank(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then(self.id.cmp(&other.id))
    }

    pub(crate) fn keep_better(best: &mut Option<Self>, candidate: Self) {
        match best {
            Some(b) if candidate.rank(b) != Ordering::Less => {}
            _ => *best = Some(candidate),
        }
    }
}

/// Point-set index answering nearest and radius queries.
///
/// Implementations must return identical results for identical inputs; see
/// the module-level determinism contract.
pub trait NearestNeighbor {
    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Returns `true` when no points are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nearest point whose id passes `accept`, if any.
    fn nearest_where(&self, query: &Vec3, accept: &dyn Fn(usize) -> bool) -> Option<Neighbor>;

    /// Nearest point overall, if any.
    fn nearest(&self, query: &Vec3) -> Option<Neighbor> {
        self.nearest_where(query, &|_| true)
    }

    /// All points within `radius` of `query` (inclusive), canonically sorted.
    fn within(&self, query: &Vec3, radius: f64) -> Vec<Neighbor>;
}
