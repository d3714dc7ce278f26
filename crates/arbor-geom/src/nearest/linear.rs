// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::nearest::{NearestNeighbor, Neighbor};
use crate::types::vec3::Vec3;

/// Brute-force nearest-neighbour index: every query scans every point.
///
/// Serves as the correctness baseline the k-d tree is tested against, and is
/// the cheaper choice for the handful of points typical of small fragments.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    items: Vec<(usize, Vec3)>,
}

impl LinearScan {
    /// Indexes the given `(id, point)` pairs.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = (usize, Vec3)>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl NearestNeighbor for LinearScan {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn nearest_where(&self, query: &Vec3, accept: &dyn Fn(usize) -> bool) -> Option<Neighbor> {
        let mut best = None;
        for (id, p) in &self.items {
            if !accept(*id) {
                continue;
            }
            Neighbor::keep_better(
                &mut best,
                Neighbor {
                    id: *id,
                    distance_squared: p.distance_squared(query),
                },
            );
        }
        best
    }

    fn within(&self, query: &Vec3, radius: f64) -> Vec<Neighbor> {
        let r2 = radius * radius;
        let mut out: Vec<Neighbor> = self
            .items
            .iter()
            .map(|(id, p)| Neighbor {
                id: *id,
                distance_squared: p.distance_squared(query),
            })
            .filter(|n| n.distance_squared <= r2)
            .collect();
        out.sort_unstable_by(Neighbor::rank);
        out
    }
}
