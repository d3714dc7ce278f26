// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::nearest::{NearestNeighbor, Neighbor};
use crate::types::aabb::Aabb;
use crate::types::vec3::Vec3;

/// Points per leaf bucket. Small buckets keep pruning tight; larger ones cut
/// node overhead. 16 is a conventional middle ground for 3D data.
const LEAF_SIZE: usize = 16;

#[derive(Debug, Clone)]
struct KdNode {
    bounds: Aabb,
    start: usize,
    end: usize,
    /// Indices of the two children in `nodes`, absent for leaves.
    children: Option<(usize, usize)>,
}

/// Bucketed k-d tree over 3D points.
///
/// Built once (median split along the longest axis of each node's bounds) and
/// immutable afterwards. Both construction and queries use explicit stacks, so
/// degenerate inputs (all points collinear, heavy duplication) cannot blow the
/// call stack.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    points: Vec<(usize, Vec3)>,
    nodes: Vec<KdNode>,
}

impl KdTree {
    /// Builds a tree over the given `(id, point)` pairs.
    #[must_use]
    pub fn build(items: impl IntoIterator<Item = (usize, Vec3)>) -> Self {
        let mut points: Vec<(usize, Vec3)> = items.into_iter().collect();
        let mut nodes = Vec::new();
        let Some(root_bounds) = bounds_of(&points) else {
            return Self { points, nodes };
        };
        nodes.push(KdNode {
            bounds: root_bounds,
            start: 0,
            end: points.len(),
            children: None,
        });

        let mut pending = vec![0usize];
        while let Some(node_idx) = pending.pop() {
            let (start, end, axis) = {
                let node = &nodes[node_idx];
                (node.start, node.end, node.bounds.longest_axis())
            };
            if end - start <= LEAF_SIZE {
                continue;
            }
            let mid = start + (end - start) / 2;
            // Order by (coordinate, id) so the split is a pure function of the
            // point set, independent of input order.
            points[start..end].select_nth_unstable_by(mid - start, |a, b| {
                a.1.component(axis)
                    .total_cmp(&b.1.component(axis))
                    .then(a.0.cmp(&b.0))
            });
            let (Some(left_bounds), Some(right_bounds)) =
                (bounds_of(&points[start..mid]), bounds_of(&points[mid..end]))
            else {
                continue;
            };
            let left = nodes.len();
            nodes.push(KdNode {
                bounds: left_bounds,
                start,
                end: mid,
                children: None,
            });
            let right = nodes.len();
            nodes.push(KdNode {
                bounds: right_bounds,
                start: mid,
                end,
                children: None,
            });
            nodes[node_idx].children = Some((left, right));
            pending.push(left);
            pending.push(right);
        }

        Self { points, nodes }
    }

    /// Bounds of all indexed points, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.bounds)
    }
}

fn bounds_of(points: &[(usize, Vec3)]) -> Option<Aabb> {
    let (first, rest) = points.split_first()?;
    let mut bb = Aabb::new(first.1, first.1);
    for (_, p) in rest {
        bb = bb.including(p);
    }
    Some(bb)
}

impl NearestNeighbor for KdTree {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn nearest_where(&self, query: &Vec3, accept: &dyn Fn(usize) -> bool) -> Option<Neighbor> {
        let mut best: Option<Neighbor> = None;
        if self.nodes.is_empty() {
            return best;
        }
        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            let bound = node.bounds.distance_squared_to(query);
            // Strictly greater: an equally distant box may still hold a
            // lower id.
            if best.is_some_and(|b| bound > b.distance_squared) {
                continue;
            }
            match node.children {
                None => {
                    for (id, p) in &self.points[node.start..node.end] {
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
                }
                Some((left, right)) => {
                    let dl = self.nodes[left].bounds.distance_squared_to(query);
                    let dr = self.nodes[right].bounds.distance_squared_to(query);
                    // Push the farther child first so the nearer one is popped next.
                    if dl <= dr {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }
        best
    }

    fn within(&self, query: &Vec3, radius: f64) -> Vec<Neighbor> {
        let r2 = radius * radius;
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if node.bounds.distance_squared_to(query) > r2 {
                continue;
            }
            match node.children {
                None => {
                    for (id, p) in &self.points[node.start..node.end] {
                        let d2 = p.distance_squared(query);
                        if d2 <= r2 {
                            out.push(Neighbor {
                                id: *id,
                                distance_squared: d2,
                            });
                        }
                    }
                }
                Some((left, right)) => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        out.sort_unstable_by(Neighbor::rank);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<(usize, Vec3)> {
        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                out.push((i * n + j, Vec3::new(i as f64, j as f64, 0.0)));
            }
        }
        out
    }

    #[test]
    fn empty_tree_answers_none() {
        let tree = KdTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.nearest(&Vec3::ZERO).is_none());
        assert!(tree.within(&Vec3::ZERO, 10.0).is_empty());
        assert!(tree.bounds().is_none());
    }

    #[test]
    fn finds_exact_grid_point() {
        let tree = KdTree::build(grid(20));
        let hit = tree.nearest(&Vec3::new(7.1, 3.2, 0.4));
        assert_eq!(hit.map(|h| h.id), Some(7 * 20 + 3));
    }

    #[test]
    fn ties_resolve_to_lowest_id() {
        // Query equidistant from ids 0 and 1.
        let tree = KdTree::build(vec![(1, Vec3::new(1.0, 0.0, 0.0)), (0, Vec3::new(-1.0, 0.0, 0.0))]);
        assert_eq!(tree.nearest(&Vec3::ZERO).map(|h| h.id), Some(0));
    }

    #[test]
    fn filter_skips_rejected_ids() {
        let tree = KdTree::build(grid(10));
        let hit = tree.nearest_where(&Vec3::ZERO, &|id| id != 0);
        // (0,1) and (1,0) are both at distance 1; id 1 is (0,1).
        assert_eq!(hit.map(|h| h.id), Some(1));
        assert!(tree.nearest_where(&Vec3::ZERO, &|_| false).is_none());
    }

    #[test]
    fn duplicated_points_do_not_loop() {
        let items: Vec<_> = (0..100).map(|i| (i, Vec3::new(1.0, 1.0, 1.0))).collect();
        let tree = KdTree::build(items);
        assert_eq!(tree.len(), 100);
        assert_eq!(tree.nearest(&Vec3::ZERO).map(|h| h.id), Some(0));
        assert_eq!(tree.within(&Vec3::ZERO, 2.0).len(), 100);
    }
}
