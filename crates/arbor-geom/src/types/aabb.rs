// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::types::vec3::Vec3;

/// Axis-aligned bounding box.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Values share the coordinate units of the points they bound.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Constructs an AABB spanning two corners.
    ///
    /// The corners may be given in any order; they are sorted per axis so the
    /// `min <= max` invariant always holds.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(&b),
            max: a.max(&b),
        }
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Builds an AABB centered at `center` with half-extents `hx, hy, hz`.
    #[must_use]
    pub fn from_center_half_extents(center: Vec3, hx: f64, hy: f64, hz: f64) -> Self {
        let he = Vec3::new(hx.abs(), hy.abs(), hz.abs());
        Self::new(center.sub(&he), center.add(&he))
    }

    /// Returns `true` if `point` lies inside the box (inclusive on faces).
    #[must_use]
    pub fn contains(&self, point: &Vec3) -> bool {
        (0..3).all(|axis| {
            let c = point.component(axis);
            c >= self.min.component(axis) && c <= self.max.component(axis)
        })
    }

    /// Returns `true` if this AABB overlaps another (inclusive on faces).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|axis| {
            self.max.component(axis) >= other.min.component(axis)
                && self.min.component(axis) <= other.max.component(axis)
        })
    }

    /// Returns the union of two AABBs.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Grows the box so it also contains `point`.
    #[must_use]
    pub fn including(&self, point: &Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Inflates the box by a uniform margin `m` in all directions.
    #[must_use]
    pub fn inflate(&self, m: f64) -> Self {
        let delta = Vec3::new(m, m, m);
        Self::new(self.min.sub(&delta), self.max.add(&delta))
    }

    /// Extent along each axis.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max.sub(&self.min)
    }

    /// Axis (`0..3`) with the largest extent; ties prefer the lower axis.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        let mut axis = 0;
        for candidate in 1..3 {
            if e.component(candidate) > e.component(axis) {
                axis = candidate;
            }
        }
        axis
    }

    /// Squared distance from `point` to the closest point of the box.
    ///
    /// Zero when the point is inside. Used as the pruning bound for k-d tree
    /// queries.
    #[must_use]
    pub fn distance_squared_to(&self, point: &Vec3) -> f64 {
        let mut acc = 0.0;
        for axis in 0..3 {
            let c = point.component(axis);
            let lo = self.min.component(axis);
            let hi = self.max.component(axis);
            let d = if c < lo {
                lo - c
            } else if c > hi {
                c - hi
            } else {
                0.0
            };
            acc += d * d;
        }
        acc
    }

    /// Builds the minimal AABB that contains all `points`.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bb = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            bb = bb.including(p);
        }
        Some(bb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_sorted() {
        let bb = Aabb::new(Vec3::new(1.0, -1.0, 5.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(bb.min(), Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(bb.max(), Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let bb = Aabb::from_center_half_extents(Vec3::ZERO, 1.0, 1.0, 1.0);
        assert!(bb.contains(&Vec3::new(1.0, 0.0, -1.0)));
        assert!(!bb.contains(&Vec3::new(1.0001, 0.0, 0.0)));
    }

    #[test]
    fn distance_to_box() {
        let bb = Aabb::from_center_half_extents(Vec3::ZERO, 1.0, 1.0, 1.0);
        assert_eq!(bb.distance_squared_to(&Vec3::ZERO), 0.0);
        assert_eq!(bb.distance_squared_to(&Vec3::new(3.0, 0.0, 0.0)), 4.0);
        assert_eq!(bb.distance_squared_to(&Vec3::new(2.0, 2.0, 0.0)), 2.0);
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb::from_points(&[]).is_none());
        let bb = Aabb::from_points(&[Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 0.0, -3.0)]);
        assert_eq!(
            bb,
            Some(Aabb::new(Vec3::new(0.0, 0.0, -3.0), Vec3::new(1.0, 2.0, 0.0)))
        );
    }

    #[test]
    fn longest_axis_prefers_lower_on_ties() {
        let bb = Aabb::from_center_half_extents(Vec3::ZERO, 1.0, 1.0, 0.5);
        assert_eq!(bb.longest_axis(), 0);
        let bb = Aabb::from_center_half_extents(Vec3::ZERO, 1.0, 1.0, 3.0);
        assert_eq!(bb.longest_axis(), 2);
    }
}
