// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![deny(
    clippy::all,
    clippy::pedantic,
    rust_2018_idioms,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![doc = r"Geometry primitives for arbor.

This crate provides:
- 3D points and directions (`Vec3`).
- Axis-aligned bounding boxes (`Aabb`).
- A nearest-neighbour strategy trait with a linear-scan baseline and a k-d tree.

Design notes:
- Deterministic: equal distances are resolved by the lowest item id, in every
  strategy, so query results never depend on insertion order.
- Float64 throughout; skeleton coordinates routinely exceed the range where
  float32 keeps sub-unit precision (nanometre-scale connectome data).
- Queries are iterative; no recursion depth grows with the point count.
"]

/// Nearest-neighbour search strategies.
pub mod nearest;
/// Foundational geometric types.
pub mod types;

pub use nearest::kdtree::KdTree;
pub use nearest::linear::LinearScan;
pub use nearest::{Neighbor, NearestNeighbor};
pub use types::aabb::Aabb;
pub use types::vec3::Vec3;
