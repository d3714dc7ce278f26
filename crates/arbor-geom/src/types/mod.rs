// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the engine (points, AABBs).
//!
//! Determinism notes:
//! - Containment and overlap are inclusive on faces.
//! - Arithmetic is plain `f64` without fused multiply-add so identical inputs
//!   produce identical bits across platforms.

#[doc = "Axis-aligned bounding boxes."]
pub mod aabb;
#[doc = "Three-component vectors (points and directions)."]
pub mod vec3;
