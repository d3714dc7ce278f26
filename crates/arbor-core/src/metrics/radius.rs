// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::f64::consts::PI;

use crate::error::{SkeletonError, Unavailable};
use crate::ident::NodeId;
use crate::skeleton::Skeleton;

/// Radii of both ends of every edge, or the list of nodes lacking one.
fn edge_radii(skel: &Skeleton) -> Result<Vec<(f64, f64, f64)>, SkeletonError> {
    let missing: Vec<NodeId> = skel
        .table()
        .iter()
        .filter(|(_, r)| r.radius.is_none())
        .map(|(id, _)| id)
        .collect();
    if !missing.is_empty() {
        return Err(Unavailable::MissingRadius(missing).into());
    }
    let topo = skel.topology();
    let table = skel.table();
    let radius = |i: usize| table.get(topo.id(i)).and_then(|r| r.radius).unwrap_or(0.0);
    Ok((0..topo.len())
        .filter_map(|i| {
            topo.parent(i)
                .map(|p| (radius(i), radius(p), skel.edge_length(topo, i)))
        })
        .collect())
}

/// Volume of the arbor modelled as a chain of truncated cones.
///
/// # Errors
/// [`Unavailable::MissingRadius`] naming every node without a radius.
pub fn volume(skel: &Skeleton) -> Result<f64, SkeletonError> {
    Ok(edge_radii(skel)?
        .into_iter()
        .map(|(r1, r2, h)| PI * h * (r1 * r1 + r1 * r2 + r2 * r2) / 3.0)
        .sum())
}

/// Lateral surface area of the truncated-cone model (caps excluded).
///
/// # Errors
/// [`Unavailable::MissingRadius`] naming every node without a radius.
pub fn surface_area(skel: &Skeleton) -> Result<f64, SkeletonError> {
    Ok(edge_radii(skel)?
        .into_iter()
        .map(|(r1, r2, h)| PI * (r1 + r2) * (r1 - r2).hypot(h))
        .sum())
}
