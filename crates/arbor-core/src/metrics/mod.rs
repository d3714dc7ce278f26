// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure, non-mutating analyses over a skeleton.
//!
//! Every metric reads the cached topology and segment views and returns
//! plain data. Per-node results are [`NodeMap`]s keyed by node id so they can
//! be handed to colour-mapping and export collaborators unchanged.
use std::collections::BTreeMap;

use crate::ident::NodeId;

/// Cable length (total, masked, per segment).
pub mod cable;
/// Closed-form betweenness centrality for trees.
pub mod betweenness;
/// Synaptic flow centrality and segregation.
pub mod flow;
/// Along-the-arbor distances.
pub mod geodesic;
/// Radius-dependent measures (volume, surface area).
pub mod radius;
/// Strahler stream order.
pub mod strahler;

/// Per-node scalar, ordered by node id.
pub type NodeMap<T> = BTreeMap<NodeId, T>;

pub use betweenness::{edge_betweenness, node_betweenness};
pub use cable::{cable_length, cable_length_masked, segment_cable};
pub use flow::{flow_centrality, max_flow_node, segregation_index, FlowMode};
pub use geodesic::{
    dist_to_root, geodesic_distance, geodesic_matrix, GeodesicIndex, GeodesicMatrix, Weighting,
};
pub use radius::{surface_area, volume};
pub use strahler::{strahler_index, StrahlerMethod};
