// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! arbor-core: neuron skeleton topology engine.
//!
//! A [`Skeleton`] is a validated rooted forest of nodes (id, parent, position,
//! optional radius and label) plus connector annotations. On top of the
//! canonical node table the crate builds a dense graph view ([`Topology`]),
//! decomposes it into linear [`Segment`]s, computes per-node metrics
//! (Strahler order, flow centrality, geodesic distances, cable length) and
//! performs structural edits (reroot, prune, cut, heal, stitch, resample).
//!
//! Everything here is single-threaded and synchronous per skeleton. Derived
//! views are built lazily into write-once caches, so a `&Skeleton` can be
//! shared read-only across threads; batch parallelism lives in `arbor-batch`.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::option_if_let_else,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

/// Structural edits (reroot, prune, cut, heal, resample).
pub mod edit;
/// Topological analyses over a skeleton.
pub mod metrics;

mod digest;
mod error;
mod ident;
mod mask;
mod neuron;
mod record;
mod segments;
mod skeleton;
mod table;
mod topology;
mod units;

// Re-exports for stable public API
/// Geometry primitives used throughout the API.
pub use arbor_geom::{Aabb, Vec3};
/// Canonical BLAKE3 fingerprints of the node table and edge set.
pub use digest::{edge_digest, table_digest, to_hex};
/// Edit mode and per-operation option types.
pub use edit::{
    stitch, CutPieces, EditMode, Eligibility, HealEdge, HealOptions, OrphanPolicy, PruneTarget,
    ResampleTarget, SearchStrategy, DEFAULT_RESAMPLE_LIMIT,
};
/// Error taxonomy.
pub use error::{IntegrityError, Missing, SkeletonError, Unavailable};
/// Identifier types.
pub use ident::{ConnectorId, Hash, NodeId};
/// Node subsets for scoping operations.
pub use mask::{NodeMask, NodePredicate};
/// Closed set of neuron representations.
pub use neuron::{Dotprops, MeshNeuron, Neuron, NeuronCore, VoxelNeuron};
/// Node and connector records.
pub use record::{Connector, ConnectorKind, NodeLabel, NodeRecord, RawNode};
/// Segment decomposition.
pub use segments::{Run, Segment, SegmentIndex};
/// The skeleton aggregate and its builder.
pub use skeleton::{Skeleton, SkeletonBuilder};
/// Canonical node table.
pub use table::{Columns, NodeTable};
/// Graph view and its construction strategies.
pub use topology::{
    ChildIndex, CompactBuilder, GraphBackend, NodeKind, ReferenceBuilder, Topology,
    TopologyBuilder,
};
/// Physical units.
pub use units::{Length, LengthUnit, Units};
