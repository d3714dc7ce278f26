// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical fingerprints of skeleton content.
//!
//! Table digest layout (all integers little-endian, floats as IEEE-754 bits):
//! - version tag `u16`
//! - node count `u64`
//! - per node in ascending id: id `i64`, parent flag `u8` (+ parent `i64`),
//!   position `3 × f64`, radius flag `u8` (+ radius `f64`), label flag `u8`
//!   (+ 3-byte label tag)
//!
//! Edge digest layout: version tag, edge count `u64`, then every undirected
//! edge as `(min id, max id)` pairs in ascending order. Rerooting does not
//! change the edge digest.
use blake3::Hasher;

use crate::ident::{Hash, NodeId};
use crate::table::NodeTable;
use crate::topology::Topology;

const TABLE_DIGEST_VERSION: u16 = 1;
const EDGE_DIGEST_VERSION: u16 = 1;

/// Digest of the canonical node table.
#[must_use]
pub fn table_digest(table: &NodeTable) -> Hash {
    let mut h = Hasher::new();
    h.update(&TABLE_DIGEST_VERSION.to_le_bytes());
    h.update(&(table.len() as u64).to_le_bytes());
    for (id, r) in table.iter() {
        h.update(&id.0.to_le_bytes());
        match r.parent {
            Some(p) => {
                h.update(&[1]);
                h.update(&p.0.to_le_bytes());
            }
            None => {
                h.update(&[0]);
            }
        }
        for v in r.position.to_array() {
            h.update(&v.to_bits().to_le_bytes());
        }
        match r.radius {
            Some(radius) => {
                h.update(&[1]);
                h.update(&radius.to_bits().to_le_bytes());
            }
            None => {
                h.update(&[0]);
            }
        }
        match r.label {
            Some(label) => {
                h.update(&[1]);
                h.update(&label.tag());
            }
            None => {
                h.update(&[0]);
            }
        }
    }
    h.finalize().into()
}

/// Digest of the undirected edge set.
#[must_use]
pub fn edge_digest(topo: &Topology) -> Hash {
    let mut edges: Vec<(NodeId, NodeId)> = topo
        .edges()
        .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
        .collect();
    edges.sort_unstable();
    let mut h = Hasher::new();
    h.update(&EDGE_DIGEST_VERSION.to_le_bytes());
    h.update(&(edges.len() as u64).to_le_bytes());
    for (a, b) in edges {
        h.update(&a.0.to_le_bytes());
        h.update(&b.0.to_le_bytes());
    }
    h.finalize().into()
}

/// Lowercase hex rendering of a digest.
#[must_use]
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
