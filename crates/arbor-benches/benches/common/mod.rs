// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
//! Deterministic skeleton generators shared by the benches.
use arbor_core::{Connector, ConnectorKind, RawNode, Skeleton};

/// SplitMix64; enough randomness for shapes, no dependency.
pub struct SplitMix(u64);

impl SplitMix {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}

/// Rows of a random tree: each node hangs off one of the 12 most recent nodes,
/// which yields many short branches, like a traced dendrite.
pub fn tree_rows(n: usize, first_id: i64, offset: [f64; 3], rng: &mut SplitMix) -> Vec<RawNode> {
    let mut positions: Vec<[f64; 3]> = Vec::with_capacity(n);
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        if i == 0 {
            positions.push(offset);
            rows.push(RawNode::new(first_id, None, offset).with_radius(1.0));
            continue;
        }
        let back = (rng.next_u64() % (i.min(12) as u64)) as usize + 1;
        let p = i - back;
        let base = positions[p];
        let pos = [
            base[0] + rng.signed_unit(),
            base[1] + rng.signed_unit(),
            base[2] + rng.signed_unit(),
        ];
        positions.push(pos);
        rows.push(RawNode::new(first_id + i as i64, Some(first_id + p as i64), pos).with_radius(0.5));
    }
    rows
}

/// A random tree of `n` nodes with a connector on every 16th node.
pub fn random_tree(n: usize, seed: u64) -> Skeleton {
    let mut rng = SplitMix::new(seed);
    let rows = tree_rows(n, 1, [0.0; 3], &mut rng);
    let connectors = (0..n as i64).step_by(16).map(|k| {
        let kind = if k % 32 == 0 {
            ConnectorKind::Presynapse
        } else {
            ConnectorKind::Postsynapse
        };
        Connector::new(k as u64, k + 1, kind)
    });
    Skeleton::builder(format!("tree-{seed}"))
        .nodes(rows)
        .connectors(connectors)
        .build()
        .expect("generated tree is valid")
}

/// `pieces` random fragments of `per_piece` nodes each, interleaved in space.
pub fn fragmented(pieces: usize, per_piece: usize, seed: u64) -> Skeleton {
    let mut rng = SplitMix::new(seed);
    let mut rows = Vec::with_capacity(pieces * per_piece);
    for k in 0..pieces {
        let offset = [k as f64 * 3.0, rng.signed_unit() * 10.0, 0.0];
        rows.extend(tree_rows(per_piece, (k * per_piece) as i64 + 1, offset, &mut rng));
    }
    Skeleton::from_rows(format!("fragments-{seed}"), rows).expect("generated fragments are valid")
}

/// An unbranched chain along +x.
pub fn chain(n: usize) -> Skeleton {
    let rows = (1..=n as i64).map(|id| RawNode::new(id, (id > 1).then_some(id - 1), [id as f64, 0.0, 0.0]));
    Skeleton::from_rows("chain", rows).expect("generated chain is valid")
}
