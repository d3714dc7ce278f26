// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synaptic flow centrality (Schneider-Mizell et al., 2016).
//!
//! For a node `v` let `distal` be the subtree rooted at `v` (including `v`)
//! and `proximal` the rest of `v`'s component. Counting presynapses (outputs)
//! and postsynapses (inputs) on each side:
//!
//! - centrifugal flow = proximal inputs × distal outputs
//! - centripetal flow = distal inputs × proximal outputs
//! - sum = both
//!
//! One children-before-parent pass accumulates subtree counts; a second pass
//! combines them with the component totals.
use crate::error::{SkeletonError, Unavailable};
use crate::ident::NodeId;
use crate::metrics::NodeMap;
use crate::record::ConnectorKind;
use crate::skeleton::Skeleton;

/// Which synaptic paths are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowMode {
    /// Paths from proximal inputs to distal outputs.
    Centrifugal,
    /// Paths from distal inputs to proximal outputs.
    Centripetal,
    /// Both directions.
    #[default]
    Sum,
}

struct Counts {
    /// Per dense index: presynapses, postsynapses in the subtree.
    distal_pre: Vec<u64>,
    distal_post: Vec<u64>,
}

/// Subtree synapse counts; `NoConnectors` when nothing is attached.
fn counts(skel: &Skeleton) -> Result<Counts, SkeletonError> {
    let topo = skel.topology();
    let n = topo.len();
    let mut distal_pre = vec![0u64; n];
    let mut distal_post = vec![0u64; n];
    let mut attached = 0usize;
    for c in skel.connectors() {
        let Some(i) = topo.index_of(c.node) else {
            continue;
        };
        attached += 1;
        match c.kind {
            ConnectorKind::Presynapse => distal_pre[i] += 1,
            ConnectorKind::Postsynapse => distal_post[i] += 1,
            ConnectorKind::Other(_) => {}
        }
    }
    if attached == 0 {
        return Err(Unavailable::NoConnectors.into());
    }
    for &i in topo.order().iter().rev() {
        if let Some(p) = topo.parent(i) {
            distal_pre[p] += distal_pre[i];
            distal_post[p] += distal_post[i];
        }
    }
    Ok(Counts {
        distal_pre,
        distal_post,
    })
}

fn flow_dense(skel: &Skeleton, mode: FlowMode) -> Result<Vec<u64>, SkeletonError> {
    let topo = skel.topology();
    let Counts {
        distal_pre,
        distal_post,
    } = counts(skel)?;
    let total_pre: Vec<u64> = topo.root_indices().iter().map(|&r| distal_pre[r]).collect();
    let total_post: Vec<u64> = topo.root_indices().iter().map(|&r| distal_post[r]).collect();
    Ok((0..topo.len())
        .map(|i| {
            let c = topo.component(i);
            let proximal_pre = total_pre[c] - distal_pre[i];
            let proximal_post = total_post[c] - distal_post[i];
            let centrifugal = proximal_post * distal_pre[i];
            let centripetal = distal_post[i] * proximal_pre;
            match mode {
                FlowMode::Centrifugal => centrifugal,
                FlowMode::Centripetal => centripetal,
                FlowMode::Sum => centrifugal + centripetal,
            }
        })
        .collect())
}

/// Flow centrality of every node.
///
/// Connectors of only one kind yield all zeros; a skeleton without any
/// attached connector is reported as unavailable rather than zero.
///
/// # Errors
/// [`Unavailable::NoConnectors`] when no connector references an existing node.
pub fn flow_centrality(skel: &Skeleton, mode: FlowMode) -> Result<NodeMap<u64>, SkeletonError> {
    let topo = skel.topology();
    let flow = flow_dense(skel, mode)?;
    Ok(flow.into_iter().enumerate().map(|(i, f)| (topo.id(i), f)).collect())
}

/// Node with the highest flow; ties go to the lowest node id.
///
/// # Errors
/// [`Unavailable::NoConnectors`] when no connector references an existing node.
pub fn max_flow_node(skel: &Skeleton, mode: FlowMode) -> Result<NodeId, SkeletonError> {
    let topo = skel.topology();
    let flow = flow_dense(skel, mode)?;
    let mut best: Option<usize> = None;
    for (i, f) in flow.iter().enumerate() {
        match best {
            Some(b) if *f <= flow[b] => {}
            _ => best = Some(i),
        }
    }
    best.map(|i| topo.id(i))
        .ok_or_else(|| Unavailable::NoConnectors.into())
}

fn entropy(pre: u64, post: u64) -> f64 {
    let n = (pre + post) as f64;
    if n == 0.0 {
        return 0.0;
    }
    [pre, post]
        .iter()
        .filter(|&&k| k > 0)
        .map(|&k| {
            let p = k as f64 / n;
            -p * p.ln()
        })
        .sum()
}

/// Segregation index of the split at `split` (0: mixed, 1: fully segregated).
///
/// The skeleton is split into the subtree at `split` (inclusive) and
/// everything else. With `S` the size-weighted mean of the two
/// compartments' input/output entropies and `S_norm` the entropy of the
/// whole, the index is `1 - S / S_norm`, or 0 when `S_norm` is 0.
///
/// # Errors
/// `NotFound` for an unknown `split`; [`Unavailable::NoConnectors`] when no
/// connector is attached.
pub fn segregation_index(skel: &Skeleton, split: NodeId) -> Result<f64, SkeletonError> {
    let topo = skel.topology();
    let at = topo.require(split)?;
    let counts = counts(skel)?;
    let total_pre: u64 = topo.root_indices().iter().map(|&r| counts.distal_pre[r]).sum();
    let total_post: u64 = topo.root_indices().iter().map(|&r| counts.distal_post[r]).sum();
    let total = (total_pre + total_post) as f64;
    let s_norm = entropy(total_pre, total_post);
    if total == 0.0 || s_norm == 0.0 {
        return Ok(0.0);
    }
    let (dpre, dpost) = (counts.distal_pre[at], counts.distal_post[at]);
    let (ppre, ppost) = (total_pre - dpre, total_post - dpost);
    let s = ((dpre + dpost) as f64 * entropy(dpre, dpost)
        + (ppre + ppost) as f64 * entropy(ppre, ppost))
        / total;
    Ok(1.0 - s / s_norm)
}
