// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::borrow::Cow;

use tracing::debug;

use super::{apply, EditMode, OrphanPolicy};
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::skeleton::Skeleton;

/// The two pieces produced by [`Skeleton::cut`].
#[derive(Debug)]
pub struct CutPieces<'a> {
    /// Subtree rooted at the cut node.
    pub distal: Skeleton,
    /// Everything else: the receiver after an in-place cut, a copy otherwise.
    pub proximal: Cow<'a, Skeleton>,
}

impl Skeleton {
    /// Splits the tree at the edge between `node` and its parent.
    ///
    /// The distal piece is the subtree rooted at `node`; the proximal piece
    /// is the rest of the skeleton, including any other trees of the forest.
    /// Connectors and soma entries follow their nodes. No node is lost.
    ///
    /// # Errors
    /// `NotFound` when `node` is absent; `InvalidOperation` when `node` is a
    /// root (it has no parent edge to cut).
    pub fn cut(&mut self, node: NodeId, mode: EditMode) -> Result<CutPieces<'_>, SkeletonError> {
        let topo = self.topology();
        let at = topo.require(node)?;
        if topo.parent(at).is_none() {
            return Err(SkeletonError::invalid(
                "cut",
                format!("node {node} is a root and has no parent edge"),
            ));
        }
        let distal_mask = topo.subtree_mask(at);
        let distal = self.extract(&distal_mask);
        debug!(
            skeleton = %self.name(),
            node = %node,
            distal = distal.node_count(),
            "cut"
        );
        let proximal = apply(self, mode, |s| s.remove_dense(&distal_mask, None, OrphanPolicy::KeepAsRoots))?;
        Ok(CutPieces { distal, proximal })
    }

    /// One skeleton per connected component, ordered by root id.
    ///
    /// Every piece keeps the name, units and strategy of the receiver and
    /// carries the connectors and soma entries of its nodes.
    #[must_use]
    pub fn split_fragments(&self) -> Vec<Self> {
        let topo = self.topology();
        (0..topo.component_count())
            .map(|c| {
                let keep: Vec<bool> = (0..topo.len()).map(|i| topo.component(i) == c).collect();
                self.extract(&keep)
            })
            .collect()
    }
}
