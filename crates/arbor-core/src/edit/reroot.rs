// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::borrow::Cow;

use tracing::debug;

use super::{apply, EditMode};
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::skeleton::Skeleton;

impl Skeleton {
    /// Makes `new_root` the root of its tree.
    ///
    /// Only the chain from `new_root` up to the old root is flipped; every
    /// other subtree keeps its orientation, and other trees of the forest are
    /// untouched. Rerooting at a current root is a no-op.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `new_root` is absent.
    pub fn reroot(&mut self, new_root: NodeId, mode: EditMode) -> Result<Cow<'_, Self>, SkeletonError> {
        self.topology().require(new_root)?;
        apply(self, mode, |s| s.reroot_now(new_root))
    }

    /// Reroots at the lowest soma node.
    ///
    /// # Errors
    /// [`SkeletonError::InvalidOperation`] when no soma is set.
    pub fn reroot_to_soma(&mut self, mode: EditMode) -> Result<Cow<'_, Self>, SkeletonError> {
        let Some(&soma) = self.soma().first() else {
            return Err(SkeletonError::invalid(
                "reroot",
                format!("skeleton `{}` has no soma", self.name()),
            ));
        };
        self.reroot(soma, mode)
    }

    pub(crate) fn reroot_now(&mut self, new_root: NodeId) -> Result<(), SkeletonError> {
        let topo = self.topology();
        let start = topo.require(new_root)?;
        let chain = topo.path_to_root(start);
        if chain.len() == 1 {
            return Ok(());
        }
        let chain: Vec<NodeId> = chain.into_iter().map(|i| topo.id(i)).collect();
        let mut nodes = self.table().clone().into_map();
        if let Some(r) = nodes.get_mut(&chain[0]) {
            r.parent = None;
        }
        for pair in chain.windows(2) {
            if let Some(r) = nodes.get_mut(&pair[1]) {
                r.parent = Some(pair[0]);
            }
        }
        debug!(
            skeleton = %self.name(),
            new_root = %new_root,
            flipped = chain.len() - 1,
            "rerooted"
        );
        self.replace_nodes(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawNode;

    fn tree() -> Skeleton {
        //  1 - 2 - 3
        //       \
        //        4 - 5
        let rows = [
            RawNode::new(1, None, [0.0; 3]),
            RawNode::new(2, Some(1), [1.0, 0.0, 0.0]),
            RawNode::new(3, Some(2), [2.0, 0.0, 0.0]),
            RawNode::new(4, Some(2), [1.0, 1.0, 0.0]),
            RawNode::new(5, Some(4), [1.0, 2.0, 0.0]),
        ];
        Skeleton::from_rows("t", rows).unwrap_or_else(|_| unreachable!("valid"))
    }

    fn parent(s: &Skeleton, id: i64) -> Option<i64> {
        s.node(NodeId(id)).ok().and_then(|r| r.parent).map(NodeId::value)
    }

    #[test]
    fn flips_only_the_ancestor_chain() {
        let mut s = tree();
        let edges = s.edge_digest();
        assert!(matches!(
            s.reroot(NodeId(5), EditMode::InPlace),
            Ok(Cow::Borrowed(_))
        ));
        assert_eq!(s.roots(), vec![NodeId(5)]);
        assert_eq!(parent(&s, 4), Some(5));
        assert_eq!(parent(&s, 2), Some(4));
        assert_eq!(parent(&s, 1), Some(2));
        assert_eq!(parent(&s, 3), Some(2));
        assert_eq!(s.edge_digest(), edges);
    }

    #[test]
    fn copy_mode_leaves_receiver_alone() {
        let mut s = tree();
        let before = s.table_digest();
        let copy = s.reroot(NodeId(3), EditMode::Copy).map(Cow::into_owned);
        assert!(copy.is_ok_and(|c| c.roots() == vec![NodeId(3)]));
        assert_eq!(s.table_digest(), before);
    }

    #[test]
    fn unknown_node_and_missing_soma_fail() {
        let mut s = tree();
        assert_eq!(
            s.reroot(NodeId(77), EditMode::InPlace).err(),
            Some(SkeletonError::node_not_found(NodeId(77)))
        );
        assert!(matches!(
            s.reroot_to_soma(EditMode::Copy),
            Err(SkeletonError::InvalidOperation { op: "reroot", .. })
        ));
    }

    #[test]
    fn reroot_at_root_is_a_noop() {
        let mut s = tree();
        let before = s.table_digest();
        assert!(s.reroot(NodeId(1), EditMode::InPlace).is_ok());
        assert_eq!(s.table_digest(), before);
    }
}
