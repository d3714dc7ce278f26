// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node-subset selectors used to scope metrics and edits.
use core::fmt;
use std::collections::BTreeSet;
use std::sync::Arc;

use arbor_geom::Aabb;

use crate::ident::NodeId;
use crate::record::NodeRecord;
use crate::table::NodeTable;

/// Predicate signature for [`NodeMask::Predicate`].
pub type NodePredicate = dyn Fn(NodeId, &NodeRecord) -> bool + Send + Sync;

/// Selects a subset of a skeleton's nodes.
///
/// Masks are passed per call; they are never stored on a skeleton or in
/// configuration. Ids in [`NodeMask::Nodes`] that do not exist are ignored.
#[derive(Clone, Default)]
pub enum NodeMask {
    /// Every node.
    #[default]
    All,
    /// An explicit id set.
    Nodes(BTreeSet<NodeId>),
    /// Nodes inside (or outside) an axis-aligned box, bounds inclusive.
    Region {
        /// Box in coordinate units.
        bounds: Aabb,
        /// `true` selects nodes inside the box, `false` those outside.
        inside: bool,
    },
    /// Arbitrary predicate over id and record.
    Predicate(Arc<NodePredicate>),
}

impl NodeMask {
    /// Mask over an explicit id list.
    pub fn nodes<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        Self::Nodes(ids.into_iter().map(Into::into).collect())
    }

    /// Nodes inside `bounds`.
    #[must_use]
    pub fn inside(bounds: Aabb) -> Self {
        Self::Region {
            bounds,
            inside: true,
        }
    }

    /// Nodes outside `bounds`.
    #[must_use]
    pub fn outside(bounds: Aabb) -> Self {
        Self::Region {
            bounds,
            inside: false,
        }
    }

    /// Mask from a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(NodeId, &NodeRecord) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Returns `true` when the mask selects every node unconditionally.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Tests a single node.
    #[must_use]
    pub fn contains(&self, id: NodeId, record: &NodeRecord) -> bool {
        match self {
            Self::All => true,
            Self::Nodes(set) => set.contains(&id),
            Self::Region { bounds, inside } => bounds.contains(&record.position) == *inside,
            Self::Predicate(f) => f(id, record),
        }
    }

    /// Dense selection over a table, indexed like [`crate::Topology`].
    #[must_use]
    pub fn select(&self, table: &NodeTable) -> Vec<bool> {
        table.iter().map(|(id, r)| self.contains(id, r)).collect()
    }
}

impl fmt::Debug for NodeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Nodes(set) => f.debug_tuple("Nodes").field(set).finish(),
            Self::Region { bounds, inside } => f
                .debug_struct("Region")
                .field("bounds", bounds)
                .field("inside", inside)
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
