// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for skeleton construction, queries and edits.
use thiserror::Error;

use crate::ident::{ConnectorId, IdList, NodeId};

/// Malformed skeleton data.
///
/// Raised at construction and re-checked after every structural edit. Each
/// variant names the offending ids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityError {
    /// Two rows share a node id.
    #[error("duplicate node id {0}")]
    DuplicateNodeId(NodeId),
    /// A parent id does not exist in the table.
    #[error("node {node} references missing parent {parent}")]
    DanglingParent {
        /// Child whose parent is missing.
        node: NodeId,
        /// Missing parent id.
        parent: NodeId,
    },
    /// Parent links form a cycle; members are listed in ascending order.
    #[error("parent links form a cycle through nodes {}", IdList(.0))]
    Cycle(Vec<NodeId>),
    /// A coordinate is NaN or infinite.
    #[error("node {0} has a non-finite position")]
    NonFinitePosition(NodeId),
    /// A radius is negative or non-finite.
    #[error("node {node} has invalid radius {radius}")]
    InvalidRadius {
        /// Offending node.
        node: NodeId,
        /// Rejected radius.
        radius: f64,
    },
    /// A connector references a node that does not exist.
    #[error("connector {connector} references missing node {node}")]
    DanglingConnector {
        /// Orphaned connector.
        connector: ConnectorId,
        /// Missing node id.
        node: NodeId,
    },
    /// Two connectors share an id.
    #[error("duplicate connector id {0}")]
    DuplicateConnectorId(ConnectorId),
    /// A soma reference names a node that does not exist.
    #[error("soma references missing node {0}")]
    DanglingSoma(NodeId),
}

/// What an operation failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Missing {
    /// A node id.
    #[error("node {0}")]
    Node(NodeId),
    /// A connector id.
    #[error("connector {0}")]
    Connector(ConnectorId),
}

/// A metric's optional input data is absent.
///
/// Distinct from hard errors: callers typically skip the metric and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
    /// The skeleton carries no (non-orphaned) connectors.
    #[error("skeleton has no connectors")]
    NoConnectors,
    /// Radii are unknown for the listed nodes.
    #[error("radius unknown for nodes {}", IdList(.0))]
    MissingRadius(Vec<NodeId>),
}

/// Errors emitted by skeleton construction, queries and structural edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeletonError {
    /// Malformed input or an edit that would produce malformed data.
    #[error("data integrity violation: {0}")]
    DataIntegrity(#[from] IntegrityError),
    /// A referenced node or connector does not exist.
    #[error("not found: {0}")]
    NotFound(Missing),
    /// The operation's structural precondition does not hold.
    #[error("invalid operation `{op}`: {reason}")]
    InvalidOperation {
        /// Operation name.
        op: &'static str,
        /// Human-readable precondition failure, naming the ids involved.
        reason: String,
    },
    /// Optional data required by a metric is absent.
    #[error("unavailable: {0}")]
    Unavailable(#[from] Unavailable),
}

impl SkeletonError {
    /// Shorthand for a missing node.
    #[must_use]
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NotFound(Missing::Node(id))
    }

    pub(crate) fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            op,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_offending_ids() {
        let err = SkeletonError::from(IntegrityError::Cycle(vec![NodeId(4), NodeId(9)]));
        assert_eq!(
            err.to_string(),
            "data integrity violation: parent links form a cycle through nodes [4, 9]"
        );
        let err = SkeletonError::node_not_found(NodeId(17));
        assert_eq!(err.to_string(), "not found: node 17");
        let err = SkeletonError::NotFound(Missing::Connector(ConnectorId(3)));
        assert_eq!(err.to_string(), "not found: connector 3");
        let err = SkeletonError::invalid("cut", "node 1 is a root");
        assert_eq!(err.to_string(), "invalid operation `cut`: node 1 is a root");
    }
}
