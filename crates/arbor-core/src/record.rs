// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node and connector records.
use arbor_geom::Vec3;

use crate::ident::{ConnectorId, NodeId};

/// Optional categorical tag carried by a node.
///
/// Labels come from the data source and are informational; the engine derives
/// structural roles from the topology (see [`crate::NodeKind`]) and never
/// trusts a label for correctness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeLabel {
    /// Root node.
    Root,
    /// Interior node with one child.
    Slab,
    /// Node with two or more children.
    Branch,
    /// Terminal node.
    End,
    /// Soma (cell body) node.
    Soma,
    /// Source-specific tag (e.g. SWC structure identifiers beyond the standard set).
    Custom(u16),
}

impl NodeLabel {
    /// Stable byte encoding used by the canonical digest.
    pub(crate) fn tag(self) -> [u8; 3] {
        match self {
            Self::Root => [1, 0, 0],
            Self::Slab => [2, 0, 0],
            Self::Branch => [3, 0, 0],
            Self::End => [4, 0, 0],
            Self::Soma => [5, 0, 0],
            Self::Custom(v) => {
                let [lo, hi] = v.to_le_bytes();
                [6, lo, hi]
            }
        }
    }
}

/// A stored node: everything except its id, which is the table key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    /// Parent node, `None` for roots.
    pub parent: Option<NodeId>,
    /// Position in the skeleton's coordinate units.
    pub position: Vec3,
    /// Radius (`>= 0`), `None` when unknown.
    pub radius: Option<f64>,
    /// Optional categorical tag.
    pub label: Option<NodeLabel>,
}

/// One row of the raw ingestion table produced by parsers and remote clients.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawNode {
    /// Node id, unique within the skeleton.
    pub id: NodeId,
    /// Parent id, `None` for roots.
    pub parent: Option<NodeId>,
    /// Position.
    pub position: Vec3,
    /// Radius, `None` when unknown.
    pub radius: Option<f64>,
    /// Optional label.
    pub label: Option<NodeLabel>,
}

impl RawNode {
    /// Creates a row without radius or label.
    #[must_use]
    pub fn new(id: i64, parent: Option<i64>, position: [f64; 3]) -> Self {
        Self {
            id: NodeId(id),
            parent: parent.map(NodeId),
            position: Vec3::from(position),
            radius: None,
            label: None,
        }
    }

    /// Creates a row from SWC-style columns.
    ///
    /// Negative `parent` values are the "no parent" sentinel; negative `radius`
    /// values mean "unknown".
    #[must_use]
    pub fn from_row(id: i64, parent: i64, x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            id: NodeId(id),
            parent: (parent >= 0).then_some(NodeId(parent)),
            position: Vec3::new(x, y, z),
            radius: (radius >= 0.0).then_some(radius),
            label: None,
        }
    }

    /// Sets the radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: NodeLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub(crate) fn into_parts(self) -> (NodeId, NodeRecord) {
        (
            self.id,
            NodeRecord {
                parent: self.parent,
                position: self.position,
                radius: self.radius,
                label: self.label,
            },
        )
    }
}

/// Direction of a connector relative to the owning neuron.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectorKind {
    /// Output synapse (the neuron is presynaptic).
    Presynapse,
    /// Input synapse (the neuron is postsynaptic).
    Postsynapse,
    /// Any other annotation (gap junction, abutting, source-specific codes).
    Other(u8),
}

/// A point annotation attached to a node by id.
///
/// The node reference is a lookup, not ownership: removing the node drops the
/// connector, and a connector whose node is missing is reported as orphaned.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connector {
    /// Connector id, unique within the skeleton.
    pub id: ConnectorId,
    /// Associated node.
    pub node: NodeId,
    /// Connector direction.
    pub kind: ConnectorKind,
    /// Location of the annotation itself, when it differs from the node.
    pub position: Option<Vec3>,
}

impl Connector {
    /// Creates a connector without its own position.
    #[must_use]
    pub fn new(id: u64, node: i64, kind: ConnectorKind) -> Self {
        Self {
            id: ConnectorId(id),
            node: NodeId(node),
            kind,
            position: None,
        }
    }
}
