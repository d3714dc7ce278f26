// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types.
use core::fmt;

/// Canonical 256-bit digest used for skeleton fingerprints.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a node within one skeleton.
///
/// Ids come from the data source (SWC row ids, CATMAID treenode ids, ...) and
/// are only unique within their skeleton. They carry no ordering meaning
/// beyond providing the canonical iteration order (ascending id).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub i64);

impl NodeId {
    /// Returns the raw integer id.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a connector (synapse-like annotation).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectorId(pub u64);

impl From<u64> for ConnectorId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display adapter rendering a list of node ids as `[1, 2, 3]`.
pub(crate) struct IdList<'a>(pub &'a [NodeId]);

impl fmt::Display for IdList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_formats_like_a_slice() {
        let ids = [NodeId(3), NodeId(-1), NodeId(12)];
        assert_eq!(IdList(&ids).to_string(), "[3, -1, 12]");
        assert_eq!(IdList(&[]).to_string(), "[]");
    }
}
