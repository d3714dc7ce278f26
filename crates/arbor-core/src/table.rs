// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical node table.
use std::collections::BTreeMap;

use arbor_geom::Vec3;
use rustc_hash::FxHashMap;

use crate::error::{IntegrityError, SkeletonError};
use crate::ident::NodeId;
use crate::record::{NodeLabel, NodeRecord, RawNode};

/// Validated node collection keyed by node id.
///
/// Records are stored densely in ascending node id order, independent of
/// the order rows arrived in, so position `i` here is dense index `i` of
/// [`crate::Topology`]. Lookup by id is a single hash probe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTable {
    ids: Vec<NodeId>,
    records: Vec<NodeRecord>,
    index: FxHashMap<NodeId, usize>,
}

/// Column-oriented copy of a table, in ascending id order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columns {
    /// Node ids.
    pub ids: Vec<NodeId>,
    /// Parent ids.
    pub parents: Vec<Option<NodeId>>,
    /// Positions.
    pub positions: Vec<Vec3>,
    /// Radii.
    pub radii: Vec<Option<f64>>,
    /// Labels.
    pub labels: Vec<Option<NodeLabel>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    Visiting,
    Done,
}

impl NodeTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and validates a table from raw rows.
    ///
    /// Checks, in order: duplicate ids (the smallest duplicated id is
    /// reported), finite positions, radii, dangling parent references, and
    /// finally cycle-freedom. The first violation is returned.
    ///
    /// # Errors
    /// Returns the [`IntegrityError`] describing the first violation.
    pub fn from_rows<I>(rows: I) -> Result<Self, IntegrityError>
    where
        I: IntoIterator<Item = RawNode>,
    {
        let mut entries: Vec<(NodeId, NodeRecord)> =
            rows.into_iter().map(RawNode::into_parts).collect();
        entries.sort_by_key(|(id, _)| *id);
        if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(IntegrityError::DuplicateNodeId(pair[0].0));
        }
        let table = Self::from_sorted(entries);
        table.validate()?;
        Ok(table)
    }

    /// Wraps an already-keyed map; callers must run [`Self::validate`].
    pub(crate) fn from_map(nodes: BTreeMap<NodeId, NodeRecord>) -> Self {
        Self::from_sorted(nodes)
    }

    /// Entries must be strictly ascending by id.
    fn from_sorted<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeRecord)>,
    {
        let (ids, records): (Vec<NodeId>, Vec<NodeRecord>) = entries.into_iter().unzip();
        let mut index = FxHashMap::default();
        index.reserve(ids.len());
        for (i, id) in ids.iter().enumerate() {
            index.insert(*id, i);
        }
        Self { ids, records, index }
    }

    /// Re-checks every table invariant except id uniqueness, which the
    /// constructors guarantee.
    ///
    /// # Errors
    /// Returns the first [`IntegrityError`] found.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        for (id, record) in self.iter() {
            if !record.position.is_finite() {
                return Err(IntegrityError::NonFinitePosition(id));
            }
            if let Some(radius) = record.radius {
                if !(radius.is_finite() && radius >= 0.0) {
                    return Err(IntegrityError::InvalidRadius { node: id, radius });
                }
            }
        }
        for (id, record) in self.iter() {
            if let Some(parent) = record.parent {
                if !self.contains(parent) {
                    return Err(IntegrityError::DanglingParent { node: id, parent });
                }
            }
        }
        self.check_acyclic()
    }

    /// Iterative parent walk with visiting/done marks over dense positions.
    ///
    /// Each node is visited at most twice, so malformed input costs `O(n)`
    /// and never loops. Parents must already resolve.
    fn check_acyclic(&self) -> Result<(), IntegrityError> {
        let mut marks = vec![Mark::Unseen; self.len()];
        let mut path: Vec<usize> = Vec::new();
        for start in 0..self.len() {
            if marks[start] != Mark::Unseen {
                continue;
            }
            path.clear();
            let mut cursor = Some(start);
            while let Some(i) = cursor {
                match marks[i] {
                    Mark::Done => break,
                    Mark::Visiting => {
                        let from = path.iter().position(|p| *p == i).unwrap_or(0);
                        let mut members: Vec<NodeId> =
                            path[from..].iter().map(|&p| self.ids[p]).collect();
                        members.sort_unstable();
                        return Err(IntegrityError::Cycle(members));
                    }
                    Mark::Unseen => {
                        marks[i] = Mark::Visiting;
                        path.push(i);
                        cursor = self.records[i].parent.and_then(|p| self.index_of(p));
                    }
                }
            }
            for &i in &path {
                marks[i] = Mark::Done;
            }
        }
        Ok(())
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when the table holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` when `id` exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Dense position of `id`; matches the topology's index.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Record for `id`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeRecord> {
        self.index_of(id).map(|i| &self.records[i])
    }

    /// Record at dense position `i`.
    pub(crate) fn record_at(&self, i: usize) -> &NodeRecord {
        &self.records[i]
    }

    pub(crate) fn index_map(&self) -> &FxHashMap<NodeId, usize> {
        &self.index
    }

    /// Nodes in ascending id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (NodeId, &NodeRecord)> + '_ {
        self.ids.iter().copied().zip(self.records.iter())
    }

    /// Node ids in ascending order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }

    /// Largest node id, if any.
    #[must_use]
    pub fn max_id(&self) -> Option<NodeId> {
        self.ids.last().copied()
    }

    /// Column-oriented copy of the table.
    #[must_use]
    pub fn columns(&self) -> Columns {
        let mut cols = Columns {
            ids: Vec::with_capacity(self.len()),
            parents: Vec::with_capacity(self.len()),
            positions: Vec::with_capacity(self.len()),
            radii: Vec::with_capacity(self.len()),
            labels: Vec::with_capacity(self.len()),
        };
        for (id, r) in self.iter() {
            cols.ids.push(id);
            cols.parents.push(r.parent);
            cols.positions.push(r.position);
            cols.radii.push(r.radius);
            cols.labels.push(r.label);
        }
        cols
    }

    /// Rows in ascending id order, suitable for export.
    #[must_use]
    pub fn to_rows(&self) -> Vec<RawNode> {
        self.iter()
            .map(|(id, r)| RawNode {
                id,
                parent: r.parent,
                position: r.position,
                radius: r.radius,
                label: r.label,
            })
            .collect()
    }

    /// Moves a node. Structure is unaffected.
    ///
    /// # Errors
    /// `NotFound` for unknown ids, `DataIntegrity` for non-finite positions.
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SkeletonError> {
        if !position.is_finite() {
            return Err(IntegrityError::NonFinitePosition(id).into());
        }
        self.record_mut(id)?.position = position;
        Ok(())
    }

    /// Sets or clears a radius. Structure is unaffected.
    ///
    /// # Errors
    /// `NotFound` for unknown ids, `DataIntegrity` for negative or non-finite radii.
    pub fn set_radius(&mut self, id: NodeId, radius: Option<f64>) -> Result<(), SkeletonError> {
        if let Some(r) = radius {
            if !(r.is_finite() && r >= 0.0) {
                return Err(IntegrityError::InvalidRadius { node: id, radius: r }.into());
            }
        }
        self.record_mut(id)?.radius = radius;
        Ok(())
    }

    /// Sets or clears a label.
    ///
    /// # Errors
    /// `NotFound` for unknown ids.
    pub fn set_label(&mut self, id: NodeId, label: Option<NodeLabel>) -> Result<(), SkeletonError> {
        self.record_mut(id)?.label = label;
        Ok(())
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, SkeletonError> {
        let i = self
            .index_of(id)
            .ok_or_else(|| SkeletonError::node_not_found(id))?;
        Ok(&mut self.records[i])
    }

    pub(crate) fn into_map(self) -> BTreeMap<NodeId, NodeRecord> {
        self.ids.into_iter().zip(self.records).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, parent: Option<i64>) -> RawNode {
        RawNode::new(id, parent, [id as f64, 0.0, 0.0])
    }

    #[test]
    fn iteration_is_ascending_regardless_of_input_order() {
        let table = NodeTable::from_rows([row(5, Some(2)), row(2, None), row(9, Some(5))])
            .map_err(|e| e.to_string());
        let Ok(table) = table else {
            unreachable!("valid table");
        };
        let ids: Vec<i64> = table.ids().map(NodeId::value).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(table.max_id(), Some(NodeId(9)));
    }

    #[test]
    fn lookups_resolve_through_the_dense_index() {
        let Ok(table) = NodeTable::from_rows([row(40, Some(7)), row(7, None), row(12, Some(40))])
        else {
            unreachable!("valid table");
        };
        assert_eq!(table.index_map().len(), 3);
        for (i, id) in table.ids().enumerate() {
            assert_eq!(table.index_of(id), Some(i));
            assert_eq!(table.index_map().get(&id), Some(&i));
            assert_eq!(table.get(id), Some(table.record_at(i)));
        }
        assert_eq!(table.index_of(NodeId(12)), Some(1));
        assert_eq!(table.get(NodeId(12)).and_then(|r| r.parent), Some(NodeId(40)));
        assert_eq!(table.index_of(NodeId(8)), None);
        assert!(table.get(NodeId(8)).is_none());

        let rebuilt = NodeTable::from_map(table.clone().into_map());
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn detects_duplicates_and_dangling_parents() {
        let dup = NodeTable::from_rows([row(1, None), row(1, None)]);
        assert_eq!(dup, Err(IntegrityError::DuplicateNodeId(NodeId(1))));
        let two = NodeTable::from_rows([row(9, None), row(3, None), row(9, None), row(3, None)]);
        assert_eq!(two, Err(IntegrityError::DuplicateNodeId(NodeId(3))));
        let dangling = NodeTable::from_rows([row(1, None), row(2, Some(7))]);
        assert_eq!(
            dangling,
            Err(IntegrityError::DanglingParent {
                node: NodeId(2),
                parent: NodeId(7)
            })
        );
    }

    #[test]
    fn detects_cycles_including_self_loops() {
        let two = NodeTable::from_rows([row(1, Some(2)), row(2, Some(1)), row(3, None)]);
        assert_eq!(two, Err(IntegrityError::Cycle(vec![NodeId(1), NodeId(2)])));
        let own = NodeTable::from_rows([row(4, Some(4))]);
        assert_eq!(own, Err(IntegrityError::Cycle(vec![NodeId(4)])));
        // A tail leading into a cycle reports only the cycle members.
        let tail = NodeTable::from_rows([row(1, Some(2)), row(2, Some(3)), row(3, Some(2))]);
        assert_eq!(tail, Err(IntegrityError::Cycle(vec![NodeId(2), NodeId(3)])));
    }

    #[test]
    fn rejects_bad_geometry() {
        let nan = NodeTable::from_rows([RawNode::new(1, None, [f64::NAN, 0.0, 0.0])]);
        assert_eq!(nan, Err(IntegrityError::NonFinitePosition(NodeId(1))));
        let neg = NodeTable::from_rows([row(1, None).with_radius(-2.0)]);
        assert!(matches!(neg, Err(IntegrityError::InvalidRadius { .. })));
    }

    #[test]
    fn field_setters_validate() {
        let Ok(mut table) = NodeTable::from_rows([row(1, None)]) else {
            unreachable!("valid table");
        };
        assert!(table.set_radius(NodeId(1), Some(0.5)).is_ok());
        assert!(table.set_radius(NodeId(1), Some(f64::INFINITY)).is_err());
        assert!(table.set_position(NodeId(2), Vec3::ZERO).is_err());
        assert_eq!(table.get(NodeId(1)).and_then(|r| r.radius), Some(0.5));
        let cols = table.columns();
        assert_eq!(cols.ids, vec![NodeId(1)]);
        assert_eq!(cols.radii, vec![Some(0.5)]);
    }
}
