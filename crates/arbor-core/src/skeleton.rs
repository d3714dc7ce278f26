// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The skeleton aggregate: node table, connectors, metadata and cached views.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use arbor_geom::{Aabb, Vec3};
use tracing::debug;

use crate::digest;
use crate::error::{IntegrityError, Missing, SkeletonError};
use crate::ident::{ConnectorId, Hash, NodeId};
use crate::record::{Connector, NodeLabel, NodeRecord, RawNode};
use crate::segments::{Segment, SegmentIndex};
use crate::table::NodeTable;
use crate::topology::{GraphBackend, NodeKind, Topology};
use crate::units::Units;

/// A neuron skeleton: a validated rooted forest plus annotations.
///
/// The graph view ([`Topology`]) and the segment decomposition
/// ([`SegmentIndex`]) are built lazily on first access and reused until a
/// structural edit replaces the node table. Cache reset is internal to the
/// editing operations; there is no public way to mark a skeleton stale.
///
/// Caches are write-once cells, so a `&Skeleton` can be shared across
/// threads for read-only analysis.
#[derive(Clone, Debug)]
pub struct Skeleton {
    name: String,
    units: Units,
    soma: Vec<NodeId>,
    table: NodeTable,
    connectors: BTreeMap<ConnectorId, Connector>,
    backend: GraphBackend,
    topology: OnceLock<Topology>,
    segments: OnceLock<SegmentIndex>,
}

impl Skeleton {
    /// Starts a builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SkeletonBuilder {
        SkeletonBuilder::new(name)
    }

    /// Builds a skeleton from raw rows without connectors or soma.
    ///
    /// # Errors
    /// [`SkeletonError::DataIntegrity`] for malformed rows.
    pub fn from_rows<I>(name: impl Into<String>, rows: I) -> Result<Self, SkeletonError>
    where
        I: IntoIterator<Item = RawNode>,
    {
        Self::builder(name).nodes(rows).build()
    }

    fn assemble(
        name: String,
        units: Units,
        soma: Vec<NodeId>,
        table: NodeTable,
        connectors: BTreeMap<ConnectorId, Connector>,
        backend: GraphBackend,
    ) -> Self {
        Self {
            name,
            units,
            soma,
            table,
            connectors,
            backend,
            topology: OnceLock::new(),
            segments: OnceLock::new(),
        }
    }

    /// Skeleton name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the skeleton.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Physical units of the coordinates.
    #[must_use]
    pub fn units(&self) -> Units {
        self.units
    }

    /// Replaces the unit metadata. Coordinates are not rescaled.
    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    /// Topology strategy used when the graph view is (re)built.
    #[must_use]
    pub fn backend(&self) -> GraphBackend {
        self.backend
    }

    /// Switches the topology strategy. The graph view is rebuilt lazily.
    pub fn set_backend(&mut self, backend: GraphBackend) {
        if backend != self.backend {
            self.backend = backend;
            self.invalidate();
        }
    }

    /// Soma node ids, ascending.
    #[must_use]
    pub fn soma(&self) -> &[NodeId] {
        &self.soma
    }

    /// Replaces the soma set.
    ///
    /// # Errors
    /// [`IntegrityError::DanglingSoma`] when an id is absent.
    pub fn set_soma<I>(&mut self, ids: I) -> Result<(), SkeletonError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let soma: BTreeSet<NodeId> = ids.into_iter().collect();
        if let Some(&missing) = soma.iter().find(|id| !self.table.contains(**id)) {
            return Err(IntegrityError::DanglingSoma(missing).into());
        }
        self.soma = soma.into_iter().collect();
        Ok(())
    }

    /// Canonical node table.
    #[must_use]
    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` when the skeleton has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` when `id` exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.table.contains(id)
    }

    /// Record for `id`.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn node(&self, id: NodeId) -> Result<&NodeRecord, SkeletonError> {
        self.table
            .get(id)
            .ok_or_else(|| SkeletonError::node_not_found(id))
    }

    /// Moves a node. Cached views stay valid; lengths are computed on demand.
    ///
    /// # Errors
    /// See [`NodeTable::set_position`].
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SkeletonError> {
        self.table.set_position(id, position)
    }

    /// Sets or clears a radius.
    ///
    /// # Errors
    /// See [`NodeTable::set_radius`].
    pub fn set_radius(&mut self, id: NodeId, radius: Option<f64>) -> Result<(), SkeletonError> {
        self.table.set_radius(id, radius)
    }

    /// Sets or clears a label.
    ///
    /// # Errors
    /// See [`NodeTable::set_label`].
    pub fn set_label(&mut self, id: NodeId, label: Option<NodeLabel>) -> Result<(), SkeletonError> {
        self.table.set_label(id, label)
    }

    // ---- connectors ---------------------------------------------------------

    /// Connectors in ascending id order.
    pub fn connectors(&self) -> impl ExactSizeIterator<Item = &Connector> + '_ {
        self.connectors.values()
    }

    /// Connector by id.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn connector(&self, id: ConnectorId) -> Result<&Connector, SkeletonError> {
        self.connectors
            .get(&id)
            .ok_or(SkeletonError::NotFound(Missing::Connector(id)))
    }

    /// Connectors attached to `node`.
    pub fn connectors_of(&self, node: NodeId) -> impl Iterator<Item = &Connector> + '_ {
        self.connectors.values().filter(move |c| c.node == node)
    }

    /// Connectors whose node does not exist, ascending.
    #[must_use]
    pub fn orphaned_connectors(&self) -> Vec<ConnectorId> {
        self.connectors
            .values()
            .filter(|c| !self.table.contains(c.node))
            .map(|c| c.id)
            .collect()
    }

    /// Adds or replaces a connector.
    ///
    /// # Errors
    /// [`IntegrityError::DanglingConnector`] when its node is absent.
    pub fn insert_connector(&mut self, connector: Connector) -> Result<Option<Connector>, SkeletonError> {
        if !self.table.contains(connector.node) {
            return Err(IntegrityError::DanglingConnector {
                connector: connector.id,
                node: connector.node,
            }
            .into());
        }
        Ok(self.connectors.insert(connector.id, connector))
    }

    /// Removes a connector.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn remove_connector(&mut self, id: ConnectorId) -> Result<Connector, SkeletonError> {
        self.connectors
            .remove(&id)
            .ok_or(SkeletonError::NotFound(Missing::Connector(id)))
    }

    // ---- derived views ------------------------------------------------------

    /// Graph view, built on first access.
    pub fn topology(&self) -> &Topology {
        self.topology
            .get_or_init(|| Topology::build(&self.table, self.backend.builder()))
    }

    /// Segment decomposition, built on first access.
    pub fn segment_index(&self) -> &SegmentIndex {
        self.segments
            .get_or_init(|| SegmentIndex::build(self.topology()))
    }

    /// Segments, distal first.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.segment_index().to_segments(self.topology())
    }

    /// Root ids, ascending.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.topology().roots()
    }

    /// Children of `id`, ascending.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>, SkeletonError> {
        self.topology().children_of(id)
    }

    /// `true` when the skeleton is a single tree (or empty).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.topology().is_connected()
    }

    /// Connected components as ascending id lists, ordered by root id.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        self.topology().components()
    }

    /// Structural role of `id`.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] when `id` is absent.
    pub fn kind(&self, id: NodeId) -> Result<NodeKind, SkeletonError> {
        let topo = self.topology();
        Ok(topo.kind(topo.require(id)?))
    }

    /// Nodes without children, ascending.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        let topo = self.topology();
        (0..topo.len())
            .filter(|&i| topo.is_leaf(i))
            .map(|i| topo.id(i))
            .collect()
    }

    /// Nodes with two or more children, ascending.
    #[must_use]
    pub fn branch_points(&self) -> Vec<NodeId> {
        let topo = self.topology();
        (0..topo.len())
            .filter(|&i| topo.is_branch(i))
            .map(|i| topo.id(i))
            .collect()
    }

    /// Bounding box of all node positions.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut nodes = self.table.iter();
        let (_, first) = nodes.next()?;
        let start = Aabb::new(first.position, first.position);
        Some(nodes.fold(start, |acc, (_, r)| acc.including(&r.position)))
    }

    /// Euclidean length of the edge from `i` to its parent, by dense index.
    pub(crate) fn edge_length(&self, topo: &Topology, i: usize) -> f64 {
        let Some(p) = topo.parent(i) else {
            return 0.0;
        };
        self.table
            .record_at(i)
            .position
            .distance(&self.table.record_at(p).position)
    }

    /// Dense position array, indexed like the topology.
    pub(crate) fn positions(&self) -> Vec<Vec3> {
        self.table.iter().map(|(_, r)| r.position).collect()
    }

    /// BLAKE3 digest of the canonical node table.
    #[must_use]
    pub fn table_digest(&self) -> Hash {
        digest::table_digest(&self.table)
    }

    /// BLAKE3 digest of the undirected edge set, independent of root choice.
    #[must_use]
    pub fn edge_digest(&self) -> Hash {
        digest::edge_digest(self.topology())
    }

    // ---- structural mutation (editor only) ----------------------------------

    /// Swaps in a new node map after validating it.
    ///
    /// On error the skeleton is untouched. On success connectors and soma
    /// entries whose node disappeared are dropped (connectors that were
    /// already orphaned are kept) and cached views are reset.
    pub(crate) fn replace_nodes(
        &mut self,
        nodes: BTreeMap<NodeId, NodeRecord>,
    ) -> Result<(), SkeletonError> {
        self.replace_nodes_moving(nodes, &BTreeMap::new())
    }

    /// As [`Self::replace_nodes`], first moving the listed connectors onto
    /// new nodes.
    pub(crate) fn replace_nodes_moving(
        &mut self,
        nodes: BTreeMap<NodeId, NodeRecord>,
        moves: &BTreeMap<ConnectorId, NodeId>,
    ) -> Result<(), SkeletonError> {
        let table = NodeTable::from_map(nodes);
        table.validate()?;
        let old = std::mem::replace(&mut self.table, table);
        for (id, node) in moves {
            if let Some(c) = self.connectors.get_mut(id) {
                c.node = *node;
            }
        }
        let before = self.connectors.len();
        self.connectors
            .retain(|_, c| self.table.contains(c.node) || !old.contains(c.node));
        self.soma.retain(|id| self.table.contains(*id));
        debug!(
            skeleton = %self.name,
            nodes_before = old.len(),
            nodes_after = self.table.len(),
            connectors_moved = moves.len(),
            connectors_dropped = before - self.connectors.len(),
            "node table replaced"
        );
        self.invalidate();
        Ok(())
    }

    pub(crate) fn connector_map(&self) -> &BTreeMap<ConnectorId, Connector> {
        &self.connectors
    }

    /// Splits off the nodes selected by `keep` (dense mask) into a new
    /// skeleton carrying the matching connectors and soma entries. Parent
    /// links that leave the selection are cut.
    pub(crate) fn extract(&self, keep: &[bool]) -> Self {
        let topo = self.topology();
        let mut nodes = BTreeMap::new();
        for (i, (id, record)) in self.table.iter().enumerate() {
            if !keep[i] {
                continue;
            }
            let mut record = record.clone();
            record.parent = topo.parent(i).filter(|&p| keep[p]).map(|p| topo.id(p));
            nodes.insert(id, record);
        }
        let table = NodeTable::from_map(nodes);
        let connectors = self
            .connectors
            .iter()
            .filter(|(_, c)| table.contains(c.node))
            .map(|(k, c)| (*k, c.clone()))
            .collect();
        let soma = self
            .soma
            .iter()
            .copied()
            .filter(|id| table.contains(*id))
            .collect();
        Self::assemble(
            self.name.clone(),
            self.units,
            soma,
            table,
            connectors,
            self.backend,
        )
    }

    /// Merges `other` into `self`. Ids must not collide; callers renumber
    /// first. On error `self` is untouched.
    pub(crate) fn absorb(&mut self, other: Self) -> Result<(), SkeletonError> {
        let mut nodes = self.table.clone().into_map();
        for (id, record) in other.table.into_map() {
            if nodes.insert(id, record).is_some() {
                return Err(IntegrityError::DuplicateNodeId(id).into());
            }
        }
        let mut connectors = self.connectors.clone();
        for (id, c) in other.connectors {
            if connectors.insert(id, c).is_some() {
                return Err(IntegrityError::DuplicateConnectorId(id).into());
            }
        }
        let table = NodeTable::from_map(nodes);
        table.validate()?;
        let mut soma: BTreeSet<NodeId> = self.soma.iter().copied().collect();
        soma.extend(other.soma);
        self.soma = soma.into_iter().collect();
        self.table = table;
        self.connectors = connectors;
        self.invalidate();
        Ok(())
    }

    /// Shifts every node and connector id by the given offsets.
    pub(crate) fn renumber(&mut self, node_offset: i64, connector_offset: u64) {
        if node_offset == 0 && connector_offset == 0 {
            return;
        }
        let shift = |id: NodeId| NodeId(id.0 + node_offset);
        let nodes = std::mem::take(&mut self.table)
            .into_map()
            .into_iter()
            .map(|(id, mut r)| {
                r.parent = r.parent.map(shift);
                (shift(id), r)
            })
            .collect();
        self.table = NodeTable::from_map(nodes);
        self.connectors = std::mem::take(&mut self.connectors)
            .into_values()
            .map(|mut c| {
                c.id = ConnectorId(c.id.0 + connector_offset);
                c.node = shift(c.node);
                (c.id, c)
            })
            .collect();
        for id in &mut self.soma {
            *id = shift(*id);
        }
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.topology = OnceLock::new();
        self.segments = OnceLock::new();
    }
}

/// Step-by-step construction of a [`Skeleton`] from ingestion data.
#[derive(Clone, Debug)]
pub struct SkeletonBuilder {
    name: String,
    units: Units,
    soma: Vec<NodeId>,
    rows: Vec<RawNode>,
    connectors: Vec<Connector>,
    backend: GraphBackend,
    allow_orphans: bool,
}

impl SkeletonBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Units::unitless(),
            soma: Vec::new(),
            rows: Vec::new(),
            connectors: Vec::new(),
            backend: GraphBackend::default(),
            allow_orphans: false,
        }
    }

    /// Coordinate units.
    #[must_use]
    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Adds a soma hint.
    #[must_use]
    pub fn soma(mut self, id: impl Into<NodeId>) -> Self {
        self.soma.push(id.into());
        self
    }

    /// Adds one row.
    #[must_use]
    pub fn node(mut self, row: RawNode) -> Self {
        self.rows.push(row);
        self
    }

    /// Adds rows.
    #[must_use]
    pub fn nodes<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = RawNode>,
    {
        self.rows.extend(rows);
        self
    }

    /// Adds one connector.
    #[must_use]
    pub fn connector(mut self, connector: Connector) -> Self {
        self.connectors.push(connector);
        self
    }

    /// Adds connectors.
    #[must_use]
    pub fn connectors<I>(mut self, connectors: I) -> Self
    where
        I: IntoIterator<Item = Connector>,
    {
        self.connectors.extend(connectors);
        self
    }

    /// Topology strategy.
    #[must_use]
    pub fn backend(mut self, backend: GraphBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Accept connectors whose node is missing; they are reported by
    /// [`Skeleton::orphaned_connectors`] instead of failing the build.
    #[must_use]
    pub fn allow_orphaned_connectors(mut self, allow: bool) -> Self {
        self.allow_orphans = allow;
        self
    }

    /// Validates and builds.
    ///
    /// # Errors
    /// [`SkeletonError::DataIntegrity`] for malformed rows, duplicate or
    /// (unless allowed) dangling connectors, and dangling soma hints.
    pub fn build(self) -> Result<Skeleton, SkeletonError> {
        let table = NodeTable::from_rows(self.rows)?;
        let mut connectors = BTreeMap::new();
        for c in self.connectors {
            if !self.allow_orphans && !table.contains(c.node) {
                return Err(IntegrityError::DanglingConnector {
                    connector: c.id,
                    node: c.node,
                }
                .into());
            }
            let id = c.id;
            if connectors.insert(id, c).is_some() {
                return Err(IntegrityError::DuplicateConnectorId(id).into());
            }
        }
        let soma: BTreeSet<NodeId> = self.soma.into_iter().collect();
        if let Some(&missing) = soma.iter().find(|id| !table.contains(**id)) {
            return Err(IntegrityError::DanglingSoma(missing).into());
        }
        debug!(
            skeleton = %self.name,
            nodes = table.len(),
            connectors = connectors.len(),
            "skeleton built"
        );
        Ok(Skeleton::assemble(
            self.name,
            self.units,
            soma.into_iter().collect(),
            table,
            connectors,
            self.backend,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ConnectorKind;

    fn chain(n: i64) -> Vec<RawNode> {
        (1..=n)
            .map(|i| RawNode::new(i, (i > 1).then_some(i - 1), [i as f64, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn strict_build_rejects_orphans_and_dangling_soma() {
        let orphan = Skeleton::builder("s")
            .nodes(chain(3))
            .connector(Connector::new(1, 9, ConnectorKind::Presynapse))
            .build();
        assert!(matches!(
            orphan,
            Err(SkeletonError::DataIntegrity(IntegrityError::DanglingConnector { .. }))
        ));
        let soma = Skeleton::builder("s").nodes(chain(3)).soma(7).build();
        assert!(matches!(
            soma,
            Err(SkeletonError::DataIntegrity(IntegrityError::DanglingSoma(NodeId(7))))
        ));
    }

    #[test]
    fn lenient_build_flags_orphans() {
        let Ok(skel) = Skeleton::builder("s")
            .nodes(chain(3))
            .connector(Connector::new(1, 2, ConnectorKind::Presynapse))
            .connector(Connector::new(2, 9, ConnectorKind::Postsynapse))
            .allow_orphaned_connectors(true)
            .build()
        else {
            unreachable!("lenient build");
        };
        assert_eq!(skel.orphaned_connectors(), vec![ConnectorId(2)]);
        assert_eq!(skel.connectors_of(NodeId(2)).count(), 1);
    }

    #[test]
    fn caches_reset_after_structural_replacement() {
        let Ok(mut skel) = Skeleton::from_rows("s", chain(4)) else {
            unreachable!("valid chain");
        };
        assert_eq!(skel.roots(), vec![NodeId(1)]);
        let mut nodes = skel.table().clone().into_map();
        if let Some(r) = nodes.get_mut(&NodeId(3)) {
            r.parent = None;
        }
        assert!(skel.replace_nodes(nodes).is_ok());
        assert_eq!(skel.roots(), vec![NodeId(1), NodeId(3)]);
        assert_eq!(skel.segments().len(), 2);
    }

    #[test]
    fn failed_replacement_leaves_skeleton_untouched() {
        let Ok(mut skel) = Skeleton::from_rows("s", chain(3)) else {
            unreachable!("valid chain");
        };
        let digest = skel.table_digest();
        let mut nodes = skel.table().clone().into_map();
        if let Some(r) = nodes.get_mut(&NodeId(1)) {
            r.parent = Some(NodeId(3));
        }
        assert!(matches!(
            skel.replace_nodes(nodes),
            Err(SkeletonError::DataIntegrity(IntegrityError::Cycle(_)))
        ));
        assert_eq!(skel.table_digest(), digest);
    }

    #[test]
    fn failed_absorb_leaves_receiver_untouched() {
        let with_connector = |rows: Vec<RawNode>, id: u64| {
            Skeleton::builder("s")
                .nodes(rows)
                .connector(Connector::new(id, 1, ConnectorKind::Presynapse))
                .build()
        };
        let Ok(mut skel) = with_connector(chain(3), 1) else {
            unreachable!("valid chain");
        };
        let (digest, connectors) = (skel.table_digest(), skel.connector_map().clone());

        let Ok(same_ids) = Skeleton::from_rows("t", chain(2)) else {
            unreachable!("valid chain");
        };
        assert!(matches!(
            skel.absorb(same_ids),
            Err(SkeletonError::DataIntegrity(IntegrityError::DuplicateNodeId(NodeId(1))))
        ));
        assert_eq!(skel.table_digest(), digest);

        let Ok(mut same_connector) = with_connector(chain(2), 1) else {
            unreachable!("valid chain");
        };
        same_connector.renumber(10, 0);
        assert!(matches!(
            skel.absorb(same_connector),
            Err(SkeletonError::DataIntegrity(IntegrityError::DuplicateConnectorId(ConnectorId(1))))
        ));
        assert_eq!(skel.table_digest(), digest);
        assert_eq!(skel.connector_map(), &connectors);
        assert_eq!(skel.node_count(), 3);
    }

    #[test]
    fn edge_lengths_follow_parents_when_ids_descend() {
        let rows = [
            RawNode::new(9, None, [0.0; 3]),
            RawNode::new(4, Some(9), [3.0, 4.0, 0.0]),
            RawNode::new(1, Some(4), [3.0, 4.0, 2.0]),
        ];
        let Ok(skel) = Skeleton::from_rows("s", rows) else {
            unreachable!("valid tree");
        };
        let topo = skel.topology();
        let length = |id| topo.index_of(NodeId(id)).map(|i| skel.edge_length(topo, i));
        assert_eq!(length(9), Some(0.0));
        assert_eq!(length(4), Some(5.0));
        assert_eq!(length(1), Some(2.0));
    }

    #[test]
    fn bounding_box_and_roles() {
        let Ok(skel) = Skeleton::from_rows("s", chain(3)) else {
            unreachable!("valid chain");
        };
        let bb = skel.bounding_box().map(|b| (b.min().x(), b.max().x()));
        assert_eq!(bb, Some((1.0, 3.0)));
        assert_eq!(skel.leaves(), vec![NodeId(3)]);
        assert!(skel.branch_points().is_empty());
        assert_eq!(skel.kind(NodeId(2)), Ok(NodeKind::Slab));
    }
}
