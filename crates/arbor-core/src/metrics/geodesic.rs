// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geodesic distances through lowest common ancestors.
//!
//! `d(a, b) = root(a) + root(b) - 2 * root(lca(a, b))` where `root(x)` is the
//! along-the-arbor distance from `x` to its root. Root distances are
//! accumulated once in breadth-first order; ancestors are found with a
//! binary-lifting table, so each query costs `O(log depth)`.
use crate::error::SkeletonError;
use crate::ident::NodeId;
use crate::metrics::NodeMap;
use crate::skeleton::Skeleton;
use crate::topology::Topology;

/// Edge weighting for geodesic queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weighting {
    /// Euclidean edge length (coordinate units).
    #[default]
    Cable,
    /// One per edge.
    Hops,
}

/// Preprocessed geodesic query structure borrowing a skeleton's topology.
#[derive(Debug)]
pub struct GeodesicIndex<'a> {
    topo: &'a Topology,
    to_root: Vec<f64>,
    /// `up[k][i]` is the `2^k`-th ancestor of `i` (or its root).
    up: Vec<Vec<usize>>,
}

impl<'a> GeodesicIndex<'a> {
    /// Builds the index in `O(n log depth)`.
    #[must_use]
    pub fn new(skel: &'a Skeleton, weighting: Weighting) -> Self {
        let topo = skel.topology();
        let n = topo.len();
        let mut to_root = vec![0.0; n];
        for &i in topo.order() {
            if let Some(p) = topo.parent(i) {
                let w = match weighting {
                    Weighting::Cable => skel.edge_length(topo, i),
                    Weighting::Hops => 1.0,
                };
                to_root[i] = to_root[p] + w;
            }
        }
        let max_depth = (0..n).map(|i| topo.depth(i)).max().unwrap_or(0);
        let levels = (u32::BITS - max_depth.leading_zeros()).max(1) as usize;
        let mut up = Vec::with_capacity(levels);
        up.push((0..n).map(|i| topo.parent(i).unwrap_or(i)).collect::<Vec<_>>());
        for k in 1..levels {
            let prev = &up[k - 1];
            let next = (0..n).map(|i| prev[prev[i]]).collect();
            up.push(next);
        }
        Self { topo, to_root, up }
    }

    fn lca_index(&self, a: usize, b: usize) -> Option<usize> {
        let topo = self.topo;
        if topo.component(a) != topo.component(b) {
            return None;
        }
        let (mut a, mut b) = if topo.depth(a) >= topo.depth(b) { (a, b) } else { (b, a) };
        let mut lift = topo.depth(a) - topo.depth(b);
        let mut k = 0;
        while lift > 0 {
            if lift & 1 == 1 {
                a = self.up[k][a];
            }
            lift >>= 1;
            k += 1;
        }
        if a == b {
            return Some(a);
        }
        for level in self.up.iter().rev() {
            if level[a] != level[b] {
                a = level[a];
                b = level[b];
            }
        }
        Some(self.up[0][a])
    }

    /// Distance between dense indices; infinite across components.
    #[must_use]
    pub fn distance_index(&self, a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        match self.lca_index(a, b) {
            Some(l) => (self.to_root[a] + self.to_root[b] - 2.0 * self.to_root[l]).max(0.0),
            None => f64::INFINITY,
        }
    }

    /// Geodesic distance between two nodes.
    ///
    /// Symmetric, exactly zero for `a == b`, and `f64::INFINITY` when the
    /// nodes lie in different components.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] for unknown ids.
    pub fn distance(&self, a: NodeId, b: NodeId) -> Result<f64, SkeletonError> {
        let ia = self.topo.require(a)?;
        let ib = self.topo.require(b)?;
        Ok(self.distance_index(ia, ib))
    }

    /// Lowest common ancestor; `None` across components.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] for unknown ids.
    pub fn lca(&self, a: NodeId, b: NodeId) -> Result<Option<NodeId>, SkeletonError> {
        let ia = self.topo.require(a)?;
        let ib = self.topo.require(b)?;
        Ok(self.lca_index(ia, ib).map(|l| self.topo.id(l)))
    }

    /// Distance from `a` to its root.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] for unknown ids.
    pub fn to_root(&self, a: NodeId) -> Result<f64, SkeletonError> {
        Ok(self.to_root[self.topo.require(a)?])
    }

    /// Distances from every node to its root, by dense index.
    #[must_use]
    pub fn to_root_dense(&self) -> &[f64] {
        &self.to_root
    }

    /// Distances for every `(source, target)` pair.
    ///
    /// # Errors
    /// [`SkeletonError::NotFound`] for unknown ids.
    pub fn matrix(&self, sources: &[NodeId], targets: &[NodeId]) -> Result<GeodesicMatrix, SkeletonError> {
        let rows: Vec<usize> = sources
            .iter()
            .map(|&id| self.topo.require(id))
            .collect::<Result<_, _>>()?;
        let cols: Vec<usize> = targets
            .iter()
            .map(|&id| self.topo.require(id))
            .collect::<Result<_, _>>()?;
        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for &r in &rows {
            data.extend(cols.iter().map(|&c| self.distance_index(r, c)));
        }
        Ok(GeodesicMatrix {
            rows: sources.to_vec(),
            cols: targets.to_vec(),
            data,
        })
    }
}

/// Row-major matrix of geodesic distances.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeodesicMatrix {
    rows: Vec<NodeId>,
    cols: Vec<NodeId>,
    data: Vec<f64>,
}

impl GeodesicMatrix {
    /// Row labels.
    #[must_use]
    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    /// Column labels.
    #[must_use]
    pub fn cols(&self) -> &[NodeId] {
        &self.cols
    }

    /// Entry at `(row, col)` position.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows.len() && col < self.cols.len())
            .then(|| self.data[row * self.cols.len() + col])
    }

    /// Entry by node ids (first matching row and column).
    #[must_use]
    pub fn get_by_id(&self, row: NodeId, col: NodeId) -> Option<f64> {
        let r = self.rows.iter().position(|&id| id == row)?;
        let c = self.cols.iter().position(|&id| id == col)?;
        self.get(r, c)
    }

    /// One row as a slice.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let w = self.cols.len();
        (row < self.rows.len()).then(|| &self.data[row * w..(row + 1) * w])
    }
}

/// Geodesic distance between two nodes of `skel`.
///
/// Builds a fresh [`GeodesicIndex`]; keep an index around for many queries.
///
/// # Errors
/// [`SkeletonError::NotFound`] for unknown ids.
pub fn geodesic_distance(skel: &Skeleton, a: NodeId, b: NodeId) -> Result<f64, SkeletonError> {
    GeodesicIndex::new(skel, Weighting::Cable).distance(a, b)
}

/// Square geodesic matrix over `nodes`, or over every node when `None`.
///
/// # Errors
/// [`SkeletonError::NotFound`] for unknown ids.
pub fn geodesic_matrix(
    skel: &Skeleton,
    nodes: Option<&[NodeId]>,
    weighting: Weighting,
) -> Result<GeodesicMatrix, SkeletonError> {
    let index = GeodesicIndex::new(skel, weighting);
    match nodes {
        Some(ids) => index.matrix(ids, ids),
        None => {
            let ids = skel.topology().ids();
            index.matrix(ids, ids)
        }
    }
}

/// Distance from every node to its root.
#[must_use]
pub fn dist_to_root(skel: &Skeleton, weighting: Weighting) -> NodeMap<f64> {
    let index = GeodesicIndex::new(skel, weighting);
    let topo = skel.topology();
    index
        .to_root
        .iter()
        .enumerate()
        .map(|(i, d)| (topo.id(i), *d))
        .collect()
}
