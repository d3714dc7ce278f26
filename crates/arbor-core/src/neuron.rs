// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed set of neuron representations.
//!
//! Every representation answers the [`NeuronCore`] questions (name, units,
//! bounding box). Anything else requires narrowing to the concrete variant
//! first, e.g. [`Neuron::as_skeleton`] before running topology algorithms.
use arbor_geom::{Aabb, Vec3};

use crate::error::SkeletonError;
use crate::skeleton::Skeleton;
use crate::units::Units;

/// Capabilities shared by every neuron representation.
pub trait NeuronCore {
    /// Neuron name.
    fn name(&self) -> &str;
    /// Physical units of the coordinates.
    fn units(&self) -> Units;
    /// Axis-aligned bounds, `None` for an empty neuron.
    fn bounding_box(&self) -> Option<Aabb>;
}

/// A neuron in one of the supported representations.
#[derive(Clone, Debug)]
pub enum Neuron {
    /// Tree-structured skeleton.
    Skeleton(Skeleton),
    /// Triangle surface mesh.
    Mesh(MeshNeuron),
    /// Occupied voxels on a regular grid.
    Voxel(VoxelNeuron),
    /// Points with tangent vectors.
    Dotprops(Dotprops),
}

impl Neuron {
    /// Short variant name for labels and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Skeleton(_) => "skeleton",
            Self::Mesh(_) => "mesh",
            Self::Voxel(_) => "voxel",
            Self::Dotprops(_) => "dotprops",
        }
    }

    /// The skeleton, if this is one.
    pub fn as_skeleton(&self) -> Option<&Skeleton> {
        match self {
            Self::Skeleton(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable access to the skeleton, if this is one.
    pub fn as_skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        match self {
            Self::Skeleton(s) => Some(s),
            _ => None,
        }
    }

    /// Unwraps a skeleton, handing the neuron back otherwise.
    ///
    /// # Errors
    /// Returns `self` unchanged when it is not a skeleton.
    pub fn into_skeleton(self) -> Result<Skeleton, Self> {
        match self {
            Self::Skeleton(s) => Ok(s),
            other => Err(other),
        }
    }

    /// The mesh, if this is one.
    pub fn as_mesh(&self) -> Option<&MeshNeuron> {
        match self {
            Self::Mesh(m) => Some(m),
            _ => None,
        }
    }

    /// The voxel grid, if this is one.
    pub fn as_voxel(&self) -> Option<&VoxelNeuron> {
        match self {
            Self::Voxel(v) => Some(v),
            _ => None,
        }
    }

    /// The dotprops, if this is one.
    pub fn as_dotprops(&self) -> Option<&Dotprops> {
        match self {
            Self::Dotprops(d) => Some(d),
            _ => None,
        }
    }
}

impl NeuronCore for Neuron {
    fn name(&self) -> &str {
        match self {
            Self::Skeleton(s) => s.name(),
            Self::Mesh(m) => m.name(),
            Self::Voxel(v) => v.name(),
            Self::Dotprops(d) => d.name(),
        }
    }

    fn units(&self) -> Units {
        match self {
            Self::Skeleton(s) => s.units(),
            Self::Mesh(m) => m.units(),
            Self::Voxel(v) => v.units(),
            Self::Dotprops(d) => d.units(),
        }
    }

    fn bounding_box(&self) -> Option<Aabb> {
        match self {
            Self::Skeleton(s) => s.bounding_box(),
            Self::Mesh(m) => m.bounding_box(),
            Self::Voxel(v) => v.bounding_box(),
            Self::Dotprops(d) => d.bounding_box(),
        }
    }
}

impl From<Skeleton> for Neuron {
    fn from(value: Skeleton) -> Self {
        Self::Skeleton(value)
    }
}

impl From<MeshNeuron> for Neuron {
    fn from(value: MeshNeuron) -> Self {
        Self::Mesh(value)
    }
}

impl From<VoxelNeuron> for Neuron {
    fn from(value: VoxelNeuron) -> Self {
        Self::Voxel(value)
    }
}

impl From<Dotprops> for Neuron {
    fn from(value: Dotprops) -> Self {
        Self::Dotprops(value)
    }
}

impl NeuronCore for Skeleton {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn units(&self) -> Units {
        Self::units(self)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Self::bounding_box(self)
    }
}

/// Triangle mesh. Faces index into `vertices`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "wire::MeshParts"))]
pub struct MeshNeuron {
    name: String,
    units: Units,
    vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
}

impl MeshNeuron {
    /// Builds a mesh, checking every face index.
    ///
    /// # Errors
    /// `InvalidOperation` when a face references a missing vertex or the same
    /// vertex twice.
    pub fn new(
        name: impl Into<String>,
        units: Units,
        vertices: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
    ) -> Result<Self, SkeletonError> {
        for (f, face) in faces.iter().enumerate() {
            if let Some(v) = face.iter().find(|v| **v as usize >= vertices.len()) {
                return Err(SkeletonError::invalid(
                    "mesh",
                    format!("face {f} references vertex {v} of {}", vertices.len()),
                ));
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(SkeletonError::invalid("mesh", format!("face {f} is degenerate")));
            }
        }
        Ok(Self {
            name: name.into(),
            units,
            vertices,
            faces,
        })
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangles as vertex index triples.
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Total triangle area.
    pub fn area(&self) -> f64 {
        self.faces
            .iter()
            .map(|[a, b, c]| {
                let (a, b, c) = (
                    self.vertices[*a as usize],
                    self.vertices[*b as usize],
                    self.vertices[*c as usize],
                );
                let (u, v) = (b.sub(&a), c.sub(&a));
                let cross = Vec3::new(
                    u.y() * v.z() - u.z() * v.y(),
                    u.z() * v.x() - u.x() * v.z(),
                    u.x() * v.y() - u.y() * v.x(),
                );
                cross.length() / 2.0
            })
            .sum()
    }
}

impl NeuronCore for MeshNeuron {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> Units {
        self.units
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}

/// Occupied cells of a regular grid.
///
/// Cell `(i, j, k)` spans `offset + (i, j, k) * voxel_size` to
/// `offset + (i + 1, j + 1, k + 1) * voxel_size`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "wire::VoxelParts"))]
pub struct VoxelNeuron {
    name: String,
    units: Units,
    voxel_size: Vec3,
    offset: Vec3,
    voxels: Vec<[u32; 3]>,
}

impl VoxelNeuron {
    /// Builds a voxel neuron.
    ///
    /// # Errors
    /// `InvalidOperation` when a voxel dimension is not finite and positive.
    pub fn new(
        name: impl Into<String>,
        units: Units,
        voxel_size: Vec3,
        offset: Vec3,
        voxels: Vec<[u32; 3]>,
    ) -> Result<Self, SkeletonError> {
        if (0..3).any(|a| !(voxel_size.component(a).is_finite() && voxel_size.component(a) > 0.0)) {
            return Err(SkeletonError::invalid("voxel", "voxel size must be finite and positive"));
        }
        Ok(Self {
            name: name.into(),
            units,
            voxel_size,
            offset,
            voxels,
        })
    }

    /// Occupied cell indices.
    pub fn voxels(&self) -> &[[u32; 3]] {
        &self.voxels
    }

    /// Edge lengths of one cell.
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    fn corner(&self, cell: [f64; 3]) -> Vec3 {
        Vec3::new(
            self.offset.x() + cell[0] * self.voxel_size.x(),
            self.offset.y() + cell[1] * self.voxel_size.y(),
            self.offset.z() + cell[2] * self.voxel_size.z(),
        )
    }
}

impl NeuronCore for VoxelNeuron {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> Units {
        self.units
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let first = *self.voxels.first()?;
        let (lo, hi) = self.voxels.iter().fold((first, first), |(lo, hi), v| {
            (
                [lo[0].min(v[0]), lo[1].min(v[1]), lo[2].min(v[2])],
                [hi[0].max(v[0]), hi[1].max(v[1]), hi[2].max(v[2])],
            )
        });
        let lo = self.corner(lo.map(f64::from));
        let hi = self.corner(hi.map(|c| f64::from(c) + 1.0));
        Some(Aabb::new(lo, hi))
    }
}

/// Point cloud with one unit tangent per point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "wire::DotpropsParts"))]
pub struct Dotprops {
    name: String,
    units: Units,
    points: Vec<Vec3>,
    tangents: Vec<Vec3>,
}

impl Dotprops {
    /// Builds dotprops from matching point and tangent lists.
    ///
    /// # Errors
    /// `InvalidOperation` when the lists differ in length.
    pub fn new(
        name: impl Into<String>,
        units: Units,
        points: Vec<Vec3>,
        tangents: Vec<Vec3>,
    ) -> Result<Self, SkeletonError> {
        if points.len() != tangents.len() {
            return Err(SkeletonError::invalid(
                "dotprops",
                format!("{} points but {} tangents", points.len(), tangents.len()),
            ));
        }
        Ok(Self {
            name: name.into(),
            units,
            points,
            tangents,
        })
    }

    /// One point per non-degenerate edge: the edge midpoint, with the unit
    /// vector from child to parent as tangent. Edges are taken in ascending
    /// child id order; zero-length edges are skipped.
    pub fn from_skeleton(skel: &Skeleton) -> Self {
        let topo = skel.topology();
        let positions = skel.positions();
        let mut points = Vec::with_capacity(topo.len());
        let mut tangents = Vec::with_capacity(topo.len());
        for i in 0..topo.len() {
            let Some(p) = topo.parent(i) else {
                continue;
            };
            let (a, b) = (positions[i], positions[p]);
            let tangent = b.sub(&a).normalize();
            if tangent == Vec3::ZERO {
                continue;
            }
            points.push(a.midpoint(&b));
            tangents.push(tangent);
        }
        Self {
            name: skel.name().to_owned(),
            units: skel.units(),
            points,
            tangents,
        }
    }

    /// Points.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Unit tangents, parallel to [`Dotprops::points`].
    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl NeuronCore for Dotprops {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> Units {
        self.units
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }
}

/// Deserialized field sets; conversion re-runs the constructor checks.
#[cfg(feature = "serde")]
mod wire {
    use arbor_geom::Vec3;
    use serde::Deserialize;

    use super::{Dotprops, MeshNeuron, VoxelNeuron};
    use crate::error::SkeletonError;
    use crate::units::Units;

    #[derive(Deserialize)]
    pub(super) struct MeshParts {
        name: String,
        units: Units,
        vertices: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
    }

    impl TryFrom<MeshParts> for MeshNeuron {
        type Error = SkeletonError;

        fn try_from(p: MeshParts) -> Result<Self, Self::Error> {
            Self::new(p.name, p.units, p.vertices, p.faces)
        }
    }

    #[derive(Deserialize)]
    pub(super) struct VoxelParts {
        name: String,
        units: Units,
        voxel_size: Vec3,
        offset: Vec3,
        voxels: Vec<[u32; 3]>,
    }

    impl TryFrom<VoxelParts> for VoxelNeuron {
        type Error = SkeletonError;

        fn try_from(p: VoxelParts) -> Result<Self, Self::Error> {
            Self::new(p.name, p.units, p.voxel_size, p.offset, p.voxels)
        }
    }

    #[derive(Deserialize)]
    pub(super) struct DotpropsParts {
        name: String,
        units: Units,
        points: Vec<Vec3>,
        tangents: Vec<Vec3>,
    }

    impl TryFrom<DotpropsParts> for Dotprops {
        type Error = SkeletonError;

        fn try_from(p: DotpropsParts) -> Result<Self, Self::Error> {
            Self::new(p.name, p.units, p.points, p.tangents)
        }
    }
}
