//! Conforming meshes with boundary indicators on their boundary faces.
use crate::connectivity::{
    Connectivity, Quad4d2Connectivity, Segment2d1Connectivity, Tet4Connectivity, Tri3d2Connectivity,
};
use crate::element::ElementConnectivity;
use crate::{Real, TransferError};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector, Scalar, U1, U2, U3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::iter::once;

pub mod procedural;

/// Label attached to a boundary face.
///
/// Boundary faces that have not been explicitly labeled carry the default indicator `0`.
/// The raw value `255` is reserved and can not be used as an indicator.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BoundaryIndicator(u8);

impl BoundaryIndicator {
    /// The reserved raw value.
    pub const RESERVED: u8 = 255;

    pub fn new(value: u8) -> Result<Self, TransferError> {
        if value == Self::RESERVED {
            Err(TransferError::InvalidBoundaryIndicator)
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for BoundaryIndicator {
    type Error = TransferError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BoundaryIndicator> for u8 {
    fn from(indicator: BoundaryIndicator) -> Self {
        indicator.0
    }
}

impl fmt::Display for BoundaryIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A face of a mesh, as found by [`Mesh::find_faces`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFace<F> {
    pub connectivity: F,
    /// Index of the (first) cell the face belongs to.
    pub cell_index: usize,
    /// Local index of the face within that cell.
    pub local_index: usize,
    /// The indicator of the face if it lies on the boundary, otherwise `None`.
    pub boundary: Option<BoundaryIndicator>,
}

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Mesh<T: Scalar, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    // serde's not able correctly determine the necessary trait bounds in this case,
    // so write our own
    #[serde(bound(
        serialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Serialize",
        deserialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Deserialize<'de>"
    ))]
    vertices: Vec<OPoint<T, D>>,
    #[serde(bound(
        serialize = "Connectivity: Serialize",
        deserialize = "Connectivity: Deserialize<'de>"
    ))]
    connectivity: Vec<Connectivity>,
    /// Explicitly assigned indicators, keyed by the sorted vertex indices of the face.
    #[serde(default)]
    boundary_indicators: BTreeMap<Vec<usize>, BoundaryIndicator>,
}

pub type Mesh1d<T, Connectivity> = Mesh<T, U1, Connectivity>;
pub type Mesh2d<T, Connectivity> = Mesh<T, U2, Connectivity>;
pub type Mesh3d<T, Connectivity> = Mesh<T, U3, Connectivity>;

pub type IntervalMesh<T> = Mesh1d<T, Segment2d1Connectivity>;
pub type TriangleMesh2d<T> = Mesh2d<T, Tri3d2Connectivity>;
pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;
pub type Tet4Mesh<T> = Mesh3d<T, Tet4Connectivity>;

fn sorted_key(vertex_indices: &[usize]) -> Vec<usize> {
    let mut key = vertex_indices.to_vec();
    key.sort_unstable();
    key
}

impl<T, D, Connectivity> Mesh<T, D, Connectivity>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn vertices_mut(&mut self) -> &mut [OPoint<T, D>] {
        &mut self.vertices
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Connectivity] {
        &self.connectivity
    }

    /// Construct a mesh from vertices and connectivity.
    ///
    /// The provided connectivity is expected only to return valid (i.e. in-bounds) indices.
    /// Users of the mesh are permitted to panic if they encounter invalid indices.
    ///
    /// All boundary faces initially carry the default indicator.
    pub fn from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<Connectivity>) -> Self {
        Self {
            vertices,
            connectivity,
            boundary_indicators: BTreeMap::new(),
        }
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: ElementConnectivity<T, GeometryDim = D>,
    DefaultAllocator: crate::allocators::BiDimAllocator<T, D, C::ReferenceDim>,
{
    pub fn get_element(&self, index: usize) -> Option<C::Element> {
        self.connectivity()
            .get(index)
            .and_then(|conn| conn.element(self.vertices()))
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Finds all unique faces of the mesh, sorted by their (sorted) vertex indices.
    ///
    /// Faces connected to exactly one cell are boundary faces and carry their indicator.
    pub fn find_faces(&self) -> Vec<MeshFace<C::FaceConnectivity>> {
        // Count the number of occurrences of "equivalent" faces (in the sense that they refer
        // to the same vertex indices). Use a BTreeMap to avoid non-determinism due to
        // HashMap's internal randomization.
        let mut face_counts = BTreeMap::new();
        for (cell_index, cell_conn) in self.connectivity.iter().enumerate() {
            for local_index in 0..cell_conn.num_faces() {
                if let Some(face_conn) = cell_conn.get_face_connectivity(local_index) {
                    face_counts
                        .entry(sorted_key(face_conn.vertex_indices()))
                        .and_modify(|(_, count)| *count += 1)
                        .or_insert(((face_conn, cell_index, local_index), 1));
                }
            }
        }

        face_counts
            .into_iter()
            .map(|(key, ((connectivity, cell_index, local_index), count))| {
                let boundary = (count == 1).then(|| {
                    self.boundary_indicators
                        .get(&key)
                        .copied()
                        .unwrap_or_default()
                });
                MeshFace {
                    connectivity,
                    cell_index,
                    local_index,
                    boundary,
                }
            })
            .collect()
    }

    /// Finds faces which are only connected to exactly one cell, along with the connected cell
    /// index and the local index of the face within that cell.
    pub fn find_boundary_faces(&self) -> Vec<(C::FaceConnectivity, usize, usize)> {
        self.find_faces()
            .into_iter()
            .filter(|face| face.boundary.is_some())
            .map(|face| (face.connectivity, face.cell_index, face.local_index))
            .collect()
    }

    /// Returns a sorted list of vertices that are determined to be on the boundary.
    ///
    /// A vertex is considered to be a part of the boundary if it belongs to a boundary face.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for (connectivity, _, _) in self.find_boundary_faces() {
            indices.extend(connectivity.vertex_indices());
        }
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Labels the face with the given vertex indices (in any order).
    ///
    /// The label only takes effect if the face is a boundary face of the mesh.
    pub fn set_boundary_indicator(&mut self, face_vertices: &[usize], indicator: BoundaryIndicator) {
        self.boundary_indicators
            .insert(sorted_key(face_vertices), indicator);
    }

    /// The set of distinct indicators found on the boundary, in ascending order.
    pub fn boundary_indicators(&self) -> Vec<BoundaryIndicator> {
        let mut indicators: Vec<_> = self
            .find_faces()
            .into_iter()
            .filter_map(|face| face.boundary)
            .collect();
        indicators.sort_unstable();
        indicators.dedup();
        indicators
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Real,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Labels every boundary face with the indicator returned for its centroid.
    pub fn assign_boundary_indicators<F>(&mut self, mut indicator_for_centroid: F)
    where
        F: FnMut(&OPoint<T, D>) -> BoundaryIndicator,
    {
        for (face, _, _) in self.find_boundary_faces() {
            let face_vertices = face.vertex_indices();
            let n = T::from_usize(face_vertices.len()).expect("Must be able to fit usize in T");
            let centroid = face_vertices
                .iter()
                .fold(OVector::<T, D>::zeros(), |sum, &v| sum + &self.vertices[v].coords)
                / n;
            let indicator = indicator_for_centroid(&OPoint::from(centroid));
            self.set_boundary_indicator(face_vertices, indicator);
        }
    }

    /// Transform all vertices of the mesh by the given transformation function.
    pub fn transform_vertices<F>(&mut self, mut transformation: F)
    where
        F: FnMut(&mut OPoint<T, D>),
    {
        for p in &mut self.vertices {
            transformation(p);
        }
    }
}

impl<T> QuadMesh2d<T>
where
    T: Real,
{
    /// Splits each quadrilateral `[0, 1, 2, 3]` into the triangles `[0, 1, 2]` and `[0, 2, 3]`.
    ///
    /// Boundary indicators are preserved.
    pub fn split_into_triangles(self) -> TriangleMesh2d<T> {
        let triangles = self
            .connectivity()
            .iter()
            .flat_map(|&Quad4d2Connectivity([a, b, c, d])| {
                once(Tri3d2Connectivity([a, b, c])).chain(once(Tri3d2Connectivity([a, c, d])))
            })
            .collect();

        Mesh {
            vertices: self.vertices,
            connectivity: triangles,
            boundary_indicators: self.boundary_indicators,
        }
    }
}
