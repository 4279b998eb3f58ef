use crate::allocators::BiDimAllocator;
use crate::connectivity::Connectivity;
use crate::element::{ElementConnectivity, FiniteElement, ReferenceFiniteElement};
use crate::mesh::{BoundaryIndicator, Mesh, MeshFace};
use crate::space::{BoundaryFunctionSpace, FunctionSpace};
use crate::{Real, SmallDim, TransferError};
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DMatrixViewMut, DefaultAllocator, DimName, Dyn, MatrixViewMut, OMatrix, OPoint, Scalar};

/// A linear Lagrange space with a fixed number of vector components over a [`Mesh`].
///
/// There is one node per mesh vertex. The global dof for component `c` of vertex `v` is
/// `num_components * v + c`, and the same interleaving is used for the local dofs of
/// elements and faces.
#[derive(Clone)]
pub struct LagrangeSpace<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: Mesh<T, D, C>,
    num_components: usize,
    faces: Vec<MeshFace<C::FaceConnectivity>>,
    max_couplings_per_dof: usize,
}

impl<T, D, C> LagrangeSpace<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Creates a space with the given number of components on the mesh.
    ///
    /// # Panics
    ///
    /// Panics if `num_components` is zero.
    pub fn new(mesh: Mesh<T, D, C>, num_components: usize) -> Self {
        assert!(num_components > 0, "Lagrange space must have at least one component");

        let mut vertex_neighbors = vec![Vec::new(); mesh.vertices().len()];
        for conn in mesh.connectivity() {
            let vertices = conn.vertex_indices();
            for &v in vertices {
                vertex_neighbors[v].extend_from_slice(vertices);
            }
        }
        let max_vertex_couplings = vertex_neighbors
            .into_iter()
            .map(|mut neighbors| {
                neighbors.sort_unstable();
                neighbors.dedup();
                neighbors.len()
            })
            .max()
            .unwrap_or(0);

        let faces = mesh.find_faces();
        Self {
            mesh,
            num_components,
            faces,
            max_couplings_per_dof: num_components * max_vertex_couplings,
        }
    }

    pub fn mesh(&self) -> &Mesh<T, D, C> {
        &self.mesh
    }

    /// The global dof of the given component at the given mesh vertex.
    pub fn vertex_dof(&self, vertex_index: usize, component: usize) -> usize {
        assert!(component < self.num_components);
        self.num_components * vertex_index + component
    }

    fn populate_interleaved_dofs(&self, dofs: &mut [usize], vertex_indices: &[usize]) {
        let nc = self.num_components;
        assert_eq!(dofs.len(), nc * vertex_indices.len(), "Output must have one entry per local dof");
        for (local_vertex, &v) in vertex_indices.iter().enumerate() {
            for c in 0..nc {
                dofs[nc * local_vertex + c] = nc * v + c;
            }
        }
    }
}

/// Expands per-node values stored in the first `values.len() / num_components` entries
/// so that each value is repeated for every component of its node.
fn spread_over_components<X: Clone>(values: &mut [X], num_components: usize) {
    let num_nodes = values.len() / num_components;
    for node in (0..num_nodes).rev() {
        let value = values[node].clone();
        for c in 0..num_components {
            values[num_components * node + c] = value.clone();
        }
    }
}

impl<T, D, C> LagrangeSpace<T, D, C>
where
    T: Real,
    D: SmallDim,
    C: ElementConnectivity<T, GeometryDim = D, ReferenceDim = D>,
    DefaultAllocator: BiDimAllocator<T, D, D>,
{
    fn element(&self, element_index: usize) -> C::Element {
        self.mesh
            .get_element(element_index)
            .expect("Element index must be in bounds and refer to valid vertices")
    }
}

impl<T, D, C> FunctionSpace<T> for LagrangeSpace<T, D, C>
where
    T: Real,
    D: SmallDim,
    C: ElementConnectivity<T, GeometryDim = D, ReferenceDim = D>,
    DefaultAllocator: BiDimAllocator<T, D, D>,
{
    type GeometryDim = D;

    fn num_elements(&self) -> usize {
        self.mesh.connectivity().len()
    }

    fn num_dofs(&self) -> usize {
        self.num_components * self.mesh.vertices().len()
    }

    fn num_components(&self) -> usize {
        self.num_components
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.num_components * self.mesh.connectivity()[element_index].vertex_indices().len()
    }

    fn populate_element_dofs(&self, dofs: &mut [usize], element_index: usize) {
        let conn = &self.mesh.connectivity()[element_index];
        self.populate_interleaved_dofs(dofs, conn.vertex_indices());
    }

    fn element_dof_component(&self, _element_index: usize, local_dof: usize) -> usize {
        local_dof % self.num_components
    }

    fn populate_element_reference_support_points(&self, element_index: usize, points: &mut [OPoint<T, D>]) {
        let element = self.element(element_index);
        let n = element.num_nodes();
        assert_eq!(points.len(), self.num_components * n);
        element.populate_reference_nodes(&mut points[..n]);
        spread_over_components(points, self.num_components);
    }

    fn map_element_reference_coords(&self, element_index: usize, reference_coords: &OPoint<T, D>) -> OPoint<T, D> {
        self.element(element_index)
            .map_reference_coords(reference_coords)
    }

    fn element_reference_jacobian(&self, element_index: usize, reference_coords: &OPoint<T, D>) -> OMatrix<T, D, D> {
        self.element(element_index)
            .reference_jacobian(reference_coords)
    }

    fn populate_element_basis(&self, element_index: usize, basis_values: &mut [T], reference_coords: &OPoint<T, D>) {
        let element = self.element(element_index);
        let n = element.num_nodes();
        assert_eq!(basis_values.len(), self.num_components * n);
        element.populate_basis(&mut basis_values[..n], reference_coords);
        spread_over_components(basis_values, self.num_components);
    }

    fn populate_element_gradients(
        &self,
        element_index: usize,
        mut gradients: MatrixViewMut<T, D, Dyn>,
        reference_coords: &OPoint<T, D>,
    ) {
        let element = self.element(element_index);
        let n = element.num_nodes();
        let nc = self.num_components;
        assert_eq!(gradients.ncols(), nc * n);
        element.populate_basis_gradients(gradients.columns_mut(0, n), reference_coords);
        for node in (0..n).rev() {
            let gradient = gradients.column(node).clone_owned();
            for c in 0..nc {
                gradients.column_mut(nc * node + c).copy_from(&gradient);
            }
        }
    }

    fn supports_exact_mass(&self) -> bool {
        <C::Element as FiniteElement<T>>::HAS_EXACT_MASS
    }

    fn populate_element_exact_mass(&self, element_index: usize, mut mass: DMatrixViewMut<T>) -> Result<(), TransferError> {
        let element = self.element(element_index);
        let n = element.num_nodes();
        let nc = self.num_components;
        assert_eq!(mass.shape(), (nc * n, nc * n), "Mass matrix must be square with one row per local dof");

        let mut node_mass = DMatrix::zeros(n, n);
        element.populate_exact_mass(DMatrixViewMut::from(&mut node_mass))?;

        mass.fill(T::zero());
        for i in 0..n {
            for j in 0..n {
                for c in 0..nc {
                    mass[(nc * i + c, nc * j + c)] = node_mass[(i, j)];
                }
            }
        }
        Ok(())
    }

    fn max_couplings_per_dof(&self) -> usize {
        self.max_couplings_per_dof
    }
}

impl<T, D, C> LagrangeSpace<T, D, C>
where
    T: Real,
    D: SmallDim,
    C: ElementConnectivity<T, GeometryDim = D, ReferenceDim = D>,
    C::FaceConnectivity: ElementConnectivity<T, GeometryDim = D>,
    DefaultAllocator:
        BiDimAllocator<T, D, D> + BiDimAllocator<T, D, <C::FaceConnectivity as ElementConnectivity<T>>::ReferenceDim>,
{
    fn face_element(&self, face_index: usize) -> <C::FaceConnectivity as ElementConnectivity<T>>::Element {
        self.faces[face_index]
            .connectivity
            .element(self.mesh.vertices())
            .expect("Face must refer to valid vertices")
    }
}

impl<T, D, C> BoundaryFunctionSpace<T> for LagrangeSpace<T, D, C>
where
    T: Real,
    D: SmallDim,
    C: ElementConnectivity<T, GeometryDim = D, ReferenceDim = D>,
    C::FaceConnectivity: ElementConnectivity<T, GeometryDim = D>,
    DefaultAllocator:
        BiDimAllocator<T, D, D> + BiDimAllocator<T, D, <C::FaceConnectivity as ElementConnectivity<T>>::ReferenceDim>,
{
    type FaceReferenceDim = <C::FaceConnectivity as ElementConnectivity<T>>::ReferenceDim;

    fn num_faces(&self) -> usize {
        self.faces.len()
    }

    fn face_boundary(&self, face_index: usize) -> Option<BoundaryIndicator> {
        self.faces[face_index].boundary
    }

    fn face_dof_count(&self, face_index: usize) -> usize {
        self.num_components * self.faces[face_index].connectivity.vertex_indices().len()
    }

    fn populate_face_dofs(&self, dofs: &mut [usize], face_index: usize) {
        let face = &self.faces[face_index];
        self.populate_interleaved_dofs(dofs, face.connectivity.vertex_indices());
    }

    fn face_dof_component(&self, _face_index: usize, local_dof: usize) -> usize {
        local_dof % self.num_components
    }

    fn populate_face_support_points(&self, face_index: usize, points: &mut [OPoint<T, D>]) {
        let face_vertices = self.faces[face_index].connectivity.vertex_indices();
        let nc = self.num_components;
        assert_eq!(points.len(), nc * face_vertices.len());
        for (local_vertex, &v) in face_vertices.iter().enumerate() {
            for c in 0..nc {
                points[nc * local_vertex + c] = self.mesh.vertices()[v].clone();
            }
        }
    }

    fn map_face_reference_coords(
        &self,
        face_index: usize,
        reference_coords: &OPoint<T, Self::FaceReferenceDim>,
    ) -> OPoint<T, D> {
        self.face_element(face_index)
            .map_reference_coords(reference_coords)
    }

    fn face_measure_scale(&self, face_index: usize, reference_coords: &OPoint<T, Self::FaceReferenceDim>) -> T {
        self.face_element(face_index)
            .measure_scale(reference_coords)
    }

    fn populate_face_basis(
        &self,
        face_index: usize,
        basis_values: &mut [T],
        reference_coords: &OPoint<T, Self::FaceReferenceDim>,
    ) {
        let element = self.face_element(face_index);
        let n = element.num_nodes();
        assert_eq!(basis_values.len(), self.num_components * n);
        element.populate_basis(&mut basis_values[..n], reference_coords);
        spread_over_components(basis_values, self.num_components);
    }
}
