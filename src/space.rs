//! Function space abstractions consumed by the transfer algorithms.
use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::mesh::BoundaryIndicator;
use crate::{SmallDim, TransferError};
use nalgebra::{DMatrixViewMut, DefaultAllocator, DimName, Dyn, MatrixViewMut, OMatrix, OPoint, Scalar};

mod lagrange;

pub use lagrange::LagrangeSpace;

/// A discretized function space over a collection of cells.
///
/// Every cell ("element") has a number of local degrees of freedom (dofs), each associated with
/// a global dof index, a vector component and a support point. Reference and geometry
/// dimensions coincide for the cells of a function space.
pub trait FunctionSpace<T>
where
    T: Scalar,
    DefaultAllocator: DimAllocator<T, Self::GeometryDim>,
{
    type GeometryDim: SmallDim;

    fn num_elements(&self) -> usize;

    /// The total number of global dofs.
    fn num_dofs(&self) -> usize;

    /// The number of vector components of functions in the space.
    fn num_components(&self) -> usize;

    fn element_dof_count(&self, element_index: usize) -> usize;

    /// Stores the global index of each local dof of the element.
    fn populate_element_dofs(&self, dofs: &mut [usize], element_index: usize);

    /// The vector component the given local dof contributes to.
    fn element_dof_component(&self, element_index: usize, local_dof: usize) -> usize;

    /// Stores the reference coordinates of the support point of each local dof.
    ///
    /// Several dofs may share a support point.
    fn populate_element_reference_support_points(
        &self,
        element_index: usize,
        points: &mut [OPoint<T, Self::GeometryDim>],
    );

    fn map_element_reference_coords(
        &self,
        element_index: usize,
        reference_coords: &OPoint<T, Self::GeometryDim>,
    ) -> OPoint<T, Self::GeometryDim>;

    fn element_reference_jacobian(
        &self,
        element_index: usize,
        reference_coords: &OPoint<T, Self::GeometryDim>,
    ) -> OMatrix<T, Self::GeometryDim, Self::GeometryDim>;

    /// Evaluates the scalar shape function of each local dof at the reference coordinates.
    ///
    /// The local dof contributes the returned value to its own component only.
    fn populate_element_basis(
        &self,
        element_index: usize,
        basis_values: &mut [T],
        reference_coords: &OPoint<T, Self::GeometryDim>,
    );

    /// Stores the reference gradient of the shape function of each local dof in the
    /// corresponding column.
    fn populate_element_gradients(
        &self,
        element_index: usize,
        gradients: MatrixViewMut<T, Self::GeometryDim, Dyn>,
        reference_coords: &OPoint<T, Self::GeometryDim>,
    );

    /// Whether [`populate_element_exact_mass`](Self::populate_element_exact_mass) is available.
    fn supports_exact_mass(&self) -> bool {
        false
    }

    /// Stores the exact element mass matrix, indexed by local dofs.
    fn populate_element_exact_mass(
        &self,
        _element_index: usize,
        _mass: DMatrixViewMut<T>,
    ) -> Result<(), TransferError> {
        Err(TransferError::NotImplemented("exact element mass matrix"))
    }

    /// An upper bound on the number of dofs any dof couples with (itself included).
    fn max_couplings_per_dof(&self) -> usize;
}

/// A function space that also exposes its faces and their boundary indicators.
pub trait BoundaryFunctionSpace<T>: FunctionSpace<T>
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::GeometryDim, Self::FaceReferenceDim>,
{
    type FaceReferenceDim: DimName;

    fn num_faces(&self) -> usize;

    /// The indicator of a boundary face, or `None` for interior faces.
    fn face_boundary(&self, face_index: usize) -> Option<BoundaryIndicator>;

    fn face_dof_count(&self, face_index: usize) -> usize;

    fn populate_face_dofs(&self, dofs: &mut [usize], face_index: usize);

    fn face_dof_component(&self, face_index: usize, local_dof: usize) -> usize;

    /// Stores the physical support point of each local face dof.
    fn populate_face_support_points(&self, face_index: usize, points: &mut [OPoint<T, Self::GeometryDim>]);

    fn map_face_reference_coords(
        &self,
        face_index: usize,
        reference_coords: &OPoint<T, Self::FaceReferenceDim>,
    ) -> OPoint<T, Self::GeometryDim>;

    /// The ratio between the physical and reference measure of the face.
    fn face_measure_scale(&self, face_index: usize, reference_coords: &OPoint<T, Self::FaceReferenceDim>) -> T;

    fn populate_face_basis(
        &self,
        face_index: usize,
        basis_values: &mut [T],
        reference_coords: &OPoint<T, Self::FaceReferenceDim>,
    );
}
