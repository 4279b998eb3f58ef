//! Finite elements: reference basis functions and reference-to-physical maps.
//!
//! All elements here are linear Lagrange elements. Cell elements have coinciding reference and
//! geometry dimensions, while face elements (points, segments in 2D, triangles in 3D) are
//! embedded in a space of one dimension higher.
use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::TransferError;
use nalgebra::{DMatrixViewMut, DefaultAllocator, DimName, Dyn, MatrixViewMut, OMatrix, OPoint, Scalar, U1};
use std::fmt::Debug;

mod point;
mod quadrilateral;
mod segment;
mod tetrahedron;
mod triangle;

pub use point::*;
pub use quadrilateral::*;
pub use segment::*;
pub use tetrahedron::*;
pub use triangle::*;

pub trait ReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: DimAllocator<T, Self::ReferenceDim>,
{
    type ReferenceDim: DimName;

    /// Returns the number of nodes in the element.
    fn num_nodes(&self) -> usize;

    /// Stores the reference coordinates of each node, in node order.
    ///
    /// # Panics
    ///
    /// Panics if the output does not have exactly one entry per node.
    fn populate_reference_nodes(&self, nodes: &mut [OPoint<T, Self::ReferenceDim>]);

    /// Evaluates each basis function at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the output does not have exactly one entry per node.
    fn populate_basis(&self, basis_values: &mut [T], reference_coords: &OPoint<T, Self::ReferenceDim>);

    /// Stores the reference gradient of each basis function in the corresponding column.
    fn populate_basis_gradients(
        &self,
        basis_gradients: MatrixViewMut<T, Self::ReferenceDim, Dyn>,
        reference_coords: &OPoint<T, Self::ReferenceDim>,
    );
}

/// Reference finite elements with a number of nodes fixed at compile-time.
pub trait FixedNodesReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: DimAllocator<T, Self::ReferenceDim>
        + BiDimAllocator<T, Self::ReferenceDim, Self::NodalDim>
        + nalgebra::allocator::Allocator<T, U1, Self::NodalDim>,
{
    type ReferenceDim: DimName;
    type NodalDim: DimName;

    /// Evaluates each basis function at the given reference coordinates. The result is given
    /// in a row vector where each entry is the value of the corresponding basis function.
    fn evaluate_basis(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OMatrix<T, U1, Self::NodalDim>;

    /// Returns a matrix whose columns are the reference gradients of each basis function.
    fn gradients(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OMatrix<T, Self::ReferenceDim, Self::NodalDim>;

    /// The reference coordinates of the nodes, in node order.
    fn reference_nodes(&self) -> Vec<OPoint<T, Self::ReferenceDim>>;
}

/// Implements `ReferenceFiniteElement` for an element that implements
/// `FixedNodesReferenceFiniteElement`.
macro_rules! impl_reference_finite_element_for_fixed {
    ($element:ty) => {
        impl<T> $crate::element::ReferenceFiniteElement<T> for $element
        where
            T: $crate::Real,
        {
            type ReferenceDim = <Self as $crate::element::FixedNodesReferenceFiniteElement<T>>::ReferenceDim;

            fn num_nodes(&self) -> usize {
                use nalgebra::DimName;
                <Self as $crate::element::FixedNodesReferenceFiniteElement<T>>::NodalDim::dim()
            }

            fn populate_reference_nodes(&self, nodes: &mut [nalgebra::OPoint<T, Self::ReferenceDim>]) {
                let reference_nodes =
                    <Self as $crate::element::FixedNodesReferenceFiniteElement<T>>::reference_nodes(self);
                nodes.clone_from_slice(&reference_nodes);
            }

            fn populate_basis(&self, result: &mut [T], reference_coords: &nalgebra::OPoint<T, Self::ReferenceDim>) {
                let basis_values = <Self as $crate::element::FixedNodesReferenceFiniteElement<T>>::evaluate_basis(
                    self,
                    reference_coords,
                );
                result.clone_from_slice(basis_values.as_slice());
            }

            fn populate_basis_gradients(
                &self,
                mut result: nalgebra::MatrixViewMut<T, Self::ReferenceDim, nalgebra::Dyn>,
                reference_coords: &nalgebra::OPoint<T, Self::ReferenceDim>,
            ) {
                let gradients =
                    <Self as $crate::element::FixedNodesReferenceFiniteElement<T>>::gradients(self, reference_coords);
                result.copy_from(&gradients);
            }
        }
    };
}

pub(crate) use impl_reference_finite_element_for_fixed;

pub trait FiniteElement<T>: ReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::GeometryDim, Self::ReferenceDim>,
{
    type GeometryDim: DimName;

    /// Whether [`populate_exact_mass`](Self::populate_exact_mass) is available for this element.
    const HAS_EXACT_MASS: bool = false;

    /// Compute the Jacobian of the transformation from the reference element to the given
    /// element at the given reference coordinates.
    fn reference_jacobian(
        &self,
        reference_coords: &OPoint<T, Self::ReferenceDim>,
    ) -> OMatrix<T, Self::GeometryDim, Self::ReferenceDim>;

    /// Maps reference coordinates to physical coordinates in the element.
    fn map_reference_coords(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OPoint<T, Self::GeometryDim>;

    /// The diameter of the finite element, i.e. the largest distance between two of its points.
    fn diameter(&self) -> T;

    /// The ratio between the physical and the reference measure at the given point.
    ///
    /// For cells this is the absolute value of the Jacobian determinant. For faces it is
    /// the corresponding surface (or length) element.
    fn measure_scale(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> T;

    /// Stores the exact element mass matrix `M_IJ = ∫_K φ_I φ_J dx` in the output.
    ///
    /// Only available if [`HAS_EXACT_MASS`](Self::HAS_EXACT_MASS) is `true`.
    fn populate_exact_mass(&self, _mass: DMatrixViewMut<T>) -> Result<(), TransferError> {
        Err(TransferError::NotImplemented("exact element mass matrix"))
    }
}

pub trait ElementConnectivity<T>: Debug + crate::connectivity::Connectivity
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::GeometryDim, Self::ReferenceDim>,
{
    type Element: FiniteElement<T, GeometryDim = Self::GeometryDim, ReferenceDim = Self::ReferenceDim>;
    type GeometryDim: DimName;
    type ReferenceDim: DimName;

    /// Returns the finite element associated with this connectivity.
    ///
    /// The vertices passed in should be the collection of *all* vertices in the mesh.
    fn element(&self, vertices: &[OPoint<T, Self::GeometryDim>]) -> Option<Self::Element>;
}

/// Fills the exact mass matrix of a linear simplex with the given volume.
///
/// For linear Lagrange basis functions on a `d`-simplex `K`,
/// `∫_K φ_I φ_J dx = |K| (1 + δ_IJ) / ((d + 1)(d + 2))`.
pub(crate) fn populate_linear_simplex_mass<T: crate::Real>(mut mass: DMatrixViewMut<T>, volume: T) {
    let n = mass.nrows();
    assert_eq!(n, mass.ncols(), "Mass matrix must be square");
    let d = T::from_usize(n - 1).expect("Simplex dimension must fit in T");
    let one = T::one();
    let two = one + one;
    let off_diagonal = volume / ((d + one) * (d + two));
    mass.fill(off_diagonal);
    mass.fill_diagonal(two * off_diagonal);
}
