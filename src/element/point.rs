use crate::connectivity::PointConnectivity;
use crate::element::{
    impl_reference_finite_element_for_fixed, ElementConnectivity, FiniteElement, FixedNodesReferenceFiniteElement,
};
use crate::nalgebra::{OMatrix, OPoint, Point1, Scalar, U0, U1};
use crate::Real;

/// A single vertex in one dimension, the face of a one-dimensional cell.
///
/// The reference domain is zero-dimensional and consists of a single point, at which the
/// only basis function has the value one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PointElement<T>
where
    T: Scalar,
{
    vertex: Point1<T>,
}

impl<T: Scalar> PointElement<T> {
    pub fn from_vertex(vertex: Point1<T>) -> Self {
        Self { vertex }
    }

    pub fn vertex(&self) -> &Point1<T> {
        &self.vertex
    }
}

impl<T> FixedNodesReferenceFiniteElement<T> for PointElement<T>
where
    T: Real,
{
    type ReferenceDim = U0;
    type NodalDim = U1;

    fn evaluate_basis(&self, _xi: &OPoint<T, U0>) -> OMatrix<T, U1, U1> {
        OMatrix::<T, U1, U1>::new(T::one())
    }

    fn gradients(&self, _xi: &OPoint<T, U0>) -> OMatrix<T, U0, U1> {
        OMatrix::<T, U0, U1>::zeros()
    }

    fn reference_nodes(&self) -> Vec<OPoint<T, U0>> {
        vec![OPoint::origin()]
    }
}

impl_reference_finite_element_for_fixed!(PointElement<T>);

impl<T> FiniteElement<T> for PointElement<T>
where
    T: Real,
{
    type GeometryDim = U1;

    fn reference_jacobian(&self, _xi: &OPoint<T, U0>) -> OMatrix<T, U1, U0> {
        OMatrix::<T, U1, U0>::zeros()
    }

    fn map_reference_coords(&self, _xi: &OPoint<T, U0>) -> Point1<T> {
        self.vertex
    }

    fn diameter(&self) -> T {
        T::zero()
    }

    fn measure_scale(&self, _xi: &OPoint<T, U0>) -> T {
        T::one()
    }
}

impl<T> ElementConnectivity<T> for PointConnectivity
where
    T: Real,
{
    type Element = PointElement<T>;
    type GeometryDim = U1;
    type ReferenceDim = U0;

    fn element(&self, vertices: &[Point1<T>]) -> Option<Self::Element> {
        vertices.get(self.0[0]).map(|v| PointElement::from_vertex(*v))
    }
}
