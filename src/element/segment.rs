use crate::connectivity::{Segment2d1Connectivity, Segment2d2Connectivity};
use crate::element::{
    impl_reference_finite_element_for_fixed, populate_linear_simplex_mass, ElementConnectivity, FiniteElement,
    FixedNodesReferenceFiniteElement,
};
use crate::nalgebra::{DMatrixViewMut, OMatrix, OPoint, Point1, Point2, Scalar, Vector1, Vector2, U1, U2};
use crate::{Real, TransferError};
use nalgebra::point;
use numeric_literals::replace_float_literals;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// A segment in one dimension.
pub struct Segment2d1Element<T>
where
    T: Scalar,
{
    vertices: [Point1<T>; 2],
}

impl<T: Scalar> Segment2d1Element<T> {
    pub fn from_vertices(vertices: [Point1<T>; 2]) -> Self {
        Self { vertices }
    }

    pub fn from_interval(interval: [T; 2]) -> Self {
        Self::from_vertices([point!(interval[0].clone()), point!(interval[1].clone())])
    }

    pub fn vertices(&self) -> &[Point1<T>; 2] {
        &self.vertices
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// A line segment embedded in two dimensions, used as the face of two-dimensional cells.
pub struct Segment2d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 2],
}

impl<T: Scalar> Segment2d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 2]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 2] {
        &self.vertices
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn segment2_basis<T: Real>(xi: T) -> OMatrix<T, U1, U2> {
    let phi_1 = (1.0 - xi) / 2.0;
    let phi_2 = (1.0 + xi) / 2.0;
    OMatrix::<_, U1, U2>::new(phi_1, phi_2)
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn segment2_gradients<T: Real>() -> OMatrix<T, U1, U2> {
    OMatrix::<_, U1, U2>::new(-0.5, 0.5)
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn segment2_reference_nodes<T: Real>() -> Vec<Point1<T>> {
    vec![Point1::new(-1.0), Point1::new(1.0)]
}

impl<T> FixedNodesReferenceFiniteElement<T> for Segment2d1Element<T>
where
    T: Real,
{
    type NodalDim = U2;
    type ReferenceDim = U1;

    fn evaluate_basis(&self, xi: &Point1<T>) -> OMatrix<T, U1, U2> {
        segment2_basis(xi[0])
    }

    fn gradients(&self, _xi: &Point1<T>) -> OMatrix<T, U1, U2> {
        segment2_gradients()
    }

    fn reference_nodes(&self) -> Vec<Point1<T>> {
        segment2_reference_nodes()
    }
}

impl<T> FixedNodesReferenceFiniteElement<T> for Segment2d2Element<T>
where
    T: Real,
{
    type NodalDim = U2;
    type ReferenceDim = U1;

    fn evaluate_basis(&self, xi: &Point1<T>) -> OMatrix<T, U1, U2> {
        segment2_basis(xi[0])
    }

    fn gradients(&self, _xi: &Point1<T>) -> OMatrix<T, U1, U2> {
        segment2_gradients()
    }

    fn reference_nodes(&self) -> Vec<Point1<T>> {
        segment2_reference_nodes()
    }
}

impl_reference_finite_element_for_fixed!(Segment2d1Element<T>);
impl_reference_finite_element_for_fixed!(Segment2d2Element<T>);

impl<T> FiniteElement<T> for Segment2d1Element<T>
where
    T: Real,
{
    type GeometryDim = U1;

    const HAS_EXACT_MASS: bool = true;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference_jacobian(&self, _xi: &Point1<T>) -> Vector1<T> {
        let a = &self.vertices[0].coords;
        let b = &self.vertices[1].coords;
        (b - a) / 2.0
    }

    fn map_reference_coords(&self, xi: &Point1<T>) -> Point1<T> {
        let a = &self.vertices[0].coords;
        let b = &self.vertices[1].coords;
        let phi = self.evaluate_basis(xi);
        OPoint::from(a * phi[0] + b * phi[1])
    }

    fn diameter(&self) -> T {
        (self.vertices[1] - self.vertices[0]).norm()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn measure_scale(&self, _xi: &Point1<T>) -> T {
        self.diameter() / 2.0
    }

    fn populate_exact_mass(&self, mass: DMatrixViewMut<T>) -> Result<(), TransferError> {
        populate_linear_simplex_mass(mass, self.diameter());
        Ok(())
    }
}

impl<T> FiniteElement<T> for Segment2d2Element<T>
where
    T: Real,
{
    type GeometryDim = U2;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference_jacobian(&self, _xi: &Point1<T>) -> Vector2<T> {
        let a = &self.vertices[0].coords;
        let b = &self.vertices[1].coords;
        (b - a) / 2.0
    }

    fn map_reference_coords(&self, xi: &Point1<T>) -> Point2<T> {
        let a = &self.vertices[0].coords;
        let b = &self.vertices[1].coords;
        let phi = self.evaluate_basis(xi);
        OPoint::from(a * phi[0] + b * phi[1])
    }

    fn diameter(&self) -> T {
        (self.vertices[1] - self.vertices[0]).norm()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn measure_scale(&self, _xi: &Point1<T>) -> T {
        self.diameter() / 2.0
    }
}

impl<T> ElementConnectivity<T> for Segment2d1Connectivity
where
    T: Real,
{
    type Element = Segment2d1Element<T>;
    type GeometryDim = U1;
    type ReferenceDim = U1;

    fn element(&self, vertices: &[Point1<T>]) -> Option<Self::Element> {
        let a = *vertices.get(self.0[0])?;
        let b = *vertices.get(self.0[1])?;
        Some(Segment2d1Element::from_vertices([a, b]))
    }
}

impl<T> ElementConnectivity<T> for Segment2d2Connectivity
where
    T: Real,
{
    type Element = Segment2d2Element<T>;
    type ReferenceDim = U1;
    type GeometryDim = U2;

    fn element(&self, vertices: &[Point2<T>]) -> Option<Self::Element> {
        let a = *vertices.get(self.0[0])?;
        let b = *vertices.get(self.0[1])?;
        Some(Segment2d2Element::from_vertices([a, b]))
    }
}
