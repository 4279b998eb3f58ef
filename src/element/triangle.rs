use itertools::Itertools;
use numeric_literals::replace_float_literals;

use crate::connectivity::{Tri3d2Connectivity, Tri3d3Connectivity};
use crate::element::{
    impl_reference_finite_element_for_fixed, populate_linear_simplex_mass, ElementConnectivity, FiniteElement,
    FixedNodesReferenceFiniteElement,
};
use crate::nalgebra::{
    distance, DMatrixViewMut, Matrix1x3, Matrix2, Matrix2x3, Matrix3, Matrix3x2, OPoint, Point2, Point3, Scalar, Vector2, U2,
    U3,
};
use crate::{Real, TransferError};

/// A linear triangle in two dimensions.
///
/// The reference element is chosen to be the triangle defined by the corners
/// (-1, -1), (1, -1), (-1, 1), matching the quadrature rules in
/// [`quadrature::triangle`](crate::quadrature::triangle).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 3],
}

/// A linear triangle embedded in three dimensions, used as the face of tetrahedra.
///
/// Shares the reference element of [`Tri3d2Element`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d3Element<T>
where
    T: Scalar,
{
    vertices: [Point3<T>; 3],
}

impl<T> Tri3d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 3] {
        &self.vertices
    }
}

impl<T> Tri3d3Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point3<T>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point3<T>; 3] {
        &self.vertices
    }
}

impl<T> Tri3d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)])
    }
}

#[rustfmt::skip]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn tri3_basis<T: Real>(xi: &Point2<T>) -> Matrix1x3<T> {
    Matrix1x3::from_row_slice(&[
        -0.5 * xi.x - 0.5 * xi.y,
        0.5 * xi.x + 0.5,
        0.5 * xi.y + 0.5
    ])
}

#[rustfmt::skip]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn tri3_gradients<T: Real>() -> Matrix2x3<T> {
    Matrix2x3::from_columns(&[
        Vector2::new(-0.5, -0.5),
        Vector2::new(0.5, 0.0),
        Vector2::new(0.0, 0.5)
    ])
}

impl<T> FixedNodesReferenceFiniteElement<T> for Tri3d2Element<T>
where
    T: Real,
{
    type NodalDim = U3;
    type ReferenceDim = U2;

    fn evaluate_basis(&self, xi: &Point2<T>) -> Matrix1x3<T> {
        tri3_basis(xi)
    }

    fn gradients(&self, _: &Point2<T>) -> Matrix2x3<T> {
        tri3_gradients()
    }

    fn reference_nodes(&self) -> Vec<Point2<T>> {
        Self::reference().vertices.to_vec()
    }
}

impl<T> FixedNodesReferenceFiniteElement<T> for Tri3d3Element<T>
where
    T: Real,
{
    type NodalDim = U3;
    type ReferenceDim = U2;

    fn evaluate_basis(&self, xi: &Point2<T>) -> Matrix1x3<T> {
        tri3_basis(xi)
    }

    fn gradients(&self, _: &Point2<T>) -> Matrix2x3<T> {
        tri3_gradients()
    }

    fn reference_nodes(&self) -> Vec<Point2<T>> {
        Tri3d2Element::reference().vertices.to_vec()
    }
}

impl_reference_finite_element_for_fixed!(Tri3d2Element<T>);
impl_reference_finite_element_for_fixed!(Tri3d3Element<T>);

impl<T> FiniteElement<T> for Tri3d2Element<T>
where
    T: Real,
{
    type GeometryDim = U2;

    const HAS_EXACT_MASS: bool = true;

    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        let X: Matrix2x3<T> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        let X: Matrix2x3<T> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        OPoint::from(&X * &N.transpose())
    }

    fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }

    fn measure_scale(&self, xi: &Point2<T>) -> T {
        self.reference_jacobian(xi).determinant().abs()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_exact_mass(&self, mass: DMatrixViewMut<T>) -> Result<(), TransferError> {
        // The reference triangle has area 2
        let area = 2.0 * self.measure_scale(&Point2::origin());
        populate_linear_simplex_mass(mass, area);
        Ok(())
    }
}

impl<T> FiniteElement<T> for Tri3d3Element<T>
where
    T: Real,
{
    type GeometryDim = U3;

    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix3x2<T> {
        let X = Matrix3::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point2<T>) -> Point3<T> {
        let X = Matrix3::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        OPoint::from(&X * &N.transpose())
    }

    fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }

    fn measure_scale(&self, xi: &Point2<T>) -> T {
        let j = self.reference_jacobian(xi);
        j.column(0).cross(&j.column(1)).norm()
    }
}

impl<T> ElementConnectivity<T> for Tri3d2Connectivity
where
    T: Real,
{
    type Element = Tri3d2Element<T>;
    type ReferenceDim = U2;
    type GeometryDim = U2;

    fn element(&self, vertices: &[Point2<T>]) -> Option<Self::Element> {
        let Self(indices) = self;
        let lookup_vertex = |local_index: usize| vertices.get(indices[local_index]).cloned();

        Some(Tri3d2Element::from_vertices([
            lookup_vertex(0)?,
            lookup_vertex(1)?,
            lookup_vertex(2)?,
        ]))
    }
}

impl<T> ElementConnectivity<T> for Tri3d3Connectivity
where
    T: Real,
{
    type Element = Tri3d3Element<T>;
    type ReferenceDim = U2;
    type GeometryDim = U3;

    fn element(&self, vertices: &[Point3<T>]) -> Option<Self::Element> {
        let Self(indices) = self;
        let lookup_vertex = |local_index: usize| vertices.get(indices[local_index]).cloned();

        Some(Tri3d3Element::from_vertices([
            lookup_vertex(0)?,
            lookup_vertex(1)?,
            lookup_vertex(2)?,
        ]))
    }
}
