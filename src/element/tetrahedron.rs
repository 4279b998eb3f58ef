use itertools::Itertools;
use numeric_literals::replace_float_literals;

use crate::connectivity::Tet4Connectivity;
use crate::element::{
    impl_reference_finite_element_for_fixed, populate_linear_simplex_mass, ElementConnectivity, FiniteElement,
    FixedNodesReferenceFiniteElement,
};
use crate::nalgebra::{distance, DMatrixViewMut, Matrix1x4, Matrix3, Matrix3x4, OPoint, Point3, Scalar, Vector3, U3, U4};
use crate::{Real, TransferError};

/// A linear tetrahedron.
///
/// The reference element has the corners
/// (-1, -1, -1), (1, -1, -1), (-1, 1, -1), (-1, -1, 1).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tet4Element<T>
where
    T: Scalar,
{
    vertices: [Point3<T>; 4],
}

impl<T> Tet4Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point3<T>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point3<T>; 4] {
        &self.vertices
    }
}

impl<T> Tet4Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference() -> Self {
        Self {
            vertices: [
                Point3::new(-1.0, -1.0, -1.0),
                Point3::new(1.0, -1.0, -1.0),
                Point3::new(-1.0, 1.0, -1.0),
                Point3::new(-1.0, -1.0, 1.0),
            ],
        }
    }
}

#[replace_float_literals(T::from_f64(literal).unwrap())]
impl<T> FixedNodesReferenceFiniteElement<T> for Tet4Element<T>
where
    T: Real,
{
    type ReferenceDim = U3;
    type NodalDim = U4;

    #[rustfmt::skip]
    fn evaluate_basis(&self, xi: &Point3<T>) -> Matrix1x4<T> {
        Matrix1x4::from_row_slice(&[
            -0.5 * xi.x - 0.5 * xi.y - 0.5 * xi.z - 0.5,
            0.5 * xi.x + 0.5,
            0.5 * xi.y + 0.5,
            0.5 * xi.z + 0.5
        ])
    }

    #[rustfmt::skip]
    fn gradients(&self, _reference_coords: &Point3<T>) -> Matrix3x4<T> {
        Matrix3x4::from_columns(&[
            Vector3::new(-0.5, -0.5, -0.5),
            Vector3::new(0.5, 0.0, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            Vector3::new(0.0, 0.0, 0.5)
        ])
    }

    fn reference_nodes(&self) -> Vec<Point3<T>> {
        Self::reference().vertices.to_vec()
    }
}

impl_reference_finite_element_for_fixed!(Tet4Element<T>);

impl<T> FiniteElement<T> for Tet4Element<T>
where
    T: Real,
{
    type GeometryDim = U3;

    const HAS_EXACT_MASS: bool = true;

    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point3<T>) -> Matrix3<T> {
        let X = Matrix3x4::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let X = Matrix3x4::from_fn(|i, j| self.vertices[j][i]);
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

    fn measure_scale(&self, xi: &Point3<T>) -> T {
        self.reference_jacobian(xi).determinant().abs()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_exact_mass(&self, mass: DMatrixViewMut<T>) -> Result<(), TransferError> {
        // The reference tetrahedron has volume 4/3
        let volume = self.measure_scale(&Point3::origin()) * 4.0 / 3.0;
        populate_linear_simplex_mass(mass, volume);
        Ok(())
    }
}

impl<T> ElementConnectivity<T> for Tet4Connectivity
where
    T: Real,
{
    type Element = Tet4Element<T>;
    type GeometryDim = U3;
    type ReferenceDim = U3;

    fn element(&self, vertices: &[OPoint<T, Self::GeometryDim>]) -> Option<Self::Element> {
        Some(Tet4Element {
            vertices: [
                *vertices.get(self.0[0])?,
                *vertices.get(self.0[1])?,
                *vertices.get(self.0[2])?,
                *vertices.get(self.0[3])?,
            ],
        })
    }
}
