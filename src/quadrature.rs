//! Quadrature rules on reference domains.
//!
//! A quadrature rule is any type implementing [`Quadrature`], most commonly a pair
//! `(weights, points)`. The rules provided here are defined on the reference domains used by
//! the elements in [`element`](crate::element):
//!
//! - the segment `[-1, 1]`,
//! - the quadrilateral `[-1, 1]^2`,
//! - the triangle with corners `(-1, -1), (1, -1), (-1, 1)`,
//! - the tetrahedron with corners `(-1, -1, -1), (1, -1, -1), (-1, 1, -1), (-1, -1, 1)`,
//! - the single point, which is the face of a segment.
use crate::nalgebra::{convert, Point1, Point2, Point3, RealField, U0, U1, U2, U3};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar};
use num::Zero;
use std::ops::{AddAssign, Mul};

/// Errors returned by quadrature construction.
pub use fenris_quadrature::Error as QuadratureError;

pub type QuadraturePair<T, D> = (Vec<T>, Vec<OPoint<T, D>>);
pub type QuadraturePair0d<T> = QuadraturePair<T, U0>;
pub type QuadraturePair1d<T> = QuadraturePair<T, U1>;
pub type QuadraturePair2d<T> = QuadraturePair<T, U2>;
pub type QuadraturePair3d<T> = QuadraturePair<T, U3>;

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T];
    fn points(&self) -> &[OPoint<T, D>];

    /// The number of quadrature points.
    fn len(&self) -> usize {
        self.weights().len()
    }

    fn is_empty(&self) -> bool {
        self.weights().is_empty()
    }

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<U, Function>(&self, f: Function) -> U
    where
        Function: Fn(&OPoint<T, D>) -> U,
        U: Zero + Mul<T, Output = U> + AddAssign<U>,
    {
        let mut integral = U::zero();
        for (w, p) in self.weights().iter().zip(self.points()) {
            integral += f(p) * w.clone();
        }
        integral
    }
}

impl<T, D, A, B> Quadrature<T, D> for (A, B)
where
    T: Scalar,
    D: DimName,
    A: AsRef<[T]>,
    B: AsRef<[OPoint<T, D>]>,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T] {
        self.0.as_ref()
    }

    fn points(&self) -> &[OPoint<T, D>] {
        self.1.as_ref()
    }
}

impl<T, D, X> Quadrature<T, D> for &X
where
    T: Scalar,
    D: DimName,
    X: Quadrature<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T] {
        X::weights(self)
    }

    fn points(&self) -> &[OPoint<T, D>] {
        X::points(self)
    }
}

/// The trivial rule on a single point with unit weight.
///
/// This is the quadrature rule for the faces of one-dimensional elements.
pub fn point<T: RealField>() -> QuadraturePair0d<T> {
    (vec![T::one()], vec![OPoint::origin()])
}

/// Gauss-Legendre quadrature on `[-1, 1]` with the given number of points.
pub fn gauss<T: RealField>(num_points: usize) -> QuadraturePair1d<T> {
    let (weights, points) = fenris_quadrature::univariate::gauss(num_points);
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point1::from).map(convert).collect();
    (weights, points)
}

/// Tensor-product Gauss quadrature on `[-1, 1]^2`.
pub fn quadrilateral_gauss<T: RealField>(num_points_per_dim: usize) -> QuadraturePair2d<T> {
    let (weights1d, points1d) = fenris_quadrature::univariate::gauss(num_points_per_dim);
    let mut weights = Vec::with_capacity(weights1d.len() * weights1d.len());
    let mut points = Vec::with_capacity(weights1d.len() * weights1d.len());

    for (&wx, &[x]) in weights1d.iter().zip(&points1d) {
        for (&wy, &[y]) in weights1d.iter().zip(&points1d) {
            weights.push(convert(wx * wy));
            points.push(convert(Point2::new(x, y)));
        }
    }

    (weights, points)
}

/// A quadrature rule on the reference triangle exact for polynomials of total degree `strength`.
pub fn triangle<T: RealField>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
    let (weights, points) = fenris_quadrature::polyquad::triangle(strength)?;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point2::from).map(convert).collect();
    Ok((weights, points))
}

/// A quadrature rule on the reference tetrahedron exact for polynomials of total degree `strength`.
pub fn tetrahedron<T: RealField>(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError> {
    let (weights, points) = fenris_quadrature::polyquad::tetrahedron(strength)?;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point3::from).map(convert).collect();
    Ok((weights, points))
}
