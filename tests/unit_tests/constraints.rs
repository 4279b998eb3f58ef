use crate::unit_tests::unit_square_triangle_space;
use fetra::constraints::{AffineConstraints, ConstraintSet};
use fetra::field::ScalarField;
use fetra::projection::{L2Projection, ProjectionSettings};
use fetra::quadrature;
use fetra::TransferError;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, Point2};
use nalgebra_sparse::CsrMatrix;

#[test]
fn chained_constraints_are_not_implemented() {
    let mut constraints = AffineConstraints::new();
    constraints.add_line(1, vec![(0, 0.5), (2, 0.5)]).unwrap();

    // Constrained dof as master
    assert!(matches!(
        constraints.add_line(3, vec![(1, 1.0)]),
        Err(TransferError::NotImplemented(_))
    ));
    // Master as constrained dof
    assert!(matches!(
        constraints.add_line(0, vec![(4, 1.0)]),
        Err(TransferError::NotImplemented(_))
    ));
    // Self-reference
    assert!(matches!(
        constraints.add_line(5, vec![(5, 1.0)]),
        Err(TransferError::NotImplemented(_))
    ));
    assert_eq!(constraints.num_constraints(), 1);
    assert!(constraints.is_constrained(1));
}

#[test]
fn condensed_matrix_matches_dense_computation() {
    #[rustfmt::skip]
    let a_dense = DMatrix::from_row_slice(3, 3, &[
        4.0, 1.0, 0.5,
        1.0, 3.0, 1.0,
        0.5, 1.0, 2.0,
    ]);
    let mut constraints = AffineConstraints::new();
    constraints.add_line(1, vec![(0, 0.25), (2, 0.75)]).unwrap();

    let condensed = DMatrix::from(&constraints.condense_matrix(CsrMatrix::from(&a_dense)));

    // C maps the unconstrained dofs (0, 2) to all dofs
    #[rustfmt::skip]
    let c = DMatrix::from_row_slice(3, 3, &[
        1.0,  0.0, 0.0,
        0.25, 0.0, 0.75,
        0.0,  0.0, 1.0,
    ]);
    let mut expected = c.transpose() * &a_dense * &c;
    expected[(1, 1)] = a_dense[(1, 1)];
    assert_matrix_eq!(condensed, expected, comp = abs, tol = 1e-14);

    let mut b = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    constraints.condense_vector(&mut b);
    assert_matrix_eq!(b, DVector::from_column_slice(&[1.5, 0.0, 4.5]), comp = abs, tol = 1e-14);

    let mut x = DVector::from_column_slice(&[4.0, 100.0, 8.0]);
    constraints.distribute(&mut x);
    assert_matrix_eq!(x, DVector::from_column_slice(&[4.0, 7.0, 8.0]), comp = abs, tol = 1e-14);
}

#[test]
fn projection_honors_affine_constraints() {
    // On the 2x2 triangulation of the unit square, vertex 4 is the center
    let space = unit_square_triangle_space(2, 1);
    let mut constraints = AffineConstraints::new();
    constraints.add_line(4, vec![(0, 0.5), (8, 0.5)]).unwrap();

    let field = ScalarField::new(|x: &Point2<f64>| (x.x * x.y).exp());
    let settings = ProjectionSettings {
        tolerance: 1e-13,
        ..ProjectionSettings::default()
    };
    let projected = L2Projection::new(&space, &constraints)
        .with_settings(settings)
        .project(&quadrature::triangle(4).unwrap(), &field)
        .unwrap();

    assert_scalar_eq!(projected[4], 0.5 * (projected[0] + projected[8]), comp = abs, tol = 1e-14);
}
