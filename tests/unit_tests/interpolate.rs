use crate::unit_tests::{interval_space, unit_square_triangle_space};
use eyre::eyre;
use fetra::field::{ConstantField, ScalarField, VectorField};
use fetra::interpolate::{interpolate, interpolate_into, transfer_between_spaces, RepresentativeSupportPoints};
use fetra::space::FunctionSpace;
use fetra::TransferError;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, Point1, Point2};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn constant_field_gives_constant_coefficients() {
    let space = unit_square_triangle_space(3, 1);
    let u = interpolate(&space, &ConstantField::scalar(3.5)).unwrap();
    assert_eq!(u.len(), 16);
    assert!(u.iter().all(|&u_i| u_i == 3.5));
}

#[test]
fn linear_field_on_interval_reproduces_vertex_values() {
    let space = interval_space(0.0, 4.0, 4, 1);
    let field = ScalarField::new(|x: &Point1<f64>| x.x);
    let u = interpolate(&space, &field).unwrap();
    assert_matrix_eq!(u, DVector::from_column_slice(&[0.0, 1.0, 2.0, 3.0, 4.0]), comp = abs, tol = 1e-14);
}

#[test]
fn vector_field_components_are_interleaved() {
    let space = unit_square_triangle_space(2, 2);
    let field = VectorField::new(2, |x: &Point2<f64>, values: &mut [f64]| {
        values[0] = x.x;
        values[1] = 10.0 + x.y;
    });
    let u = interpolate(&space, &field).unwrap();

    let vertices = space.mesh().vertices();
    assert_eq!(u.len(), 2 * vertices.len());
    for (v, vertex) in vertices.iter().enumerate() {
        assert_eq!(u[space.vertex_dof(v, 0)], vertex.x);
        assert_eq!(u[space.vertex_dof(v, 1)], 10.0 + vertex.y);
    }
}

#[test]
fn field_is_evaluated_once_per_cell_support_point() {
    // Two triangles with three vertices each, while the space has 3 components per vertex
    let space = unit_square_triangle_space(1, 3);
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluations);
    let field = VectorField::new(3, move |x: &Point2<f64>, values: &mut [f64]| {
        counter.fetch_add(1, Ordering::Relaxed);
        values[0] = x.x;
        values[1] = x.y;
        values[2] = x.x + x.y;
    });

    let u = interpolate(&space, &field).unwrap();

    assert_eq!(u.len(), 12);
    assert_eq!(evaluations.load(Ordering::Relaxed), 6);
    for (v, vertex) in space.mesh().vertices().iter().enumerate() {
        assert_eq!(u[space.vertex_dof(v, 2)], vertex.x + vertex.y);
    }
}

#[test]
fn scalar_field_is_evaluated_once_per_cell_support_point() {
    let space = interval_space(0.0, 4.0, 4, 1);
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluations);
    let field = ScalarField::new(move |x: &Point1<f64>| {
        counter.fetch_add(1, Ordering::Relaxed);
        2.0 * x.x
    });

    interpolate(&space, &field).unwrap();

    assert_eq!(evaluations.load(Ordering::Relaxed), 8);
}

#[test]
fn component_mismatch_is_rejected() {
    let space = unit_square_triangle_space(1, 2);
    let result = interpolate(&space, &ConstantField::scalar(1.0));
    assert!(matches!(
        result,
        Err(TransferError::ComponentMismatch { expected: 2, actual: 1 })
    ));
}

#[test]
fn wrong_vector_length_is_rejected() {
    let space = unit_square_triangle_space(1, 1);
    let mut u = DVector::zeros(3);
    let result = interpolate_into(&space, &ConstantField::scalar(1.0), &mut u);
    assert!(matches!(
        result,
        Err(TransferError::DimensionMismatch { expected: 4, actual: 3 })
    ));
}

#[test]
fn failing_field_leaves_coefficients_untouched() {
    let space = unit_square_triangle_space(2, 1);
    let field = ScalarField::fallible(|x: &Point2<f64>| {
        if x.x > 0.75 {
            Err(eyre!("outside of data range"))
        } else {
            Ok(1.0)
        }
    });

    let mut u = DVector::from_element(space.num_dofs(), -2.0);
    let result = interpolate_into(&space, &field, &mut u);
    assert!(matches!(result, Err(TransferError::Field(_))));
    assert!(u.iter().all(|&u_i| u_i == -2.0));
}

#[test]
fn transfer_with_identity_copies_coefficients() {
    let source = unit_square_triangle_space(2, 1);
    let target = unit_square_triangle_space(2, 1);
    let u_source = DVector::from_fn(source.num_dofs(), |i, _| i as f64);
    let mut u_target = DVector::zeros(target.num_dofs());

    transfer_between_spaces(&source, &target, &DMatrix::identity(3, 3), &u_source, &mut u_target).unwrap();
    assert_eq!(u_target, u_source);
}

#[test]
fn transfer_rejects_mismatched_element_counts() {
    let source = unit_square_triangle_space(2, 1);
    let target = unit_square_triangle_space(1, 1);
    let u_source = DVector::zeros(source.num_dofs());
    let mut u_target = DVector::zeros(target.num_dofs());

    let result = transfer_between_spaces(&source, &target, &DMatrix::identity(3, 3), &u_source, &mut u_target);
    assert!(matches!(
        result,
        Err(TransferError::DimensionMismatch { expected: 8, actual: 2 })
    ));
}

#[test]
fn duplicated_support_points_share_representative() {
    let points = [0, 0, 1, 1, 2, 2];
    let reps = RepresentativeSupportPoints::from_support_points(&points);
    assert_eq!(reps.representatives(), &[0, 2, 4]);
    assert_eq!(reps.dof_to_representative(), &[0, 0, 1, 1, 2, 2]);
}

proptest! {
    #[test]
    fn deduplication_reproduces_points(points in vec(0..4u8, 0..20)) {
        let reps = RepresentativeSupportPoints::from_support_points(&points);

        prop_assert!(reps.num_representatives() <= points.len());
        prop_assert_eq!(reps.dof_to_representative().len(), points.len());

        let expanded: Vec<_> = reps
            .dof_to_representative()
            .iter()
            .map(|&r| points[reps.representatives()[r]])
            .collect();
        prop_assert_eq!(&expanded, &points);

        // Representatives are first occurrences
        for &rep in reps.representatives() {
            prop_assert!(!points[..rep].contains(&points[rep]));
        }
    }
}
