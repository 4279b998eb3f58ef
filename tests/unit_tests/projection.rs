use crate::unit_tests::{interval_space, unit_square_triangle_space};
use fetra::field::{ConstantField, ScalarField, VectorField};
use fetra::interpolate::interpolate;
use fetra::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use fetra::projection::{L2Projection, ProjectionSettings};
use fetra::quadrature;
use fetra::space::{FunctionSpace, LagrangeSpace};
use fetra::TransferError;
use fetra_sparse::SolveErrorKind;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{Point1, Point2};

fn settings() -> ProjectionSettings<f64> {
    ProjectionSettings {
        tolerance: 1e-13,
        ..ProjectionSettings::default()
    }
}

#[test]
fn projection_settings_defaults() {
    let settings = ProjectionSettings::<f64>::default();
    assert_eq!(settings.relaxation, 1.2);
    assert_eq!(settings.tolerance, 1e-16);
    assert_eq!(settings.max_iterations, 1000);
}

#[test]
fn partially_specified_settings_fall_back_to_defaults() {
    let settings: ProjectionSettings<f64> = serde_json::from_str(r#"{ "max_iterations": 20 }"#).unwrap();
    assert_eq!(settings.max_iterations, 20);
    assert_eq!(settings.relaxation, 1.2);
    assert_eq!(settings.tolerance, 1e-16);
}

#[test]
fn projection_of_interpolant_reproduces_interpolant_on_triangles() {
    let space = unit_square_triangle_space(4, 1);
    let field = ScalarField::new(|x: &Point2<f64>| 1.0 + 2.0 * x.x - 3.0 * x.y);
    let interpolant = interpolate(&space, &field).unwrap();

    let projection = L2Projection::new(&space, &()).with_settings(settings());
    let projected = projection
        .project(&quadrature::triangle(2).unwrap(), &field)
        .unwrap();

    assert_matrix_eq!(projected, interpolant, comp = abs, tol = 1e-10);
}

#[test]
fn projection_with_default_settings_converges() {
    let field = ScalarField::new(|x: &Point2<f64>| 1.0 + 2.0 * x.x - 3.0 * x.y);
    for cells_per_dim in [2, 8, 32] {
        let space = unit_square_triangle_space(cells_per_dim, 1);
        let interpolant = interpolate(&space, &field).unwrap();

        let projected = L2Projection::new(&space, &())
            .project(&quadrature::triangle(2).unwrap(), &field)
            .unwrap();

        assert_matrix_eq!(projected, interpolant, comp = abs, tol = 1e-12);
    }
}

#[test]
fn projection_of_interpolant_reproduces_interpolant_on_quads() {
    // Quadrilaterals have no exact mass matrix, so this goes through quadrature assembly
    let space = LagrangeSpace::new(create_unit_square_uniform_quad_mesh_2d::<f64>(3), 2);
    assert!(!space.supports_exact_mass());
    let field = VectorField::new(2, |x: &Point2<f64>, values: &mut [f64]| {
        values[0] = x.x * x.y;
        values[1] = 2.0 - x.y;
    });
    let interpolant = interpolate(&space, &field).unwrap();

    let projected = L2Projection::new(&space, &())
        .with_settings(settings())
        .project(&quadrature::quadrilateral_gauss(3), &field)
        .unwrap();

    assert_matrix_eq!(projected, interpolant, comp = abs, tol = 1e-10);
}

#[test]
fn projection_with_zero_boundary_prescribes_zero_on_boundary() {
    let space = unit_square_triangle_space(4, 1);
    let projected = L2Projection::new(&space, &())
        .with_settings(settings())
        .project_with_zero_boundary(&quadrature::triangle(2).unwrap(), &ConstantField::scalar(1.0))
        .unwrap();

    let boundary_vertices = space.mesh().find_boundary_vertices();
    assert_eq!(boundary_vertices.len(), 16);
    let mut interior_sum = 0.0;
    for v in 0..space.mesh().vertices().len() {
        if boundary_vertices.contains(&v) {
            assert_eq!(projected[v], 0.0);
        } else {
            assert_ne!(projected[v], 0.0);
            interior_sum += projected[v];
        }
    }
    assert!(interior_sum > 0.0);
}

#[test]
fn projection_with_boundary_trace_reproduces_linear_field() {
    let space = unit_square_triangle_space(3, 1);
    let field = ScalarField::new(|x: &Point2<f64>| 2.0 * x.x + x.y);
    let interpolant = interpolate(&space, &field).unwrap();

    let projected = L2Projection::new(&space, &())
        .with_settings(settings())
        .project_with_boundary_trace(&quadrature::triangle(2).unwrap(), &quadrature::gauss(2), &field)
        .unwrap();

    assert_matrix_eq!(projected, interpolant, comp = abs, tol = 1e-10);
}

#[test]
fn projection_preserves_mean_of_field() {
    // The constant function is in the space, so the integral of the projection equals the
    // integral of the field
    let space = unit_square_triangle_space(4, 1);
    let field = ScalarField::new(|x: &Point2<f64>| x.x * x.x + x.y);
    let projected = L2Projection::new(&space, &())
        .with_settings(settings())
        .project(&quadrature::triangle(4).unwrap(), &field)
        .unwrap();

    let mass = fetra::assembly::assemble_mass_matrix(&space, &quadrature::triangle(2).unwrap()).unwrap();
    let ones = nalgebra::DVector::repeat(space.num_dofs(), 1.0);
    let integral = (&mass * &projected).dot(&ones);
    assert_scalar_eq!(integral, 1.0 / 3.0 + 1.0 / 2.0, comp = abs, tol = 1e-10);
}

#[test]
fn projection_in_one_dimension_is_not_implemented() {
    let space = interval_space(0.0, 1.0, 4, 1);
    let field = ScalarField::new(|x: &Point1<f64>| x.x);
    let result = L2Projection::new(&space, &()).project(&quadrature::gauss(2), &field);
    assert!(matches!(result, Err(TransferError::NotImplemented(_))));
}

#[test]
fn projection_rejects_component_mismatch() {
    let space = unit_square_triangle_space(2, 2);
    let result = L2Projection::new(&space, &()).project(&quadrature::triangle(2).unwrap(), &ConstantField::scalar(1.0));
    assert!(matches!(
        result,
        Err(TransferError::ComponentMismatch { expected: 2, actual: 1 })
    ));
}

#[test]
fn iteration_cap_surfaces_as_nonconvergence() {
    let space = unit_square_triangle_space(4, 1);
    let field = ScalarField::new(|x: &Point2<f64>| (3.0 * x.x).sin() * x.y);
    let settings = ProjectionSettings {
        max_iterations: 1,
        ..settings()
    };
    let result = L2Projection::new(&space, &())
        .with_settings(settings)
        .project(&quadrature::triangle(4).unwrap(), &field);

    match result {
        Err(TransferError::SolverNonconvergence(err)) => {
            assert!(matches!(err.kind, SolveErrorKind::MaxIterationsReached { max_iter: 1 }));
        }
        other => panic!("Expected nonconvergence, got {:?}", other),
    }
}

#[test]
fn invalid_relaxation_is_reported() {
    let space = unit_square_triangle_space(2, 1);
    let settings = ProjectionSettings {
        relaxation: 2.5,
        ..settings()
    };
    let result = L2Projection::new(&space, &())
        .with_settings(settings)
        .project(&quadrature::triangle(2).unwrap(), &ConstantField::scalar(1.0));
    assert!(matches!(result, Err(TransferError::Preconditioner(_))));
}
