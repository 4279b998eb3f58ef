use crate::unit_tests::{interval_space, unit_square_triangle_space};
use fetra::assembly::{
    apply_boundary_values, assemble_boundary_mass_system, assemble_exact_mass_matrix, assemble_load_vector,
    assemble_mass_matrix, assemble_mass_matrix_by_quadrature,
};
use fetra::boundary::{boundary_dof_mapping, BoundaryFunctions, PrescribedValues};
use fetra::field::{ConstantField, Field};
use fetra::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use fetra::mesh::BoundaryIndicator;
use fetra::mesh::procedural::{create_unit_box_uniform_tet_mesh_3d, create_unit_square_uniform_quad_mesh_2d};
use fetra::quadrature;
use fetra::space::{FunctionSpace, LagrangeSpace};
use fetra::TransferError;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, U2};
use std::collections::BTreeSet;
use nalgebra_sparse::CsrMatrix;
use util::laplacian_1d;

#[test]
fn exact_and_quadrature_mass_matrices_agree_on_triangles() {
    let space = unit_square_triangle_space(3, 2);
    assert!(space.supports_exact_mass());
    let exact = DMatrix::from(&assemble_exact_mass_matrix(&space).unwrap());
    let by_quadrature =
        DMatrix::from(&assemble_mass_matrix_by_quadrature(&space, &quadrature::triangle(2).unwrap()).unwrap());
    assert_matrix_eq!(exact, by_quadrature, comp = abs, tol = 1e-14);
}

#[test]
fn exact_and_quadrature_mass_matrices_agree_on_tetrahedra() {
    let space = LagrangeSpace::new(create_unit_box_uniform_tet_mesh_3d::<f64>(2), 1);
    let exact = DMatrix::from(&assemble_exact_mass_matrix(&space).unwrap());
    let by_quadrature =
        DMatrix::from(&assemble_mass_matrix_by_quadrature(&space, &quadrature::tetrahedron(2).unwrap()).unwrap());
    assert_matrix_eq!(exact, by_quadrature, comp = abs, tol = 1e-14);
}

#[test]
fn interval_mass_matrix_is_tridiagonal_with_summed_contributions() {
    let space = interval_space(0.0, 4.0, 4, 1);
    assert_eq!(space.max_couplings_per_dof(), 3);
    let mass = assemble_exact_mass_matrix(&space).unwrap();

    for row in mass.row_iter() {
        assert!(row.nnz() <= space.max_couplings_per_dof());
        assert!(row.col_indices().windows(2).all(|w| w[0] < w[1]));
    }

    let (a, b, c) = (1.0 / 3.0, 2.0 / 3.0, 1.0 / 6.0);
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(5, 5, &[
        a,   c,   0.0, 0.0, 0.0,
        c,   b,   c,   0.0, 0.0,
        0.0, c,   b,   c,   0.0,
        0.0, 0.0, c,   b,   c,
        0.0, 0.0, 0.0, c,   a,
    ]);
    assert_eq!(mass.nnz(), 13);
    assert_matrix_eq!(DMatrix::from(&mass), expected, comp = abs, tol = 1e-14);
}

#[test]
fn boundary_mass_system_rows_respect_coupling_bound() {
    let mut mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2);
    let left = BoundaryIndicator::new(1).unwrap();
    mesh.assign_boundary_indicators(|centroid| {
        if centroid.x == 0.0 {
            left
        } else {
            BoundaryIndicator::default()
        }
    });
    let space = LagrangeSpace::new(mesh, 1);
    let mapping = boundary_dof_mapping(&space, &[left].into_iter().collect::<BTreeSet<_>>());
    let field = ConstantField::scalar(1.0);
    let functions: BoundaryFunctions<f64, U2> = [(left, &field as &(dyn Field<f64, U2> + Sync))]
        .into_iter()
        .collect();

    let (mass, load) = assemble_boundary_mass_system(&space, &mapping, &functions, &quadrature::gauss(2)).unwrap();

    assert_eq!(mass.nrows(), 3);
    // Two segments along the left edge give a 3x3 tridiagonal matrix
    assert_eq!(mass.nnz(), 7);
    for row in mass.row_iter() {
        assert!(row.nnz() <= mapping.max_couplings());
    }
    assert_scalar_eq!(mass.values().iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(load.sum(), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn mass_matrix_entries_sum_to_domain_measure() {
    let space = LagrangeSpace::new(create_unit_square_uniform_quad_mesh_2d::<f64>(3), 1);
    let mass = assemble_mass_matrix(&space, &quadrature::quadrilateral_gauss(2)).unwrap();
    assert_eq!(mass.nrows(), space.num_dofs());
    assert_scalar_eq!(mass.values().iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-13);
}

#[test]
fn mass_matrix_does_not_couple_components() {
    let space = unit_square_triangle_space(2, 3);
    let mass = assemble_mass_matrix(&space, &quadrature::triangle(2).unwrap()).unwrap();
    for (i, j, _) in mass.triplet_iter() {
        assert_eq!(i % 3, j % 3);
    }
}

#[test]
fn exact_mass_is_not_available_for_quadrilaterals() {
    let space = LagrangeSpace::new(create_unit_square_uniform_quad_mesh_2d::<f64>(1), 1);
    assert!(matches!(
        assemble_exact_mass_matrix(&space),
        Err(TransferError::NotImplemented(_))
    ));
}

#[test]
fn load_vector_of_constant_integrates_basis_functions() {
    let space = unit_square_triangle_space(2, 2);
    let load = assemble_load_vector(&space, &ConstantField::new(vec![1.0, 3.0]), &quadrature::triangle(1).unwrap())
        .unwrap();

    let (first, second): (Vec<f64>, Vec<f64>) = load
        .as_slice()
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .unzip();
    assert_scalar_eq!(first.iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(second.iter().sum::<f64>(), 3.0, comp = abs, tol = 1e-13);
}

#[test]
fn apply_boundary_values_eliminates_rows_and_columns() {
    let a_dense = laplacian_1d(4);
    let mut a = CsrMatrix::from(&a_dense);
    let mut b = DVector::from_column_slice(&[1.0, 1.0, 1.0, 1.0]);
    let values: PrescribedValues<f64> = [(0, 2.0), (3, -1.0)].into_iter().collect();

    apply_boundary_values(&mut a, &mut b, &values).unwrap();

    #[rustfmt::skip]
    let expected_matrix = DMatrix::from_row_slice(4, 4, &[
        1.0,  0.0,  0.0, 0.0,
        0.0,  2.0, -1.0, 0.0,
        0.0, -1.0,  2.0, 0.0,
        0.0,  0.0,  0.0, 1.0,
    ]);
    assert_matrix_eq!(DMatrix::from(&a), expected_matrix);
    assert_matrix_eq!(b, DVector::from_column_slice(&[2.0, 3.0, 0.0, -1.0]));

    // The reduced system has the prescribed values in its solution
    let x = DMatrix::from(&a).lu().solve(&b).unwrap();
    assert_scalar_eq!(x[0], 2.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(x[3], -1.0, comp = abs, tol = 1e-14);
}

#[test]
fn apply_boundary_values_rejects_out_of_range_dofs() {
    let mut a = CsrMatrix::from(&laplacian_1d(3));
    let mut b = DVector::zeros(3);
    let values: PrescribedValues<f64> = [(5, 1.0)].into_iter().collect();
    assert!(matches!(
        apply_boundary_values(&mut a, &mut b, &values),
        Err(TransferError::DimensionMismatch { expected: 3, actual: 6 })
    ));
}
