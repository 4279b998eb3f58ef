use crate::unit_tests::{interval_space, unit_square_triangle_space};
use fetra::estimate::{global_norm, integrate_difference, NormType};
use fetra::field::{ConstantField, Field, ScalarField, VectorField};
use fetra::interpolate::interpolate;
use fetra::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use fetra::quadrature;
use fetra::space::{FunctionSpace, LagrangeSpace};
use fetra::TransferError;
use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point2, Vector2, U2};

const ALL_NORMS: [NormType; 6] = [
    NormType::Mean,
    NormType::L1,
    NormType::L2,
    NormType::LInfinity,
    NormType::H1Seminorm,
    NormType::H1Norm,
];

#[test]
fn identical_fields_have_zero_difference_in_all_norms() {
    let space = unit_square_triangle_space(3, 2);
    let field = VectorField::new(2, |x: &Point2<f64>, values: &mut [f64]| {
        values[0] = 1.0 + x.x - 2.0 * x.y;
        values[1] = 3.0 * x.y;
    })
    .with_gradient(|_, gradients: &mut [Vector2<f64>]| {
        gradients[0] = Vector2::new(1.0, -2.0);
        gradients[1] = Vector2::new(0.0, 3.0);
    });
    let u_h = interpolate(&space, &field).unwrap();
    let quadrature = quadrature::triangle(2).unwrap();

    for norm in ALL_NORMS {
        let per_element = integrate_difference(&space, (&u_h).into(), &field, &quadrature, norm, None).unwrap();
        assert_eq!(per_element.len(), space.num_elements());
        for value in per_element.iter() {
            assert_scalar_eq!(*value, 0.0, comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn l_infinity_norm_is_not_rooted() {
    let space = interval_space(0.0, 1.0, 2, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let per_element = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::scalar(2.0),
        &quadrature::gauss(2),
        NormType::LInfinity,
        None,
    )
    .unwrap();

    assert_eq!(per_element.as_slice(), &[4.0, 4.0]);
    assert_eq!(global_norm((&per_element).into(), NormType::LInfinity), 4.0);
}

#[test]
fn l2_norm_of_constant_difference() {
    let space = LagrangeSpace::new(create_unit_square_uniform_quad_mesh_2d::<f64>(2), 1);
    let u_h = DVector::zeros(space.num_dofs());
    let per_element = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::scalar(2.0),
        &quadrature::quadrilateral_gauss(2),
        NormType::L2,
        None,
    )
    .unwrap();

    // Each cell has area 1/4, so the per-cell norm is sqrt(4 / 4)
    for value in per_element.iter() {
        assert_scalar_eq!(*value, 1.0, comp = abs, tol = 1e-12);
    }
    assert_scalar_eq!(global_norm((&per_element).into(), NormType::L2), 2.0, comp = abs, tol = 1e-12);
}

#[test]
fn h1_norm_combines_l2_and_seminorm() {
    let space = unit_square_triangle_space(2, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let field = ScalarField::new(|x: &Point2<f64>| x.x).with_gradient(|_| Vector2::new(1.0, 0.0));
    let quadrature = quadrature::triangle(2).unwrap();

    let norm_of = |norm| {
        let per_element = integrate_difference(&space, (&u_h).into(), &field, &quadrature, norm, None).unwrap();
        global_norm((&per_element).into(), norm)
    };

    let l2 = norm_of(NormType::L2);
    let semi = norm_of(NormType::H1Seminorm);
    let h1 = norm_of(NormType::H1Norm);
    assert_scalar_eq!(l2, (1.0f64 / 3.0).sqrt(), comp = abs, tol = 1e-12);
    assert_scalar_eq!(semi, 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(h1, (l2 * l2 + semi * semi).sqrt(), comp = abs, tol = 1e-12);
}

#[test]
fn mean_of_vector_difference_sums_components() {
    let space = unit_square_triangle_space(2, 2);
    let u_h = DVector::zeros(space.num_dofs());
    let per_element = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::new(vec![1.0, 2.0]),
        &quadrature::triangle(1).unwrap(),
        NormType::Mean,
        None,
    )
    .unwrap();

    assert_scalar_eq!(global_norm((&per_element).into(), NormType::Mean), 3.0, comp = abs, tol = 1e-12);
}

#[test]
fn weight_multiplies_integrand() {
    let space = unit_square_triangle_space(2, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let weight = ConstantField::scalar(4.0);
    let per_element = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::scalar(1.0),
        &quadrature::triangle(1).unwrap(),
        NormType::L1,
        Some(&weight as &(dyn Field<f64, U2> + Sync)),
    )
    .unwrap();

    assert_scalar_eq!(global_norm((&per_element).into(), NormType::L1), 4.0, comp = abs, tol = 1e-12);
}

#[test]
fn mean_on_scalar_space_is_not_useful() {
    let space = unit_square_triangle_space(1, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let result = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::scalar(1.0),
        &quadrature::triangle(1).unwrap(),
        NormType::Mean,
        None,
    );
    assert!(matches!(result, Err(TransferError::NotUseful)));
}

#[test]
fn vector_weight_is_rejected() {
    let space = unit_square_triangle_space(1, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let weight = ConstantField::new(vec![1.0, 1.0]);
    let result = integrate_difference(
        &space,
        (&u_h).into(),
        &ConstantField::scalar(1.0),
        &quadrature::triangle(1).unwrap(),
        NormType::L2,
        Some(&weight as &(dyn Field<f64, U2> + Sync)),
    );
    assert!(matches!(
        result,
        Err(TransferError::ComponentMismatch { expected: 1, actual: 2 })
    ));
}

#[test]
fn h1_norm_requires_reference_gradients() {
    let space = unit_square_triangle_space(1, 1);
    let u_h = DVector::zeros(space.num_dofs());
    let field = ScalarField::new(|x: &Point2<f64>| x.y);
    let result = integrate_difference(
        &space,
        (&u_h).into(),
        &field,
        &quadrature::triangle(1).unwrap(),
        NormType::H1Seminorm,
        None,
    );
    assert!(matches!(result, Err(TransferError::Field(_))));
}

#[test]
fn h1_seminorm_does_not_evaluate_reference_values() {
    let space = unit_square_triangle_space(2, 1);
    let u_h = interpolate(&space, &ScalarField::new(|x: &Point2<f64>| x.x + 2.0 * x.y)).unwrap();
    let gradient_only = ScalarField::<f64, U2>::fallible(|_: &Point2<f64>| Err(eyre::eyre!("values are not available")))
        .with_gradient(|_| Vector2::new(1.0, 2.0));
    let quadrature = quadrature::triangle(2).unwrap();

    let per_element = integrate_difference(
        &space,
        (&u_h).into(),
        &gradient_only,
        &quadrature,
        NormType::H1Seminorm,
        None,
    )
    .unwrap();
    assert_scalar_eq!(global_norm((&per_element).into(), NormType::H1Seminorm), 0.0, comp = abs, tol = 1e-12);

    let result = integrate_difference(&space, (&u_h).into(), &gradient_only, &quadrature, NormType::H1Norm, None);
    assert!(matches!(result, Err(TransferError::Field(_))));
}

#[test]
fn norm_type_serializes_by_name() {
    assert_eq!(serde_json::to_string(&NormType::LInfinity).unwrap(), r#""LInfinity""#);
    let norm: NormType = serde_json::from_str(r#""H1Seminorm""#).unwrap();
    assert_eq!(norm, NormType::H1Seminorm);
}
