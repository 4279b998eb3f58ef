//! Per-element error norms of discrete functions measured against reference fields.
use crate::allocators::DimAllocator;
use crate::assembly::buffers::{BasisFunctionBuffer, QuadratureBuffer};
use crate::assembly::evaluate_field_at_points;
use crate::error::{check_components, check_dimension};
use crate::field::Field;
use crate::quadrature::Quadrature;
use crate::space::FunctionSpace;
use crate::{Real, TransferError};
use davenport::{define_thread_local_workspace, with_thread_local_workspace};
use log::debug;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DVector, DVectorView, DefaultAllocator, DimName, OVector, Scalar};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The norm measured by [`integrate_difference`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormType {
    /// The integral of the sum of the components of the difference.
    Mean,
    L1,
    L2,
    /// The largest squared pointwise magnitude of the difference at the quadrature points.
    ///
    /// The per-element value is *not* rooted.
    LInfinity,
    H1Seminorm,
    H1Norm,
}

impl NormType {
    fn requires_values(&self) -> bool {
        !matches!(self, Self::H1Seminorm)
    }

    fn requires_gradients(&self) -> bool {
        matches!(self, Self::H1Seminorm | Self::H1Norm)
    }
}

struct EstimateWorkspace<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    basis: BasisFunctionBuffer<T, D>,
    quadrature: QuadratureBuffer<T, D>,
    reference_values: DMatrix<T>,
    reference_gradients: Vec<OVector<T, D>>,
    weights: Vec<T>,
    local_coefficients: DVector<T>,
    discrete_value: DVector<T>,
    discrete_gradients: Vec<OVector<T, D>>,
}

impl<T, D> Default for EstimateWorkspace<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    fn default() -> Self {
        Self {
            basis: BasisFunctionBuffer::default(),
            quadrature: QuadratureBuffer::default(),
            reference_values: DMatrix::zeros(0, 0),
            reference_gradients: Vec::new(),
            weights: Vec::new(),
            local_coefficients: DVector::zeros(0),
            discrete_value: DVector::zeros(0),
            discrete_gradients: Vec::new(),
        }
    }
}

define_thread_local_workspace!(ESTIMATE_WORKSPACE);

/// Integrates the difference between a reference field and a discrete function over every
/// element, measured in the given norm.
///
/// The difference is `reference - u_h`. If a (scalar) weight field is given, the pointwise
/// integrand is multiplied by the weight before integration. The result has one entry per
/// element, in element order.
///
/// Gradients of the reference field are only evaluated for the H1 norms.
///
/// # Errors
///
/// - [`TransferError::NotUseful`] for [`NormType::Mean`] on a space with a single component.
/// - [`TransferError::ComponentMismatch`] if the reference field does not match the space, or
///   the weight field is not scalar.
/// - [`TransferError::DimensionMismatch`] if `u_h` does not have one entry per dof.
pub fn integrate_difference<T, Space, F, Q>(
    space: &Space,
    u_h: DVectorView<T>,
    reference: &F,
    quadrature: &Q,
    norm: NormType,
    weight: Option<&(dyn Field<T, Space::GeometryDim> + Sync)>,
) -> Result<DVector<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    F: ?Sized + Field<T, Space::GeometryDim> + Sync,
    Q: Quadrature<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    let nc = space.num_components();
    if norm == NormType::Mean && nc == 1 {
        return Err(TransferError::NotUseful);
    }
    check_components(nc, reference.num_components())?;
    if let Some(weight) = weight {
        check_components(1, weight.num_components())?;
    }
    check_dimension(space.num_dofs(), u_h.len())?;

    let per_element = (0..space.num_elements())
        .into_par_iter()
        .map(|element_index| {
            with_thread_local_workspace(&ESTIMATE_WORKSPACE, |ws: &mut EstimateWorkspace<T, Space::GeometryDim>| {
                integrate_element_difference(ws, space, element_index, &u_h, reference, quadrature, norm, weight)
            })
        })
        .collect::<Result<Vec<_>, TransferError>>()?;

    debug!("Integrated {:?} difference over {} elements", norm, per_element.len());
    Ok(DVector::from_vec(per_element))
}

#[allow(clippy::too_many_arguments)]
fn integrate_element_difference<T, Space, F, Q>(
    ws: &mut EstimateWorkspace<T, Space::GeometryDim>,
    space: &Space,
    element_index: usize,
    u_h: &DVectorView<T>,
    reference: &F,
    quadrature: &Q,
    norm: NormType,
    weight: Option<&(dyn Field<T, Space::GeometryDim> + Sync)>,
) -> Result<T, TransferError>
where
    T: Real,
    Space: FunctionSpace<T>,
    F: ?Sized + Field<T, Space::GeometryDim>,
    Q: Quadrature<T, Space::GeometryDim>,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    let nc = space.num_components();
    let num_points = quadrature.len();

    ws.basis
        .populate_element_dofs_from_space(element_index, space);
    ws.quadrature
        .populate_element_quadrature_from_space(element_index, space, quadrature);
    ws.local_coefficients = DVector::from_iterator(ws.basis.dofs().len(), ws.basis.dofs().iter().map(|&dof| u_h[dof]));
    ws.discrete_value.resize_vertically_mut(nc, T::zero());

    if norm.requires_values() {
        evaluate_field_at_points(reference, ws.quadrature.points(), &mut ws.reference_values)?;
    }

    if norm.requires_gradients() {
        ws.reference_gradients
            .resize(nc * num_points, OVector::<T, Space::GeometryDim>::zeros());
        ws.discrete_gradients.resize(nc, OVector::<T, Space::GeometryDim>::zeros());
        if nc == 1 {
            reference.gradient_list(ws.quadrature.points(), &mut ws.reference_gradients, 0)?;
        } else {
            reference.vector_gradient_list(ws.quadrature.points(), &mut ws.reference_gradients)?;
        }
    }

    ws.weights.resize(num_points, T::one());
    match weight {
        Some(weight) => weight.value_list(ws.quadrature.points(), &mut ws.weights, 0)?,
        None => ws.weights.fill(T::one()),
    }

    let mut integral = T::zero();
    let mut seminorm_integral = T::zero();
    let mut max_squared = T::zero();

    for (q, xi) in quadrature.points().iter().enumerate() {
        let jxw = ws.quadrature.weights()[q];
        let w = ws.weights[q];

        if norm.requires_values() {
            ws.basis
                .populate_element_basis_values_from_space(element_index, space, xi);
            ws.basis
                .interpolate_value(DVectorView::from(&ws.local_coefficients), &mut ws.discrete_value);

            let difference = ws.reference_values.column(q) - &ws.discrete_value;
            let squared = difference.norm_squared();

            match norm {
                NormType::Mean => integral += w * difference.sum() * jxw,
                NormType::L1 => integral += w * squared.sqrt() * jxw,
                NormType::L2 | NormType::H1Norm => integral += w * squared * jxw,
                NormType::LInfinity => max_squared = max_squared.max(w * squared),
                NormType::H1Seminorm => {}
            }
        }

        if norm.requires_gradients() {
            let inverse_transposed_jacobian = &ws.quadrature.inverse_transposed_jacobians()[q];
            ws.basis.populate_element_gradients_from_space(
                element_index,
                space,
                xi,
                inverse_transposed_jacobian,
            );
            ws.basis.interpolate_gradients(
                DVectorView::from(&ws.local_coefficients),
                &mut ws.discrete_gradients,
            );
            let gradient_squared = (0..nc)
                .map(|c| (&ws.reference_gradients[nc * q + c] - &ws.discrete_gradients[c]).norm_squared())
                .fold(T::zero(), |sum, g| sum + g);
            seminorm_integral += w * gradient_squared * jxw;
        }
    }

    let value = match norm {
        NormType::Mean | NormType::L1 => integral,
        NormType::L2 => integral.sqrt(),
        NormType::LInfinity => max_squared,
        NormType::H1Seminorm => seminorm_integral.sqrt(),
        NormType::H1Norm => (integral + seminorm_integral).sqrt(),
    };
    Ok(value)
}

/// Combines per-element values computed by [`integrate_difference`] into a global value.
///
/// Values are summed for the mean and L1 norms, and combined as the root of the sum of squares
/// for the L2 and H1 norms. For the L∞ norm, the largest value is returned.
pub fn global_norm<T: Real>(per_element: DVectorView<T>, norm: NormType) -> T {
    match norm {
        NormType::Mean | NormType::L1 => per_element.sum(),
        NormType::L2 | NormType::H1Seminorm | NormType::H1Norm => per_element.norm(),
        NormType::LInfinity => per_element
            .iter()
            .copied()
            .fold(T::zero(), |max, value| max.max(value)),
    }
}
