//! Pointwise interpolation of fields onto function spaces.
use crate::allocators::DimAllocator;
use crate::error::{check_components, check_dimension};
use crate::field::Field;
use crate::space::FunctionSpace;
use crate::{Real, TransferError};
use davenport::{define_thread_local_workspace, with_thread_local_workspace};
use log::{debug, warn};
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DefaultAllocator, OPoint, Scalar};
use rayon::prelude::*;

/// Groups the local dofs of an element by identical support points.
///
/// For every distinct support point, the first local dof with that point is its
/// *representative*. Fields need only be evaluated once per representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeSupportPoints {
    representatives: Vec<usize>,
    dof_to_representative: Vec<usize>,
}

impl RepresentativeSupportPoints {
    /// Deduplicates the given support points, one per local dof. Points are compared exactly.
    pub fn from_support_points<P: PartialEq>(points: &[P]) -> Self {
        let mut representatives: Vec<usize> = Vec::new();
        let mut dof_to_representative = Vec::with_capacity(points.len());

        for (dof, point) in points.iter().enumerate() {
            // Repeated points are usually adjacent, so search from the most recent representative
            let existing = representatives
                .iter()
                .rposition(|&rep| &points[rep] == point);
            match existing {
                Some(position) => dof_to_representative.push(position),
                None => {
                    dof_to_representative.push(representatives.len());
                    representatives.push(dof);
                }
            }
        }

        Self {
            representatives,
            dof_to_representative,
        }
    }

    /// The local dof indices of the representatives, in order of first occurrence.
    pub fn representatives(&self) -> &[usize] {
        &self.representatives
    }

    pub fn num_representatives(&self) -> usize {
        self.representatives.len()
    }

    /// For every local dof, the position of its representative in
    /// [`representatives`](Self::representatives).
    pub fn dof_to_representative(&self) -> &[usize] {
        &self.dof_to_representative
    }
}

struct SupportPointPattern<T: Scalar, D: nalgebra::DimName>
where
    DefaultAllocator: nalgebra::allocator::Allocator<T, D>,
{
    reference_points: Vec<OPoint<T, D>>,
    representatives: RepresentativeSupportPoints,
}

/// Assigns each element the index of its support point pattern, deduplicating every distinct
/// pattern only once.
fn compute_support_point_patterns<T, Space>(space: &Space) -> (Vec<SupportPointPattern<T, Space::GeometryDim>>, Vec<usize>)
where
    T: Real,
    Space: FunctionSpace<T>,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    let mut patterns: Vec<SupportPointPattern<T, Space::GeometryDim>> = Vec::new();
    let mut element_patterns = Vec::with_capacity(space.num_elements());
    let mut reference_points = Vec::new();

    for element_index in 0..space.num_elements() {
        let n = space.element_dof_count(element_index);
        reference_points.resize(n, OPoint::origin());
        space.populate_element_reference_support_points(element_index, &mut reference_points);

        let last_matches = patterns
            .last()
            .map(|pattern| pattern.reference_points == reference_points)
            .unwrap_or(false);
        let pattern_index = if last_matches {
            patterns.len() - 1
        } else if let Some(index) = patterns
            .iter()
            .position(|pattern| pattern.reference_points == reference_points)
        {
            index
        } else {
            if !patterns.is_empty() {
                warn!(
                    "Support points of element {} differ from all previously cached patterns, deduplicating again.",
                    element_index
                );
            }
            patterns.push(SupportPointPattern {
                representatives: RepresentativeSupportPoints::from_support_points(&reference_points),
                reference_points: reference_points.clone(),
            });
            patterns.len() - 1
        };
        element_patterns.push(pattern_index);
    }

    (patterns, element_patterns)
}

struct InterpolationWorkspace<T: Scalar, D: nalgebra::DimName>
where
    DefaultAllocator: nalgebra::allocator::Allocator<T, D>,
{
    dofs: Vec<usize>,
    points: Vec<OPoint<T, D>>,
    values: DMatrix<T>,
}

impl<T: Real, D: nalgebra::DimName> Default for InterpolationWorkspace<T, D>
where
    DefaultAllocator: nalgebra::allocator::Allocator<T, D>,
{
    fn default() -> Self {
        Self {
            dofs: Vec::new(),
            points: Vec::new(),
            values: DMatrix::zeros(0, 0),
        }
    }
}

define_thread_local_workspace!(INTERPOLATION_WORKSPACE);

/// Interpolates the field onto the space.
///
/// See [`interpolate_into`].
pub fn interpolate<T, Space, F>(space: &Space, field: &F) -> Result<DVector<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    F: ?Sized + Field<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
    <DefaultAllocator as nalgebra::allocator::Allocator<T, Space::GeometryDim>>::Buffer: Sync,
{
    let mut coefficients = DVector::zeros(space.num_dofs());
    interpolate_into(space, field, &mut coefficients)?;
    Ok(coefficients)
}

/// Interpolates the field onto the space, storing the coefficients in the provided vector.
///
/// Every dof receives the value of its component of the field at its support point. The field
/// is evaluated once per distinct support point of each element.
///
/// The vector is only modified if the evaluation succeeds for all elements.
///
/// # Errors
///
/// Returns [`TransferError::ComponentMismatch`] if the field and space have different numbers
/// of components, and [`TransferError::DimensionMismatch`] if the vector does not have one
/// entry per dof. Field evaluation errors are propagated.
pub fn interpolate_into<T, Space, F>(space: &Space, field: &F, coefficients: &mut DVector<T>) -> Result<(), TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    F: ?Sized + Field<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
    <DefaultAllocator as nalgebra::allocator::Allocator<T, Space::GeometryDim>>::Buffer: Sync,
{
    let nc = space.num_components();
    check_components(nc, field.num_components())?;
    check_dimension(space.num_dofs(), coefficients.len())?;

    let (patterns, element_patterns) = compute_support_point_patterns(space);
    debug!(
        "Interpolating field onto {} elements with {} distinct support point pattern(s)",
        space.num_elements(),
        patterns.len()
    );

    let element_values = (0..space.num_elements())
        .into_par_iter()
        .map(|element_index| -> Result<Vec<(usize, T)>, TransferError> {
            let pattern = &patterns[element_patterns[element_index]];
            let representatives = &pattern.representatives;
            with_thread_local_workspace(
                &INTERPOLATION_WORKSPACE,
                |ws: &mut InterpolationWorkspace<T, Space::GeometryDim>| {
                    let n = pattern.reference_points.len();
                    ws.dofs.resize(n, usize::MAX);
                    space.populate_element_dofs(&mut ws.dofs, element_index);

                    ws.points.clear();
                    ws.points
                        .extend(representatives.representatives().iter().map(|&rep| {
                            space.map_element_reference_coords(element_index, &pattern.reference_points[rep])
                        }));

                    let num_reps = representatives.num_representatives();
                    ws.values.resize_mut(nc, num_reps, T::zero());
                    if nc == 1 {
                        field.value_list(&ws.points, ws.values.as_mut_slice(), 0)?;
                    } else {
                        field.vector_value_list(&ws.points, DMatrixViewMut::from(&mut ws.values))?;
                    }

                    let values = ws
                        .dofs
                        .iter()
                        .zip(representatives.dof_to_representative())
                        .enumerate()
                        .map(|(local_dof, (&global_dof, &rep))| {
                            let component = space.element_dof_component(element_index, local_dof);
                            (global_dof, ws.values[(component, rep)])
                        })
                        .collect();
                    Ok(values)
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Each dof is written once, by the first element that owns it
    let mut written = vec![false; coefficients.len()];
    for (global_dof, value) in element_values.into_iter().flatten() {
        if !written[global_dof] {
            coefficients[global_dof] = value;
            written[global_dof] = true;
        }
    }

    Ok(())
}

/// Transfers coefficients between two spaces whose elements are paired by index.
///
/// For each element, the local coefficients of the source element are multiplied by the
/// element-local `transfer` matrix and written to the dofs of the target element. Dofs shared
/// by several elements take the value of the last element that writes them.
///
/// The spaces must enumerate their elements in the same (paired) order. This is not checked.
pub fn transfer_between_spaces<T, Source, Target>(
    source: &Source,
    target: &Target,
    transfer: &DMatrix<T>,
    source_coefficients: &DVector<T>,
    target_coefficients: &mut DVector<T>,
) -> Result<(), TransferError>
where
    T: Real,
    Source: FunctionSpace<T>,
    Target: FunctionSpace<T>,
    DefaultAllocator: DimAllocator<T, Source::GeometryDim> + DimAllocator<T, Target::GeometryDim>,
{
    check_dimension(source.num_elements(), target.num_elements())?;
    check_dimension(source.num_dofs(), source_coefficients.len())?;
    check_dimension(target.num_dofs(), target_coefficients.len())?;
    for element_index in 0..source.num_elements() {
        check_dimension(source.element_dof_count(element_index), transfer.ncols())?;
        check_dimension(target.element_dof_count(element_index), transfer.nrows())?;
    }

    let mut source_dofs = vec![usize::MAX; transfer.ncols()];
    let mut target_dofs = vec![usize::MAX; transfer.nrows()];
    let mut source_local = DVector::zeros(transfer.ncols());
    for element_index in 0..source.num_elements() {
        source.populate_element_dofs(&mut source_dofs, element_index);
        target.populate_element_dofs(&mut target_dofs, element_index);

        for (local, &global) in source_local.iter_mut().zip(&source_dofs) {
            *local = source_coefficients[global];
        }
        let target_local = transfer * &source_local;
        for (&global, &value) in target_dofs.iter().zip(target_local.iter()) {
            target_coefficients[global] = value;
        }
    }

    Ok(())
}
