//! Extraction of prescribed boundary values from fields.
use crate::allocators::BiDimAllocator;
use crate::assembly::assemble_boundary_mass_system;
use crate::error::check_components;
use crate::field::Field;
use crate::mesh::BoundaryIndicator;
use crate::projection::{solve_mass_system, ProjectionSettings};
use crate::quadrature::Quadrature;
use crate::space::BoundaryFunctionSpace;
use crate::{Real, TransferError};
use log::debug;
use nalgebra::{DMatrix, DMatrixViewMut, DefaultAllocator, DimName, OPoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Values prescribed on a subset of the global dofs.
pub type PrescribedValues<T> = BTreeMap<usize, T>;

/// Fields to be imposed on the parts of the boundary with the given indicators.
pub type BoundaryFunctions<'a, T, D> = BTreeMap<BoundaryIndicator, &'a (dyn Field<T, D> + Sync + 'a)>;

/// Selects a subset of the vector components of a function space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentMask(Vec<bool>);

impl ComponentMask {
    /// Selects every one of `num_components` components.
    pub fn all(num_components: usize) -> Self {
        Self(vec![true; num_components])
    }

    /// Selects only the given component out of `num_components`.
    pub fn only(num_components: usize, component: usize) -> Self {
        assert!(component < num_components, "Component out of bounds");
        let mut mask = vec![false; num_components];
        mask[component] = true;
        Self(mask)
    }

    pub fn new(selection: Vec<bool>) -> Self {
        Self(selection)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_selected(&self, component: usize) -> bool {
        self.0.get(component).copied().unwrap_or(false)
    }

    /// Checks that the mask has one entry per component and selects at least one component.
    pub fn validate(&self, num_components: usize) -> Result<(), TransferError> {
        check_components(num_components, self.len())?;
        if self.0.iter().any(|&selected| selected) {
            Ok(())
        } else {
            Err(TransferError::EmptyComponentMask)
        }
    }
}

/// Prescribes zero for every masked-in dof on any boundary face.
pub fn zero_boundary_values<T, Space>(space: &Space, mask: &ComponentMask) -> Result<PrescribedValues<T>, TransferError>
where
    T: Real,
    Space: BoundaryFunctionSpace<T>,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    mask.validate(space.num_components())?;

    let mut values = PrescribedValues::new();
    let mut dofs = Vec::new();
    for face_index in 0..space.num_faces() {
        if space.face_boundary(face_index).is_some() {
            dofs.resize(space.face_dof_count(face_index), usize::MAX);
            space.populate_face_dofs(&mut dofs, face_index);
            for (local_dof, &global_dof) in dofs.iter().enumerate() {
                if mask.is_selected(space.face_dof_component(face_index, local_dof)) {
                    values.insert(global_dof, T::zero());
                }
            }
        }
    }

    Ok(values)
}

/// Interpolates the field at the support points of all boundary faces with the given indicator.
///
/// Masked-in dofs are inserted into `values`, overwriting existing entries. On failure,
/// `values` is left unchanged.
pub fn interpolate_boundary_values<T, Space, F>(
    space: &Space,
    indicator: BoundaryIndicator,
    field: &F,
    mask: &ComponentMask,
    values: &mut PrescribedValues<T>,
) -> Result<(), TransferError>
where
    T: Real,
    Space: BoundaryFunctionSpace<T>,
    F: ?Sized + Field<T, Space::GeometryDim>,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    let nc = space.num_components();
    check_components(nc, field.num_components())?;
    mask.validate(nc)?;

    let mut new_values = PrescribedValues::new();
    let mut dofs = Vec::new();
    let mut points = Vec::new();
    let mut field_values = DMatrix::zeros(0, 0);
    for face_index in 0..space.num_faces() {
        if space.face_boundary(face_index) != Some(indicator) {
            continue;
        }

        let n = space.face_dof_count(face_index);
        dofs.resize(n, usize::MAX);
        points.resize(n, OPoint::origin());
        space.populate_face_dofs(&mut dofs, face_index);
        space.populate_face_support_points(face_index, &mut points);

        field_values.resize_mut(nc, n, T::zero());
        if nc == 1 {
            field.value_list(&points, field_values.as_mut_slice(), 0)?;
        } else {
            field.vector_value_list(&points, DMatrixViewMut::from(&mut field_values))?;
        }

        for (local_dof, &global_dof) in dofs.iter().enumerate() {
            let component = space.face_dof_component(face_index, local_dof);
            if mask.is_selected(component) {
                new_values.insert(global_dof, field_values[(component, local_dof)]);
            }
        }
    }

    values.extend(new_values);
    Ok(())
}

/// A contiguous numbering of the dofs on a selection of boundary faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryDofMapping {
    global_to_boundary: Vec<Option<usize>>,
    boundary_dofs: Vec<usize>,
    max_couplings: usize,
}

impl BoundaryDofMapping {
    pub fn num_boundary_dofs(&self) -> usize {
        self.boundary_dofs.len()
    }

    /// The boundary index of a global dof, if the dof lies on a selected face.
    pub fn boundary_index(&self, global_dof: usize) -> Option<usize> {
        self.global_to_boundary.get(global_dof).copied().flatten()
    }

    /// Global dofs in boundary index order.
    pub fn boundary_dofs(&self) -> &[usize] {
        &self.boundary_dofs
    }

    /// The largest number of boundary dofs any boundary dof shares a face with.
    pub fn max_couplings(&self) -> usize {
        self.max_couplings
    }
}

/// Numbers the dofs of faces with one of the given indicators in order of first appearance.
pub fn boundary_dof_mapping<T, Space>(space: &Space, indicators: &BTreeSet<BoundaryIndicator>) -> BoundaryDofMapping
where
    T: Real,
    Space: BoundaryFunctionSpace<T>,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    let mut global_to_boundary = vec![None; space.num_dofs()];
    let mut boundary_dofs = Vec::new();
    let mut couplings: Vec<Vec<usize>> = Vec::new();
    let mut dofs = Vec::new();

    for face_index in 0..space.num_faces() {
        let selected = space
            .face_boundary(face_index)
            .map(|indicator| indicators.contains(&indicator))
            .unwrap_or(false);
        if !selected {
            continue;
        }

        dofs.resize(space.face_dof_count(face_index), usize::MAX);
        space.populate_face_dofs(&mut dofs, face_index);
        for &global_dof in &dofs {
            if global_to_boundary[global_dof].is_none() {
                global_to_boundary[global_dof] = Some(boundary_dofs.len());
                boundary_dofs.push(global_dof);
                couplings.push(Vec::new());
            }
        }
        for &global_dof in &dofs {
            if let Some(i) = global_to_boundary[global_dof] {
                couplings[i].extend(dofs.iter().filter_map(|&dof| global_to_boundary[dof]));
            }
        }
    }

    let max_couplings = couplings
        .into_iter()
        .map(|mut coupled| {
            coupled.sort_unstable();
            coupled.dedup();
            coupled.len()
        })
        .max()
        .unwrap_or(0);

    BoundaryDofMapping {
        global_to_boundary,
        boundary_dofs,
        max_couplings,
    }
}

/// Computes boundary values by L2 projection of each field onto the trace of the space on the
/// boundary faces with the corresponding indicator.
///
/// # Errors
///
/// Projection on the boundary of three-dimensional domains is not supported and returns
/// [`TransferError::NotImplemented`]. Every field must have the same number of components as
/// the space.
pub fn project_boundary_values<T, Space, Q>(
    space: &Space,
    boundary_functions: &BoundaryFunctions<T, Space::GeometryDim>,
    face_quadrature: &Q,
    settings: &ProjectionSettings<T>,
) -> Result<PrescribedValues<T>, TransferError>
where
    T: Real,
    Space: BoundaryFunctionSpace<T> + Sync,
    Q: Quadrature<T, Space::FaceReferenceDim> + Sync,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    if Space::GeometryDim::dim() >= 3 {
        return Err(TransferError::NotImplemented(
            "boundary projection for domains of three or more dimensions",
        ));
    }
    for field in boundary_functions.values() {
        check_components(space.num_components(), field.num_components())?;
    }

    let indicators = boundary_functions.keys().copied().collect();
    let mapping = boundary_dof_mapping(space, &indicators);
    if mapping.num_boundary_dofs() == 0 {
        return Ok(PrescribedValues::new());
    }

    let (matrix, rhs) = assemble_boundary_mass_system(space, &mapping, boundary_functions, face_quadrature)?;
    let solution = solve_mass_system(&matrix, &rhs, settings)?;
    debug!("Projected boundary values onto {} boundary dofs", mapping.num_boundary_dofs());

    Ok(mapping
        .boundary_dofs()
        .iter()
        .copied()
        .zip(solution.iter().copied())
        .collect())
}
