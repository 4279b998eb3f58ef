//! Assembly of mass matrices and load vectors, and elimination of prescribed values.
//!
//! Element-local matrices and vectors are computed in parallel. Scattering them into the
//! global system is serial.
use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::boundary::{BoundaryDofMapping, BoundaryFunctions, PrescribedValues};
use crate::error::{check_components, check_dimension};
use crate::field::Field;
use crate::quadrature::Quadrature;
use crate::space::{BoundaryFunctionSpace, FunctionSpace};
use crate::{Real, TransferError};
use davenport::{define_thread_local_workspace, with_thread_local_workspace};
use itertools::izip;
use log::debug;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DefaultAllocator, DimName, OPoint, Scalar};
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;

pub mod buffers;

use buffers::{BasisFunctionBuffer, QuadratureBuffer};

struct AssemblyWorkspace<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    basis: BasisFunctionBuffer<T, D>,
    quadrature: QuadratureBuffer<T, D>,
    field_values: DMatrix<T>,
}

impl<T, D> Default for AssemblyWorkspace<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    fn default() -> Self {
        Self {
            basis: BasisFunctionBuffer::default(),
            quadrature: QuadratureBuffer::default(),
            field_values: DMatrix::zeros(0, 0),
        }
    }
}

define_thread_local_workspace!(WORKSPACE);

/// Evaluates the field at all points, storing component `c` at point `q` in `values[(c, q)]`.
///
/// Single-component fields use the scalar evaluation path.
pub(crate) fn evaluate_field_at_points<T, D, F>(
    field: &F,
    points: &[OPoint<T, D>],
    values: &mut DMatrix<T>,
) -> Result<(), TransferError>
where
    T: Real,
    D: DimName,
    F: ?Sized + Field<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    let nc = field.num_components();
    values.resize_mut(nc, points.len(), T::zero());
    if nc == 1 {
        field.value_list(points, values.as_mut_slice(), 0)?;
    } else {
        field.vector_value_list(points, DMatrixViewMut::from(values))?;
    }
    Ok(())
}

/// Sums the element matrices into a square sparse matrix of dimension `n`.
///
/// `max_couplings` bounds the number of entries in any row and sizes the row buffers.
/// Entries that are exactly zero are left out of the sparsity pattern, except on the diagonal.
fn scatter_element_matrices<T: Real>(
    n: usize,
    max_couplings: usize,
    element_matrices: Vec<(Vec<usize>, DMatrix<T>)>,
) -> CsrMatrix<T> {
    let mut rows: Vec<Vec<(usize, T)>> = (0..n).map(|_| Vec::with_capacity(max_couplings)).collect();
    for (dofs, matrix) in element_matrices {
        for (i, &row) in dofs.iter().enumerate() {
            let row_entries = &mut rows[row];
            for (j, &col) in dofs.iter().enumerate() {
                let value = matrix[(i, j)];
                if i != j && value == T::zero() {
                    continue;
                }
                match row_entries.iter_mut().find(|(c, _)| *c == col) {
                    Some((_, entry)) => *entry += value,
                    None => row_entries.push((col, value)),
                }
            }
        }
    }

    let nnz = rows.iter().map(Vec::len).sum();
    let mut offsets = Vec::with_capacity(n + 1);
    let mut column_indices = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    offsets.push(0);
    for mut row_entries in rows {
        row_entries.sort_unstable_by_key(|&(col, _)| col);
        for (col, value) in row_entries {
            column_indices.push(col);
            values.push(value);
        }
        offsets.push(column_indices.len());
    }

    CsrMatrix::try_from_csr_data(n, n, offsets, column_indices, values)
        .expect("Rows are sorted, free of duplicates and within bounds")
}

fn scatter_element_vectors<T: Real>(n: usize, element_vectors: Vec<(Vec<usize>, DVector<T>)>) -> DVector<T> {
    let mut result = DVector::zeros(n);
    for (dofs, vector) in element_vectors {
        for (&dof, &value) in dofs.iter().zip(vector.iter()) {
            result[dof] += value;
        }
    }
    result
}

/// Assembles the mass matrix `M_ij = ∫ φ_i · φ_j dx` of the space.
///
/// Uses exact element mass matrices when the space supports them, and the given quadrature
/// otherwise.
pub fn assemble_mass_matrix<T, Space, Q>(space: &Space, quadrature: &Q) -> Result<CsrMatrix<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    Q: Quadrature<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    if space.supports_exact_mass() {
        assemble_exact_mass_matrix(space)
    } else {
        assemble_mass_matrix_by_quadrature(space, quadrature)
    }
}

/// Assembles the mass matrix from exact element mass matrices.
///
/// Fails with [`TransferError::NotImplemented`] if the space does not provide them.
pub fn assemble_exact_mass_matrix<T, Space>(space: &Space) -> Result<CsrMatrix<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    let element_matrices = (0..space.num_elements())
        .into_par_iter()
        .map(|element_index| {
            let n = space.element_dof_count(element_index);
            let mut dofs = vec![usize::MAX; n];
            space.populate_element_dofs(&mut dofs, element_index);
            let mut mass = DMatrix::zeros(n, n);
            space.populate_element_exact_mass(element_index, DMatrixViewMut::from(&mut mass))?;
            Ok((dofs, mass))
        })
        .collect::<Result<Vec<_>, TransferError>>()?;

    debug!("Assembled exact mass matrix for {} elements", element_matrices.len());
    Ok(scatter_element_matrices(
        space.num_dofs(),
        space.max_couplings_per_dof(),
        element_matrices,
    ))
}

/// Assembles the mass matrix by integrating products of basis functions with the quadrature.
pub fn assemble_mass_matrix_by_quadrature<T, Space, Q>(space: &Space, quadrature: &Q) -> Result<CsrMatrix<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    Q: Quadrature<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    let element_matrices: Vec<_> = (0..space.num_elements())
        .into_par_iter()
        .map(|element_index| {
            with_thread_local_workspace(&WORKSPACE, |ws: &mut AssemblyWorkspace<T, Space::GeometryDim>| {
                ws.basis
                    .populate_element_dofs_from_space(element_index, space);
                ws.quadrature
                    .populate_element_quadrature_from_space(element_index, space, quadrature);

                let n = ws.basis.dofs().len();
                let mut mass = DMatrix::zeros(n, n);
                for (&weight, xi) in ws.quadrature.weights().iter().zip(quadrature.points()) {
                    ws.basis
                        .populate_element_basis_values_from_space(element_index, space, xi);
                    add_local_mass(&mut mass, weight, ws.basis.basis_values(), ws.basis.components());
                }
                (ws.basis.dofs().to_vec(), mass)
            })
        })
        .collect();

    debug!("Assembled mass matrix by quadrature for {} elements", element_matrices.len());
    Ok(scatter_element_matrices(
        space.num_dofs(),
        space.max_couplings_per_dof(),
        element_matrices,
    ))
}

/// Adds `weight * φ_i φ_j` for every pair of local dofs with the same component.
fn add_local_mass<T: Real>(mass: &mut DMatrix<T>, weight: T, basis_values: &[T], components: &[usize]) {
    for (j, (&phi_j, &c_j)) in basis_values.iter().zip(components).enumerate() {
        for (i, (&phi_i, &c_i)) in basis_values.iter().zip(components).enumerate() {
            if c_i == c_j {
                mass[(i, j)] += weight * phi_i * phi_j;
            }
        }
    }
}

/// Adds `weight * f_{c(i)} φ_i` for every local dof `i`.
fn add_local_load<T: Real>(
    load: &mut DVector<T>,
    weight: T,
    basis_values: &[T],
    components: &[usize],
    field_values: impl Fn(usize) -> T,
) {
    for (b_i, &phi_i, &c_i) in izip!(load.iter_mut(), basis_values, components) {
        *b_i += weight * field_values(c_i) * phi_i;
    }
}

/// Assembles the load vector `b_i = ∫ f_{c(i)} φ_i dx`, where `c(i)` is the component of dof `i`.
///
/// The field is evaluated once per element at all of its quadrature points.
pub fn assemble_load_vector<T, Space, F, Q>(space: &Space, field: &F, quadrature: &Q) -> Result<DVector<T>, TransferError>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    F: ?Sized + Field<T, Space::GeometryDim> + Sync,
    Q: Quadrature<T, Space::GeometryDim> + Sync,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    check_components(space.num_components(), field.num_components())?;

    let element_vectors = (0..space.num_elements())
        .into_par_iter()
        .map(|element_index| {
            with_thread_local_workspace(&WORKSPACE, |ws: &mut AssemblyWorkspace<T, Space::GeometryDim>| {
                ws.basis
                    .populate_element_dofs_from_space(element_index, space);
                ws.quadrature
                    .populate_element_quadrature_from_space(element_index, space, quadrature);
                evaluate_field_at_points(field, ws.quadrature.points(), &mut ws.field_values)?;

                let mut load = DVector::zeros(ws.basis.dofs().len());
                let quadrature_data = ws.quadrature.weights().iter().zip(quadrature.points());
                for (q, (&weight, xi)) in quadrature_data.enumerate() {
                    ws.basis
                        .populate_element_basis_values_from_space(element_index, space, xi);
                    let field_values = &ws.field_values;
                    add_local_load(
                        &mut load,
                        weight,
                        ws.basis.basis_values(),
                        ws.basis.components(),
                        |c| field_values[(c, q)],
                    );
                }
                Ok((ws.basis.dofs().to_vec(), load))
            })
        })
        .collect::<Result<Vec<_>, TransferError>>()?;

    debug!("Assembled load vector for {} elements", element_vectors.len());
    Ok(scatter_element_vectors(space.num_dofs(), element_vectors))
}

/// Assembles the mass matrix and load vector of the boundary L2 projection, in the numbering
/// of the given boundary dof mapping.
///
/// Only faces whose indicator has an associated field contribute, each with its own field.
pub fn assemble_boundary_mass_system<T, Space, Q>(
    space: &Space,
    mapping: &BoundaryDofMapping,
    boundary_functions: &BoundaryFunctions<T, Space::GeometryDim>,
    face_quadrature: &Q,
) -> Result<(CsrMatrix<T>, DVector<T>), TransferError>
where
    T: Real,
    Space: BoundaryFunctionSpace<T> + Sync,
    Q: Quadrature<T, Space::FaceReferenceDim> + Sync,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    for field in boundary_functions.values() {
        check_components(space.num_components(), field.num_components())?;
    }

    let face_systems = (0..space.num_faces())
        .into_par_iter()
        .filter_map(|face_index| {
            let field = space
                .face_boundary(face_index)
                .and_then(|indicator| boundary_functions.get(&indicator))?;
            Some((face_index, *field))
        })
        .map(|(face_index, field)| {
            with_thread_local_workspace(&WORKSPACE, |ws: &mut AssemblyWorkspace<T, Space::GeometryDim>| {
                ws.basis.populate_face_dofs_from_space(face_index, space);
                ws.quadrature
                    .populate_face_quadrature_from_space(face_index, space, face_quadrature);
                evaluate_field_at_points(field, ws.quadrature.points(), &mut ws.field_values)?;

                let n = ws.basis.dofs().len();
                let mut mass = DMatrix::zeros(n, n);
                let mut load = DVector::zeros(n);
                let quadrature_data = ws.quadrature.weights().iter().zip(face_quadrature.points());
                for (q, (&weight, xi)) in quadrature_data.enumerate() {
                    ws.basis
                        .populate_face_basis_values_from_space(face_index, space, xi);
                    add_local_mass(&mut mass, weight, ws.basis.basis_values(), ws.basis.components());
                    let field_values = &ws.field_values;
                    add_local_load(
                        &mut load,
                        weight,
                        ws.basis.basis_values(),
                        ws.basis.components(),
                        |c| field_values[(c, q)],
                    );
                }

                let boundary_dofs = ws
                    .basis
                    .dofs()
                    .iter()
                    .map(|&dof| {
                        mapping
                            .boundary_index(dof)
                            .expect("Dofs of selected faces must be in the boundary dof mapping")
                    })
                    .collect::<Vec<_>>();
                Ok((boundary_dofs, mass, load))
            })
        })
        .collect::<Result<Vec<_>, TransferError>>()?;

    debug!(
        "Assembled boundary mass system for {} faces and {} boundary dofs",
        face_systems.len(),
        mapping.num_boundary_dofs()
    );

    let n = mapping.num_boundary_dofs();
    let (matrices, vectors): (Vec<_>, Vec<_>) = face_systems
        .into_iter()
        .map(|(dofs, mass, load)| ((dofs.clone(), mass), (dofs, load)))
        .unzip();
    Ok((
        scatter_element_matrices(n, mapping.max_couplings(), matrices),
        scatter_element_vectors(n, vectors),
    ))
}

/// Eliminates prescribed values from the linear system `A x = b`.
///
/// The row and column of every prescribed dof are cleared, its diagonal entry is set to one
/// and its right-hand side entry to the prescribed value. Coupling terms are moved to the
/// right-hand side of the remaining rows, so symmetry is preserved.
///
/// The sparsity pattern of the matrix must be structurally symmetric.
///
/// # Panics
///
/// Panics if the row of a prescribed dof has no explicitly stored diagonal entry.
pub fn apply_boundary_values<T: Real>(
    matrix: &mut CsrMatrix<T>,
    rhs: &mut DVector<T>,
    values: &PrescribedValues<T>,
) -> Result<(), TransferError> {
    let n = matrix.nrows();
    check_dimension(n, matrix.ncols())?;
    check_dimension(n, rhs.len())?;
    if let Some((&max_dof, _)) = values.iter().next_back() {
        if max_dof >= n {
            return Err(TransferError::DimensionMismatch {
                expected: n,
                actual: max_dof + 1,
            });
        }
    }

    let mut prescribed = vec![None; n];
    for (&dof, &value) in values {
        prescribed[dof] = Some(value);
    }

    // In order to clear the columns of prescribed dofs, we exploit the symmetric sparsity
    // pattern: if row i has an entry in column j, then row j has an entry in column i
    let mut rows_to_visit = vec![false; n];
    for (&dof, &value) in values {
        let mut row = matrix.row_mut(dof);
        let (cols, row_values) = row.cols_and_values_mut();
        let mut has_diagonal = false;
        for (&col, entry) in cols.iter().zip(row_values) {
            if col == dof {
                *entry = T::one();
                has_diagonal = true;
            } else {
                *entry = T::zero();
                rows_to_visit[col] = true;
            }
        }
        assert!(has_diagonal, "Row {} of prescribed dof must store its diagonal entry", dof);
        rhs[dof] = value;
    }

    let row_visit_iter = rows_to_visit
        .iter()
        .enumerate()
        .filter_map(|(index, &should_visit)| if should_visit { Some(index) } else { None });
    for row_index in row_visit_iter {
        if prescribed[row_index].is_none() {
            let mut row = matrix.row_mut(row_index);
            let (cols, row_values) = row.cols_and_values_mut();
            for (&col, entry) in cols.iter().zip(row_values) {
                if let Some(value) = prescribed[col] {
                    rhs[row_index] -= *entry * value;
                    *entry = T::zero();
                }
            }
        }
    }

    debug!("Eliminated {} prescribed dofs from system of dimension {}", values.len(), n);
    Ok(())
}
