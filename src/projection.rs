//! L2-optimal projection of fields onto function spaces.
use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::assembly::{apply_boundary_values, assemble_load_vector, assemble_mass_matrix};
use crate::boundary::{project_boundary_values, zero_boundary_values, BoundaryFunctions, ComponentMask, PrescribedValues};
use crate::constraints::ConstraintSet;
use crate::error::check_components;
use crate::field::Field;
use crate::quadrature::Quadrature;
use crate::space::{BoundaryFunctionSpace, FunctionSpace};
use crate::{Real, TransferError};
use fetra_sparse::{ConjugateGradient, RelativeResidualCriterion, SsorPreconditioner};
use log::{debug, info};
use nalgebra::{DVector, DefaultAllocator, DimName};
use nalgebra_sparse::CsrMatrix;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Parameters of the linear solve in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Real + Deserialize<'de>"))]
pub struct ProjectionSettings<T> {
    /// Relaxation factor of the SSOR preconditioner, in the open interval `(0, 2)`.
    pub relaxation: T,
    /// Relative residual tolerance of the conjugate gradient solver.
    pub tolerance: T,
    /// The solve fails if the tolerance is not reached within this number of iterations.
    pub max_iterations: usize,
}

impl<T: Real> Default for ProjectionSettings<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self {
            relaxation: 1.2,
            tolerance: 1e-16,
            max_iterations: 1000,
        }
    }
}

/// Solves `M x = b` with SSOR-preconditioned conjugate gradients.
pub fn solve_mass_system<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    settings: &ProjectionSettings<T>,
) -> Result<DVector<T>, TransferError> {
    let preconditioner = SsorPreconditioner::new(matrix, settings.relaxation)?;
    let mut solution = DVector::zeros(rhs.len());
    let output = ConjugateGradient::new()
        .with_operator(matrix)
        .with_preconditioner(&preconditioner)
        .with_stopping_criterion(RelativeResidualCriterion::new(settings.tolerance))
        .with_max_iter(settings.max_iterations)
        .solve_with_guess(rhs, &mut solution)?;
    debug!(
        "Solved system of dimension {} in {} CG iterations",
        rhs.len(),
        output.num_iterations
    );
    Ok(solution)
}

/// L2 projection of fields onto a function space, subject to constraints.
///
/// The projection `u_h` satisfies `(u_h, v) = (f, v)` for every `v` in the space, with the
/// dofs of `u_h` honoring the constraints and any prescribed boundary values.
#[derive(Debug)]
pub struct L2Projection<'a, T, Space, C = ()> {
    space: &'a Space,
    constraints: &'a C,
    settings: ProjectionSettings<T>,
}

impl<'a, T, Space, C> L2Projection<'a, T, Space, C>
where
    T: Real,
    Space: FunctionSpace<T> + Sync,
    C: ConstraintSet<T>,
    DefaultAllocator: DimAllocator<T, Space::GeometryDim>,
{
    pub fn new(space: &'a Space, constraints: &'a C) -> Self {
        Self {
            space,
            constraints,
            settings: ProjectionSettings::default(),
        }
    }

    pub fn with_settings(self, settings: ProjectionSettings<T>) -> Self {
        Self { settings, ..self }
    }

    pub fn settings(&self) -> &ProjectionSettings<T> {
        &self.settings
    }

    fn check_preconditions<F>(&self, field: &F) -> Result<(), TransferError>
    where
        F: ?Sized + Field<T, Space::GeometryDim>,
    {
        check_components(self.space.num_components(), field.num_components())?;
        if Space::GeometryDim::dim() == 1 {
            return Err(TransferError::NotImplemented("L2 projection in one dimension"));
        }
        Ok(())
    }

    /// Projects the field without prescribing boundary values.
    pub fn project<F, Q>(&self, quadrature: &Q, field: &F) -> Result<DVector<T>, TransferError>
    where
        F: ?Sized + Field<T, Space::GeometryDim> + Sync,
        Q: Quadrature<T, Space::GeometryDim> + Sync,
    {
        self.check_preconditions(field)?;
        self.project_with_values(quadrature, field, &PrescribedValues::new())
    }

    /// Projects the field with the given prescribed values.
    pub fn project_with_values<F, Q>(
        &self,
        quadrature: &Q,
        field: &F,
        values: &PrescribedValues<T>,
    ) -> Result<DVector<T>, TransferError>
    where
        F: ?Sized + Field<T, Space::GeometryDim> + Sync,
        Q: Quadrature<T, Space::GeometryDim> + Sync,
    {
        self.check_preconditions(field)?;

        let mass = assemble_mass_matrix(self.space, quadrature)?;
        let mut rhs = assemble_load_vector(self.space, field, quadrature)?;

        let mut matrix = self.constraints.condense_matrix(mass);
        self.constraints.condense_vector(&mut rhs);
        apply_boundary_values(&mut matrix, &mut rhs, values)?;

        let mut solution = solve_mass_system(&matrix, &rhs, &self.settings)?;
        self.constraints.distribute(&mut solution);

        info!(
            "Projected field onto {} dofs with {} prescribed values",
            self.space.num_dofs(),
            values.len()
        );
        Ok(solution)
    }
}

impl<'a, T, Space, C> L2Projection<'a, T, Space, C>
where
    T: Real,
    Space: BoundaryFunctionSpace<T> + Sync,
    C: ConstraintSet<T>,
    DefaultAllocator: BiDimAllocator<T, Space::GeometryDim, Space::FaceReferenceDim>,
{
    /// Projects the field with all components set to zero on the whole boundary.
    pub fn project_with_zero_boundary<F, Q>(&self, quadrature: &Q, field: &F) -> Result<DVector<T>, TransferError>
    where
        F: ?Sized + Field<T, Space::GeometryDim> + Sync,
        Q: Quadrature<T, Space::GeometryDim> + Sync,
    {
        self.check_preconditions(field)?;
        let values = zero_boundary_values(self.space, &ComponentMask::all(self.space.num_components()))?;
        self.project_with_values(quadrature, field, &values)
    }

    /// Projects the field with boundary values given by the L2 projection of the field onto
    /// the trace of the space on every part of the boundary.
    pub fn project_with_boundary_trace<F, Q, FaceQ>(
        &self,
        quadrature: &Q,
        face_quadrature: &FaceQ,
        field: &F,
    ) -> Result<DVector<T>, TransferError>
    where
        F: Field<T, Space::GeometryDim> + Sync,
        Q: Quadrature<T, Space::GeometryDim> + Sync,
        FaceQ: Quadrature<T, Space::FaceReferenceDim> + Sync,
    {
        self.check_preconditions(field)?;

        let mut indicators: Vec<_> = (0..self.space.num_faces())
            .filter_map(|face_index| self.space.face_boundary(face_index))
            .collect();
        indicators.sort_unstable();
        indicators.dedup();
        let boundary_functions: BoundaryFunctions<T, Space::GeometryDim> = indicators
            .into_iter()
            .map(|indicator| (indicator, field as &(dyn Field<T, Space::GeometryDim> + Sync)))
            .collect();

        let values = project_boundary_values(self.space, &boundary_functions, face_quadrature, &self.settings)?;
        self.project_with_values(quadrature, field, &values)
    }
}
