//! Reusable per-element buffers for basis functions and quadrature data.
use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::quadrature::Quadrature;
use crate::space::{BoundaryFunctionSpace, FunctionSpace};
use crate::{Real, SmallDim};
use itertools::izip;
use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DVectorView, DefaultAllocator, DimName, Dyn, MatrixView, MatrixViewMut, OMatrix, OPoint, OVector, Scalar};

/// Buffer for the dofs and basis functions of a single element or face.
#[derive(Debug)]
pub struct BasisFunctionBuffer<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    dofs: Vec<usize>,
    components: Vec<usize>,
    basis_values: Vec<T>,
    gradients: OMatrix<T, D, Dyn>,
}

impl<T, D> Default for BasisFunctionBuffer<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn default() -> Self {
        Self {
            dofs: Vec::new(),
            components: Vec::new(),
            basis_values: Vec::new(),
            gradients: OMatrix::<T, D, Dyn>::zeros(0),
        }
    }
}

impl<T, D> BasisFunctionBuffer<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn resize(&mut self, dof_count: usize) {
        self.dofs.resize(dof_count, usize::MAX);
        self.components.resize(dof_count, usize::MAX);
        self.basis_values.resize(dof_count, T::zero());
        self.gradients.resize_horizontally_mut(dof_count, T::zero());
    }

    /// Resizes the buffer and stores the global dofs and their components for the element.
    pub fn populate_element_dofs_from_space<Space>(&mut self, element_index: usize, space: &Space)
    where
        Space: FunctionSpace<T, GeometryDim = D>,
    {
        self.resize(space.element_dof_count(element_index));
        space.populate_element_dofs(&mut self.dofs, element_index);
        for (local_dof, component) in self.components.iter_mut().enumerate() {
            *component = space.element_dof_component(element_index, local_dof);
        }
    }

    /// Resizes the buffer and stores the global dofs and their components for the face.
    pub fn populate_face_dofs_from_space<Space>(&mut self, face_index: usize, space: &Space)
    where
        Space: BoundaryFunctionSpace<T, GeometryDim = D>,
        DefaultAllocator: BiDimAllocator<T, D, Space::FaceReferenceDim>,
    {
        self.resize(space.face_dof_count(face_index));
        space.populate_face_dofs(&mut self.dofs, face_index);
        for (local_dof, component) in self.components.iter_mut().enumerate() {
            *component = space.face_dof_component(face_index, local_dof);
        }
    }

    /// Evaluates the element basis. Must be called after
    /// [`populate_element_dofs_from_space`](Self::populate_element_dofs_from_space).
    pub fn populate_element_basis_values_from_space<Space>(
        &mut self,
        element_index: usize,
        space: &Space,
        reference_coords: &OPoint<T, D>,
    ) where
        Space: FunctionSpace<T, GeometryDim = D>,
    {
        space.populate_element_basis(element_index, &mut self.basis_values, reference_coords);
    }

    /// Evaluates physical basis gradients, given the inverse transposed Jacobian of the
    /// reference map at the same point.
    pub fn populate_element_gradients_from_space<Space>(
        &mut self,
        element_index: usize,
        space: &Space,
        reference_coords: &OPoint<T, D>,
        inverse_transposed_jacobian: &OMatrix<T, D, D>,
    ) where
        Space: FunctionSpace<T, GeometryDim = D>,
    {
        space.populate_element_gradients(element_index, MatrixViewMut::from(&mut self.gradients), reference_coords);
        for mut gradient in self.gradients.column_iter_mut() {
            let physical = inverse_transposed_jacobian * &gradient;
            gradient.copy_from(&physical);
        }
    }

    pub fn populate_face_basis_values_from_space<Space>(
        &mut self,
        face_index: usize,
        space: &Space,
        reference_coords: &OPoint<T, Space::FaceReferenceDim>,
    ) where
        Space: BoundaryFunctionSpace<T, GeometryDim = D>,
        DefaultAllocator: BiDimAllocator<T, D, Space::FaceReferenceDim>,
    {
        space.populate_face_basis(face_index, &mut self.basis_values, reference_coords);
    }

    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn components(&self) -> &[usize] {
        &self.components
    }

    pub fn basis_values(&self) -> &[T] {
        &self.basis_values
    }

    pub fn gradients(&self) -> MatrixView<T, D, Dyn> {
        MatrixView::from(&self.gradients)
    }

    /// Evaluates the discrete function with the given local coefficients at the current point.
    ///
    /// The result has one entry per component.
    pub fn interpolate_value(&self, local_coefficients: DVectorView<T>, values: &mut DVector<T>) {
        values.fill(T::zero());
        for (&c, &phi, &u) in izip!(&self.components, &self.basis_values, local_coefficients.iter()) {
            values[c] += phi * u;
        }
    }

    /// Evaluates the gradient of each component of the discrete function at the current point.
    pub fn interpolate_gradients(&self, local_coefficients: DVectorView<T>, gradients: &mut [OVector<T, D>]) {
        for gradient in gradients.iter_mut() {
            gradient.fill(T::zero());
        }
        for (local_dof, (&c, &u)) in self.components.iter().zip(local_coefficients.iter()).enumerate() {
            gradients[c] += self.gradients.column(local_dof) * u;
        }
    }
}

/// Buffer for quadrature points mapped to a single element or face.
#[derive(Debug)]
pub struct QuadratureBuffer<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    points: Vec<OPoint<T, D>>,
    weights: Vec<T>,
    inverse_transposed_jacobians: Vec<OMatrix<T, D, D>>,
}

impl<T, D> Default for QuadratureBuffer<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D> + Allocator<T, D, D>,
{
    fn default() -> Self {
        Self {
            points: Vec::new(),
            weights: Vec::new(),
            inverse_transposed_jacobians: Vec::new(),
        }
    }
}

impl<T, D> QuadratureBuffer<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Maps the quadrature rule to the element.
    ///
    /// Stores the physical points, the weights scaled by the Jacobian determinant and the
    /// inverse transposed Jacobians.
    pub fn populate_element_quadrature_from_space<Space>(
        &mut self,
        element_index: usize,
        space: &Space,
        quadrature: &impl Quadrature<T, D>,
    ) where
        Space: FunctionSpace<T, GeometryDim = D>,
    {
        self.points.clear();
        self.weights.clear();
        self.inverse_transposed_jacobians.clear();
        for (&w, xi) in quadrature.weights().iter().zip(quadrature.points()) {
            let jacobian = space.element_reference_jacobian(element_index, xi);
            // Degenerate elements have zero measure, so their gradients never contribute
            let inverse_transposed = jacobian
                .clone()
                .try_inverse()
                .map(|j_inv| j_inv.transpose())
                .unwrap_or_else(OMatrix::<T, D, D>::zeros);
            self.points
                .push(space.map_element_reference_coords(element_index, xi));
            self.weights.push(w * jacobian.determinant().abs());
            self.inverse_transposed_jacobians.push(inverse_transposed);
        }
    }

    /// Maps the quadrature rule to the face, storing physical points and scaled weights.
    pub fn populate_face_quadrature_from_space<Space>(
        &mut self,
        face_index: usize,
        space: &Space,
        quadrature: &impl Quadrature<T, Space::FaceReferenceDim>,
    ) where
        Space: BoundaryFunctionSpace<T, GeometryDim = D>,
        DefaultAllocator: BiDimAllocator<T, D, Space::FaceReferenceDim>,
    {
        self.points.clear();
        self.weights.clear();
        self.inverse_transposed_jacobians.clear();
        for (&w, xi) in quadrature.weights().iter().zip(quadrature.points()) {
            self.points
                .push(space.map_face_reference_coords(face_index, xi));
            self.weights
                .push(w * space.face_measure_scale(face_index, xi));
        }
    }

    pub fn points(&self) -> &[OPoint<T, D>] {
        &self.points
    }

    /// Quadrature weights multiplied by the measure scale of the reference map.
    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    /// Only populated for element quadrature.
    pub fn inverse_transposed_jacobians(&self) -> &[OMatrix<T, D, D>] {
        &self.inverse_transposed_jacobians
    }
}
