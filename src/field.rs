//! Continuous fields that can be evaluated at arbitrary points.
use eyre::eyre;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrixViewMut, DefaultAllocator, DimName, OPoint, OVector, Scalar};
use std::fmt;

/// A (possibly vector-valued) field defined everywhere on a domain.
///
/// Implementors must provide point-wise evaluation. The list-based methods route through the
/// point-wise ones by default, and may be overridden when batched evaluation is cheaper.
/// Gradients are optional: the default implementation reports an error.
pub trait Field<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_components(&self) -> usize;

    /// Evaluates the given component of the field at the point.
    fn value(&self, point: &OPoint<T, D>, component: usize) -> eyre::Result<T>;

    /// Evaluates the gradient of the given component of the field at the point.
    fn gradient(&self, _point: &OPoint<T, D>, _component: usize) -> eyre::Result<OVector<T, D>> {
        Err(eyre!("Field does not provide gradients"))
    }

    /// Evaluates a single component at every point.
    ///
    /// # Panics
    ///
    /// Panics if `values` and `points` have different lengths.
    fn value_list(&self, points: &[OPoint<T, D>], values: &mut [T], component: usize) -> eyre::Result<()> {
        assert_eq!(points.len(), values.len(), "Must have one value per point");
        for (point, value) in points.iter().zip(values) {
            *value = self.value(point, component)?;
        }
        Ok(())
    }

    /// Evaluates all components at every point.
    ///
    /// Column `i` of the output holds the components of the field at point `i`.
    ///
    /// # Panics
    ///
    /// Panics if the output is not `num_components x points.len()`.
    fn vector_value_list(&self, points: &[OPoint<T, D>], mut values: DMatrixViewMut<T>) -> eyre::Result<()> {
        assert_eq!(values.shape(), (self.num_components(), points.len()));
        for (i, point) in points.iter().enumerate() {
            for c in 0..self.num_components() {
                values[(c, i)] = self.value(point, c)?;
            }
        }
        Ok(())
    }

    /// Evaluates the gradient of a single component at every point.
    fn gradient_list(
        &self,
        points: &[OPoint<T, D>],
        gradients: &mut [OVector<T, D>],
        component: usize,
    ) -> eyre::Result<()> {
        assert_eq!(points.len(), gradients.len(), "Must have one gradient per point");
        for (point, gradient) in points.iter().zip(gradients) {
            *gradient = self.gradient(point, component)?;
        }
        Ok(())
    }

    /// Evaluates the gradients of all components at every point.
    ///
    /// The gradient of component `c` at point `i` is stored at index `i * num_components + c`.
    fn vector_gradient_list(&self, points: &[OPoint<T, D>], gradients: &mut [OVector<T, D>]) -> eyre::Result<()> {
        let nc = self.num_components();
        assert_eq!(gradients.len(), nc * points.len(), "Must have one gradient per point and component");
        for (i, point) in points.iter().enumerate() {
            for c in 0..nc {
                gradients[nc * i + c] = self.gradient(point, c)?;
            }
        }
        Ok(())
    }
}

type ScalarFn<T, D> = Box<dyn Fn(&OPoint<T, D>) -> eyre::Result<T> + Send + Sync>;
type GradientFn<T, D> = Box<dyn Fn(&OPoint<T, D>) -> OVector<T, D> + Send + Sync>;
type VectorFn<T, D> = Box<dyn Fn(&OPoint<T, D>, &mut [T]) + Send + Sync>;
type VectorGradientFn<T, D> = Box<dyn Fn(&OPoint<T, D>, &mut [OVector<T, D>]) + Send + Sync>;

/// A single-component field given by closures.
pub struct ScalarField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    value: ScalarFn<T, D>,
    gradient: Option<GradientFn<T, D>>,
}

impl<T, D> ScalarField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(value: impl Fn(&OPoint<T, D>) -> T + Send + Sync + 'static) -> Self {
        Self::fallible(move |x| Ok(value(x)))
    }

    /// Creates a field whose evaluation may fail.
    pub fn fallible(value: impl Fn(&OPoint<T, D>) -> eyre::Result<T> + Send + Sync + 'static) -> Self {
        Self {
            value: Box::new(value),
            gradient: None,
        }
    }

    pub fn with_gradient(self, gradient: impl Fn(&OPoint<T, D>) -> OVector<T, D> + Send + Sync + 'static) -> Self {
        Self {
            value: self.value,
            gradient: Some(Box::new(gradient)),
        }
    }
}

impl<T, D> fmt::Debug for ScalarField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarField")
            .field("has_gradient", &self.gradient.is_some())
            .finish()
    }
}

impl<T, D> Field<T, D> for ScalarField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_components(&self) -> usize {
        1
    }

    fn value(&self, point: &OPoint<T, D>, component: usize) -> eyre::Result<T> {
        check_component(component, 1)?;
        (self.value)(point)
    }

    fn gradient(&self, point: &OPoint<T, D>, component: usize) -> eyre::Result<OVector<T, D>> {
        check_component(component, 1)?;
        let gradient = self
            .gradient
            .as_ref()
            .ok_or_else(|| eyre!("Scalar field was constructed without gradient"))?;
        Ok(gradient(point))
    }
}

/// A field with several components given by closures that evaluate all components at once.
pub struct VectorField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    num_components: usize,
    value: VectorFn<T, D>,
    gradient: Option<VectorGradientFn<T, D>>,
}

impl<T, D> VectorField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Creates a field with `num_components` components.
    ///
    /// The closure receives an output slice with one entry per component.
    pub fn new(num_components: usize, value: impl Fn(&OPoint<T, D>, &mut [T]) + Send + Sync + 'static) -> Self {
        assert!(num_components > 0, "Field must have at least one component");
        Self {
            num_components,
            value: Box::new(value),
            gradient: None,
        }
    }

    /// Adds gradients to the field.
    ///
    /// The closure receives an output slice with one gradient per component.
    pub fn with_gradient(
        self,
        gradient: impl Fn(&OPoint<T, D>, &mut [OVector<T, D>]) + Send + Sync + 'static,
    ) -> Self {
        Self {
            gradient: Some(Box::new(gradient)),
            ..self
        }
    }
}

impl<T, D> fmt::Debug for VectorField<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorField")
            .field("num_components", &self.num_components)
            .field("has_gradient", &self.gradient.is_some())
            .finish()
    }
}

impl<T, D> Field<T, D> for VectorField<T, D>
where
    T: Scalar + num::Zero,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_components(&self) -> usize {
        self.num_components
    }

    fn value(&self, point: &OPoint<T, D>, component: usize) -> eyre::Result<T> {
        check_component(component, self.num_components)?;
        let mut values = vec![T::zero(); self.num_components];
        (self.value)(point, &mut values);
        Ok(values.swap_remove(component))
    }

    fn gradient(&self, point: &OPoint<T, D>, component: usize) -> eyre::Result<OVector<T, D>> {
        check_component(component, self.num_components)?;
        let gradient = self
            .gradient
            .as_ref()
            .ok_or_else(|| eyre!("Vector field was constructed without gradient"))?;
        let mut gradients = vec![OVector::<T, D>::zeros(); self.num_components];
        gradient(point, &mut gradients);
        Ok(gradients.swap_remove(component))
    }

    fn vector_value_list(&self, points: &[OPoint<T, D>], mut values: DMatrixViewMut<T>) -> eyre::Result<()> {
        assert_eq!(values.shape(), (self.num_components, points.len()));
        let mut point_values = vec![T::zero(); self.num_components];
        for (i, point) in points.iter().enumerate() {
            (self.value)(point, &mut point_values);
            for (c, value) in point_values.iter().enumerate() {
                values[(c, i)] = value.clone();
            }
        }
        Ok(())
    }

    fn vector_gradient_list(&self, points: &[OPoint<T, D>], gradients: &mut [OVector<T, D>]) -> eyre::Result<()> {
        let nc = self.num_components;
        assert_eq!(gradients.len(), nc * points.len(), "Must have one gradient per point and component");
        let gradient = self
            .gradient
            .as_ref()
            .ok_or_else(|| eyre!("Vector field was constructed without gradient"))?;
        for (point, point_gradients) in points.iter().zip(gradients.chunks_exact_mut(nc)) {
            gradient(point, point_gradients);
        }
        Ok(())
    }
}

/// A field that takes the same value everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantField<T> {
    values: Vec<T>,
}

impl<T: Scalar> ConstantField<T> {
    pub fn scalar(value: T) -> Self {
        Self { values: vec![value] }
    }

    /// Creates a constant field with one component per entry.
    pub fn new(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "Field must have at least one component");
        Self { values }
    }
}

impl<T, D> Field<T, D> for ConstantField<T>
where
    T: Scalar + num::Zero,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_components(&self) -> usize {
        self.values.len()
    }

    fn value(&self, _point: &OPoint<T, D>, component: usize) -> eyre::Result<T> {
        check_component(component, self.values.len())?;
        Ok(self.values[component].clone())
    }

    fn gradient(&self, _point: &OPoint<T, D>, component: usize) -> eyre::Result<OVector<T, D>> {
        check_component(component, self.values.len())?;
        Ok(OVector::zeros())
    }
}

fn check_component(component: usize, num_components: usize) -> eyre::Result<()> {
    if component < num_components {
        Ok(())
    } else {
        Err(eyre!(
            "Component {} out of bounds for field with {} components",
            component,
            num_components
        ))
    }
}
