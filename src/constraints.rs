//! Affine constraints between dofs, eliminated before solving and restored afterwards.
use crate::{Real, TransferError};
use nalgebra::{DVector, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::BTreeMap;

/// A set of constraints that can be condensed into a linear system and distributed to its
/// solution.
pub trait ConstraintSet<T: Scalar> {
    /// Condenses the constraints into the system matrix.
    fn condense_matrix(&self, matrix: CsrMatrix<T>) -> CsrMatrix<T>;

    /// Condenses the constraints into the right-hand side.
    fn condense_vector(&self, rhs: &mut DVector<T>);

    /// Computes the values of constrained dofs from the values of the dofs they depend on.
    fn distribute(&self, solution: &mut DVector<T>);
}

/// No constraints.
impl<T: Scalar> ConstraintSet<T> for () {
    fn condense_matrix(&self, matrix: CsrMatrix<T>) -> CsrMatrix<T> {
        matrix
    }

    fn condense_vector(&self, _rhs: &mut DVector<T>) {}

    fn distribute(&self, _solution: &mut DVector<T>) {}
}

/// Homogeneous affine constraints `x_k = Σ_j w_kj x_j`.
///
/// Typical uses are hanging node constraints and periodic boundary conditions. Constrained
/// dofs may only depend on unconstrained dofs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AffineConstraints<T> {
    lines: BTreeMap<usize, Vec<(usize, T)>>,
}

impl<T: Real> AffineConstraints<T> {
    pub fn new() -> Self {
        Self { lines: BTreeMap::new() }
    }

    /// Constrains `dof` to the weighted sum of the given `(dof, weight)` entries.
    ///
    /// Replaces any previous line for the same dof.
    ///
    /// # Errors
    ///
    /// Constraints that depend on other constrained dofs (including the dof itself) are not
    /// supported and return [`TransferError::NotImplemented`].
    pub fn add_line(&mut self, dof: usize, entries: Vec<(usize, T)>) -> Result<(), TransferError> {
        let depends_on_constrained = entries
            .iter()
            .any(|(master, _)| *master == dof || self.lines.contains_key(master));
        let is_master = self
            .lines
            .values()
            .flatten()
            .any(|(master, _)| *master == dof);
        if depends_on_constrained || is_master {
            return Err(TransferError::NotImplemented("chained constraints"));
        }
        self.lines.insert(dof, entries);
        Ok(())
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.lines.contains_key(&dof)
    }

    pub fn num_constraints(&self) -> usize {
        self.lines.len()
    }

    /// The `(dof, weight)` pairs a dof expands into: its line if constrained, itself otherwise.
    fn expand(&self, dof: usize) -> Vec<(usize, T)> {
        self.lines
            .get(&dof)
            .cloned()
            .unwrap_or_else(|| vec![(dof, T::one())])
    }
}

impl<T: Real> ConstraintSet<T> for AffineConstraints<T> {
    /// Computes `C^T A C`, where `C` maps unconstrained dofs to all dofs.
    ///
    /// Rows and columns of constrained dofs are cleared, keeping only the original diagonal
    /// entry (or one, if it was zero), so that the condensed matrix stays non-singular.
    fn condense_matrix(&self, matrix: CsrMatrix<T>) -> CsrMatrix<T> {
        if self.lines.is_empty() {
            return matrix;
        }

        let mut coo = CooMatrix::new(matrix.nrows(), matrix.ncols());
        let mut constrained_diagonal = BTreeMap::new();
        for (i, row) in matrix.row_iter().enumerate() {
            let expanded_row = self.expand(i);
            for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
                if i == j && self.is_constrained(i) {
                    constrained_diagonal.insert(i, a_ij);
                }
                for &(k, w_ik) in &expanded_row {
                    for (l, w_jl) in self.expand(j) {
                        coo.push(k, l, w_ik * w_jl * a_ij);
                    }
                }
            }
        }

        for &dof in self.lines.keys() {
            let diagonal = constrained_diagonal
                .get(&dof)
                .copied()
                .filter(|d| *d != T::zero())
                .unwrap_or_else(T::one);
            coo.push(dof, dof, diagonal);
        }

        CsrMatrix::from(&coo)
    }

    fn condense_vector(&self, rhs: &mut DVector<T>) {
        for (&dof, entries) in &self.lines {
            let value = rhs[dof];
            for &(master, weight) in entries {
                rhs[master] += weight * value;
            }
            rhs[dof] = T::zero();
        }
    }

    fn distribute(&self, solution: &mut DVector<T>) {
        for (&dof, entries) in &self.lines {
            solution[dof] = entries
                .iter()
                .fold(T::zero(), |sum, &(master, weight)| sum + weight * solution[master]);
        }
    }
}
