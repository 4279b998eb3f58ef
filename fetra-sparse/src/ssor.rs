//! Symmetric successive over-relaxation (SSOR) preconditioning for CSR matrices.
use crate::cg::{LinearOperator, OperatorError};
use core::fmt;
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField};
use nalgebra_sparse::CsrMatrix;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SsorError {
    NonSquareMatrix { nrows: usize, ncols: usize },
    InvalidRelaxation,
    NonPositiveDiagonal { row: usize },
}

impl fmt::Display for SsorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonSquareMatrix { nrows, ncols } => {
                write!(f, "SSOR requires a square matrix, got {}x{}.", nrows, ncols)
            }
            Self::InvalidRelaxation => write!(f, "SSOR relaxation factor must lie in the open interval (0, 2)."),
            Self::NonPositiveDiagonal { row } => {
                write!(f, "SSOR requires a positive diagonal, but row {} has none.", row)
            }
        }
    }
}

impl std::error::Error for SsorError {}

/// SSOR preconditioner for a symmetric matrix `A = L + D + L^T`.
///
/// Applying the preconditioner computes `y = M^{-1} x` with
/// `M = ω / (2 - ω) (D / ω + L) D^{-1} (D / ω + L^T)`,
/// by one forward and one backward triangular sweep over the CSR rows.
#[derive(Debug)]
pub struct SsorPreconditioner<'a, T: RealField> {
    matrix: &'a CsrMatrix<T>,
    diagonal: DVector<T>,
    omega: T,
}

impl<'a, T: RealField + Copy> SsorPreconditioner<'a, T> {
    pub fn new(matrix: &'a CsrMatrix<T>, omega: T) -> Result<Self, SsorError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SsorError::NonSquareMatrix {
                nrows: matrix.nrows(),
                ncols: matrix.ncols(),
            });
        }

        let two = T::one() + T::one();
        if !(omega > T::zero() && omega < two) {
            return Err(SsorError::InvalidRelaxation);
        }

        let mut diagonal = DVector::zeros(matrix.nrows());
        for (i, row) in matrix.row_iter().enumerate() {
            let d_i = row
                .col_indices()
                .iter()
                .zip(row.values())
                .find(|(j, _)| **j == i)
                .map(|(_, v)| *v)
                .unwrap_or_else(T::zero);
            if d_i <= T::zero() {
                return Err(SsorError::NonPositiveDiagonal { row: i });
            }
            diagonal[i] = d_i;
        }

        Ok(Self {
            matrix,
            diagonal,
            omega,
        })
    }
}

impl<'a, T: RealField + Copy> LinearOperator<T> for SsorPreconditioner<'a, T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        let n = self.diagonal.len();
        if x.len() != n || y.len() != n {
            return Err(format!(
                "SSOR preconditioner of dimension {} applied to vectors of length {} and {}",
                n,
                x.len(),
                y.len()
            )
            .into());
        }

        let omega = self.omega;
        let two = T::one() + T::one();
        let scale = (two - omega) / omega;

        // Forward sweep: (D / ω + L) w = x
        for (i, row) in self.matrix.row_iter().enumerate() {
            let mut sum = x[i];
            for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
                if j < i {
                    sum -= a_ij * y[j];
                }
            }
            y[i] = sum * omega / self.diagonal[i];
        }

        // v = (2 - ω) / ω D w
        for i in 0..n {
            y[i] *= scale * self.diagonal[i];
        }

        // Backward sweep: (D / ω + L^T) y = v
        for i in (0..n).rev() {
            let row = self.matrix.row(i);
            let mut sum = y[i];
            for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
                if j > i {
                    sum -= a_ij * y[j];
                }
            }
            y[i] = sum * omega / self.diagonal[i];
        }

        Ok(())
    }
}
