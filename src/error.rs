//! The error type shared by all transfer operations.
use fetra_sparse::{SolveError, SsorError};
use std::fmt;

/// Error returned by interpolation, projection, boundary value extraction and error estimation.
#[derive(Debug)]
#[non_exhaustive]
pub enum TransferError {
    /// A field, mask or space does not have the expected number of components.
    ComponentMismatch { expected: usize, actual: usize },
    /// The reserved indicator value `255` was used as a boundary indicator.
    InvalidBoundaryIndicator,
    /// A component mask selects no component.
    EmptyComponentMask,
    /// The requested norm carries no information for the given space.
    NotUseful,
    /// A selection passed to [`subtract_mean_value`](crate::util::subtract_mean_value) is empty.
    EmptySelection,
    /// A vector or matrix does not have the expected size.
    DimensionMismatch { expected: usize, actual: usize },
    /// The operation is not available for the given configuration.
    NotImplemented(&'static str),
    /// The relaxation preconditioner could not be constructed.
    Preconditioner(SsorError),
    /// The linear solver failed, typically because the iteration cap was reached.
    SolverNonconvergence(SolveError),
    /// Evaluating a field failed.
    Field(eyre::Report),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComponentMismatch { expected, actual } => {
                write!(f, "Expected {} components, but got {}.", expected, actual)
            }
            Self::InvalidBoundaryIndicator => {
                write!(f, "Boundary indicator 255 is reserved and cannot be used.")
            }
            Self::EmptyComponentMask => write!(f, "Component mask does not select any component."),
            Self::NotUseful => write!(f, "The requested norm is not useful for this function space."),
            Self::EmptySelection => write!(f, "Selection does not contain any entries."),
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "Expected dimension {}, but got {}.", expected, actual)
            }
            Self::NotImplemented(what) => write!(f, "Not implemented: {}.", what),
            Self::Preconditioner(err) => {
                write!(f, "Failed to construct preconditioner: ")?;
                err.fmt(f)
            }
            Self::SolverNonconvergence(err) => {
                write!(f, "Linear solver did not converge: ")?;
                err.fmt(f)
            }
            Self::Field(err) => {
                write!(f, "Field evaluation failed: ")?;
                err.fmt(f)
            }
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Preconditioner(err) => Some(err),
            Self::SolverNonconvergence(err) => Some(err),
            Self::Field(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<eyre::Report> for TransferError {
    fn from(report: eyre::Report) -> Self {
        Self::Field(report)
    }
}

impl From<SolveError> for TransferError {
    fn from(err: SolveError) -> Self {
        Self::SolverNonconvergence(err)
    }
}

impl From<SsorError> for TransferError {
    fn from(err: SsorError) -> Self {
        Self::Preconditioner(err)
    }
}

/// Checks that `actual` components were supplied where `expected` are required.
pub(crate) fn check_components(expected: usize, actual: usize) -> Result<(), TransferError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TransferError::ComponentMismatch { expected, actual })
    }
}

/// Checks that a vector of length `actual` matches the expected length.
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<(), TransferError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TransferError::DimensionMismatch { expected, actual })
    }
}
