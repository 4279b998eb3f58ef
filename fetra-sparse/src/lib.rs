//! Sparse linear solvers for the symmetric positive definite systems that arise in
//! L2 projection.
//!
//! The solver is a preconditioned conjugate gradient method working on any [`LinearOperator`],
//! and [`SsorPreconditioner`] provides symmetric successive over-relaxation for CSR matrices.

pub mod cg;
pub mod ssor;

pub use cg::{
    CgOutput, CgStoppingCriterion, CgWorkspace, ConjugateGradient, IdentityOperator, LinearOperator,
    RelativeResidualCriterion, SolveError, SolveErrorKind,
};
pub use ssor::{SsorError, SsorPreconditioner};
