//! Transfer of fields between continuous functions and finite element spaces.
//!
//! The crate provides pointwise interpolation of a field onto a discrete function space,
//! L2-optimal projection (optionally with prescribed boundary values and affine constraints),
//! extraction of boundary values and per-element error norms of a discrete solution measured
//! against a reference field.
//!
//! The algorithms are written against the [`space::FunctionSpace`] and
//! [`space::BoundaryFunctionSpace`] traits. [`space::LagrangeSpace`] is a linear Lagrange
//! space over a [`mesh::Mesh`] implementing both.
use nalgebra::{DimMin, DimName, RealField};

pub mod allocators;
pub mod assembly;
pub mod boundary;
pub mod connectivity;
pub mod constraints;
pub mod element;
pub mod error;
pub mod estimate;
pub mod field;
pub mod interpolate;
pub mod mesh;
pub mod projection;
pub mod quadrature;
pub mod space;
pub mod util;

pub use error::TransferError;

pub extern crate eyre;
pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Floating-point scalar type used throughout the crate.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic `fetra` routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
