//! Numerical helpers: SVD least squares, normal-matrix pseudo-inverse and
//! finite-difference Jacobians.

pub mod finite_diff;
pub mod ols;

pub use finite_diff::*;
pub use ols::*;
