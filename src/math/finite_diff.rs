//! Finite-difference Jacobians of a vector-valued residual function.
//!
//! The residual function maps a parameter vector `p` (length `n`) to residuals
//! `r(p)` (length `m`); the Jacobian is the `m x n` matrix `∂r_i/∂p_j`.
//!
//! Step sizes follow the usual scaling: `h_j = c * max(|p_j|, 1)` with
//! `c = sqrt(eps)` for forward differences and `c = cbrt(eps)` for central
//! differences.

use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::Serialize;

/// Finite-difference scheme for the Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
pub enum JacobianKind {
    /// Forward differences, one extra residual evaluation per parameter.
    #[default]
    #[serde(rename = "2-point")]
    #[value(name = "2-point")]
    TwoPoint,
    /// Central differences, two extra evaluations per parameter.
    #[serde(rename = "3-point")]
    #[value(name = "3-point")]
    ThreePoint,
}

/// Approximate the Jacobian of `residual` at `params`.
///
/// `base` is `residual(params)`, passed in because callers always have it.
/// Returns `None` if any perturbed evaluation produces non-finite values or a
/// residual vector of the wrong length.
pub fn jacobian<F>(residual: F, params: &[f64], base: &[f64], kind: JacobianKind) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let m = base.len();
    let n = params.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut work = params.to_vec();

    for j in 0..n {
        let p_j = params[j];
        match kind {
            JacobianKind::TwoPoint => {
                let h = f64::EPSILON.sqrt() * p_j.abs().max(1.0);
                work[j] = p_j + h;
                let fwd = residual(&work);
                if fwd.len() != m {
                    return None;
                }
                // Use the step actually representable in floating point.
                let step = work[j] - p_j;
                for i in 0..m {
                    jac[(i, j)] = (fwd[i] - base[i]) / step;
                }
            }
            JacobianKind::ThreePoint => {
                let h = f64::EPSILON.cbrt() * p_j.abs().max(1.0);
                work[j] = p_j + h;
                let fwd = residual(&work);
                work[j] = p_j - h;
                let bwd = residual(&work);
                if fwd.len() != m || bwd.len() != m {
                    return None;
                }
                for i in 0..m {
                    jac[(i, j)] = (fwd[i] - bwd[i]) / (2.0 * h);
                }
            }
        }
        work[j] = p_j;
    }

    if jac.iter().all(|v| v.is_finite()) {
        Some(jac)
    } else {
        None
    }
}
