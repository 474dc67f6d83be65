//! `curve_fit`: fit `y ≈ f(x; p)` by non-linear least squares.
//!
//! The return shape depends on `full_output`:
//! - `false`: optimal parameters and their covariance only
//! - `true`: additionally the residuals at the optimum, the evaluation count,
//!   a status message and a MINPACK-style status code
//!
//! Failure policy:
//! - without `full_output`, a fit that did not converge is an error
//! - with `full_output`, it is reported through `ier`/`mesg` so the caller can
//!   still inspect the residuals

use nalgebra::DMatrix;

use crate::error::AppError;
use crate::models::ModelFunction;
use crate::solver::lm::{LmOutcome, minimize};
use crate::solver::options::{CurveFitOptions, LmSettings, Method, NanPolicy};

/// Extended solver output (present when `full_output` was requested).
#[derive(Debug, Clone, PartialEq)]
pub struct FullOutput {
    pub infodict: InfoDict,
    pub mesg: String,
    /// 1-4 on success.
    pub ier: i32,
}

impl FullOutput {
    pub fn success(&self) -> bool {
        (1..=4).contains(&self.ier)
    }
}

/// Diagnostic fields of the extended output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoDict {
    /// Number of residual evaluations.
    pub nfev: usize,
    /// Residuals `(f(x_i; popt) - y_i) / sigma_i` at the optimum.
    pub fvec: Vec<f64>,
    /// Filled in by `augment::curve_fit`.
    pub aic: Option<f64>,
    /// Filled in by `augment::curve_fit`.
    pub aicc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveFitOutput {
    pub popt: Vec<f64>,
    /// Parameter covariance; all `+inf` when it cannot be estimated.
    pub pcov: DMatrix<f64>,
    pub full: Option<FullOutput>,
}

impl CurveFitOutput {
    /// One-standard-deviation parameter errors, `sqrt(diag(pcov))`.
    pub fn perr(&self) -> Vec<f64> {
        self.pcov.diagonal().iter().map(|v| v.sqrt()).collect()
    }
}

/// Fit `model` to `(xdata, ydata)`.
///
/// # Errors
/// - exit code 2: mismatched lengths, invalid `p0`/`sigma`/`bounds`, NaN or
///   infinite input (per `nan_policy` / `check_finite`), unknown solver options
/// - exit code 3: fewer observations than parameters
/// - exit code 4: non-finite residuals at `p0`; no convergence without
///   `full_output`
pub fn curve_fit(
    model: &dyn ModelFunction,
    xdata: &[f64],
    ydata: &[f64],
    options: &CurveFitOptions,
) -> Result<CurveFitOutput, AppError> {
    let settings = match options.method {
        Method::Lm => LmSettings::from_extra(&options.extra)?,
    };

    if xdata.len() != ydata.len() {
        return Err(AppError::invalid_input(format!(
            "xdata and ydata lengths differ ({} vs {}).",
            xdata.len(),
            ydata.len()
        )));
    }
    if let Some(sigma) = &options.sigma {
        if sigma.len() != ydata.len() {
            return Err(AppError::invalid_input(format!(
                "sigma length ({}) does not match ydata length ({}).",
                sigma.len(),
                ydata.len()
            )));
        }
    }

    let (x, y, sigma) = clean_inputs(xdata, ydata, options.sigma.as_deref(), options)?;

    let p = model.n_params();
    let p0 = match &options.p0 {
        Some(p0) => p0.clone(),
        None => vec![1.0; p],
    };
    if p0.len() != p {
        return Err(AppError::invalid_input(format!(
            "Initial guess has {} values but model '{}' has {} parameters.",
            p0.len(),
            model.name(),
            p
        )));
    }
    if p0.iter().any(|v| !v.is_finite()) {
        return Err(AppError::invalid_input("Initial guess must be finite."));
    }

    let n = y.len();
    if n < p {
        return Err(AppError::insufficient_data(format!(
            "Improper input: {p} parameters cannot be fitted to {n} observations."
        )));
    }

    if let Some(bounds) = &options.bounds {
        validate_bounds(bounds, &p0)?;
    }

    let residual = |params: &[f64]| -> Vec<f64> {
        x.iter()
            .zip(y.iter())
            .zip(sigma.iter())
            .map(|((&xi, &yi), &si)| (model.eval(xi, params) - yi) / si)
            .collect()
    };

    let outcome = minimize(&residual, &p0, options.bounds.as_deref(), options.jac, &settings)?;
    let pcov = covariance(&outcome, n, p, options.absolute_sigma);

    if !outcome.status.success() {
        if !options.full_output {
            return Err(AppError::fit_failure(format!(
                "Optimal parameters not found: {}",
                outcome.status.mesg
            )));
        }
        log::warn!(model = model.name(), ier = outcome.status.ier; "fit did not converge: {}", outcome.status.mesg);
    }

    let LmOutcome {
        params,
        fvec,
        nfev,
        status,
        ..
    } = outcome;

    let full = options.full_output.then(|| FullOutput {
        infodict: InfoDict {
            nfev,
            fvec,
            aic: None,
            aicc: None,
        },
        mesg: status.mesg,
        ier: status.ier,
    });

    Ok(CurveFitOutput {
        popt: params,
        pcov,
        full,
    })
}

/// Apply `nan_policy` and `check_finite`; returns owned `(x, y, sigma)`.
fn clean_inputs(
    xdata: &[f64],
    ydata: &[f64],
    sigma: Option<&[f64]>,
    options: &CurveFitOptions,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), AppError> {
    let sigma_at = |i: usize| sigma.map(|s| s[i]).unwrap_or(1.0);

    let mut x = Vec::with_capacity(xdata.len());
    let mut y = Vec::with_capacity(ydata.len());
    let mut s = Vec::with_capacity(ydata.len());
    let mut omitted = 0usize;

    for i in 0..ydata.len() {
        let (xi, yi, si) = (xdata[i], ydata[i], sigma_at(i));
        if xi.is_nan() || yi.is_nan() || si.is_nan() {
            match options.nan_policy {
                NanPolicy::Omit => {
                    omitted += 1;
                    continue;
                }
                NanPolicy::Raise => {
                    return Err(AppError::invalid_input(format!(
                        "Input contains NaN at index {i} (use nan_policy=omit to drop it)."
                    )));
                }
            }
        }
        if options.check_finite && !(xi.is_finite() && yi.is_finite()) {
            return Err(AppError::invalid_input(format!(
                "Input contains infinite values at index {i}."
            )));
        }
        if !(si.is_finite() && si > 0.0) {
            return Err(AppError::invalid_input(format!(
                "sigma must be finite and > 0, got {si} at index {i}."
            )));
        }
        x.push(xi);
        y.push(yi);
        s.push(si);
    }

    if omitted > 0 {
        log::debug!(omitted = omitted; "dropped observations containing NaN");
    }
    if y.is_empty() {
        return Err(AppError::insufficient_data("No observations to fit."));
    }
    Ok((x, y, s))
}

fn validate_bounds(bounds: &[(f64, f64)], p0: &[f64]) -> Result<(), AppError> {
    if bounds.len() != p0.len() {
        return Err(AppError::invalid_input(format!(
            "Bounds length ({}) does not match parameter count ({}).",
            bounds.len(),
            p0.len()
        )));
    }
    for (i, (&(lo, hi), &v)) in bounds.iter().zip(p0.iter()).enumerate() {
        if lo.is_nan() || hi.is_nan() || lo >= hi {
            return Err(AppError::invalid_input(format!(
                "Invalid bounds for parameter {i}: lower ({lo}) must be < upper ({hi})."
            )));
        }
        if v < lo || v > hi {
            return Err(AppError::invalid_input(format!(
                "Initial guess for parameter {i} ({v}) is outside its bounds [{lo}, {hi}]."
            )));
        }
    }
    Ok(())
}

/// `pinv(JᵀJ)`, scaled by `RSS / (n - p)` unless sigma is absolute.
///
/// Falls back to a matrix of `+inf` when the Jacobian is unavailable or when
/// the scaling is undefined (`n <= p`).
fn covariance(outcome: &LmOutcome, n: usize, p: usize, absolute_sigma: bool) -> DMatrix<f64> {
    let infinite = || DMatrix::from_element(p, p, f64::INFINITY);

    let Some(pcov) = outcome
        .jacobian
        .as_ref()
        .and_then(crate::math::normal_pseudo_inverse)
    else {
        log::warn!("covariance of the parameters could not be estimated");
        return infinite();
    };

    if absolute_sigma {
        return pcov;
    }
    if n <= p {
        log::warn!(n = n, p = p; "covariance undefined without residual degrees of freedom");
        return infinite();
    }
    let s_sq = crate::score::rss(&outcome.fvec) / (n - p) as f64;
    pcov * s_sq
}
