//! Bridge to the `levenberg-marquardt` crate.
//!
//! The crate works on a `LeastSquaresProblem` that owns the current parameter
//! vector and hands out residuals and a Jacobian. Our problems are always
//! "residual closure + finite-difference Jacobian", so a single adapter covers
//! both fitting front-ends.

use std::cell::RefCell;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::AppError;
use crate::math::{JacobianKind, jacobian};
use crate::solver::options::LmSettings;

/// Residual function: parameters -> residual vector.
pub type ResidualFn<'a> = dyn Fn(&[f64]) -> Vec<f64> + Sync + 'a;

/// Result of a single minimization.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    /// Residuals at `params`.
    pub fvec: Vec<f64>,
    /// Finite-difference Jacobian at `params` (`None` if it could not be formed).
    pub jacobian: Option<DMatrix<f64>>,
    pub nfev: usize,
    pub status: Status,
}

/// Termination summary in MINPACK terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// 1-4: a solution was found. Anything else: it was not.
    pub ier: i32,
    pub mesg: String,
}

impl Status {
    pub fn success(&self) -> bool {
        (1..=4).contains(&self.ier)
    }

    fn from_termination(reason: &TerminationReason) -> Self {
        let (ier, mesg) = match reason {
            TerminationReason::Converged { ftol: true, xtol: true } => (
                3,
                "Both actual and predicted relative reductions in the sum of squares are at most \
                 ftol and the relative error between two consecutive iterates is at most xtol"
                    .to_string(),
            ),
            TerminationReason::Converged { xtol: true, .. } => (
                2,
                "The relative error between two consecutive iterates is at most xtol".to_string(),
            ),
            TerminationReason::Converged { .. } => (
                1,
                "Both actual and predicted relative reductions in the sum of squares are at most ftol"
                    .to_string(),
            ),
            TerminationReason::Orthogonal => (
                4,
                "The cosine of the angle between the residuals and any column of the Jacobian is \
                 at most gtol in absolute value"
                    .to_string(),
            ),
            TerminationReason::ResidualsZero => (1, "The residuals are exactly zero".to_string()),
            TerminationReason::LostPatience => (
                5,
                "Number of residual evaluations has reached the patience limit".to_string(),
            ),
            TerminationReason::User(what) => (
                0,
                format!("The {what} became non-finite; stopped at the last finite point"),
            ),
            other => (0, format!("Solver stopped without a solution: {other:?}")),
        };
        Self { ier, mesg }
    }
}

#[derive(Clone)]
struct ResidualProblem<'a> {
    residual: &'a ResidualFn<'a>,
    params: DVector<f64>,
    bounds: Option<&'a [(f64, f64)]>,
    jac: JacobianKind,
    /// Last parameter vector whose residuals were all finite.
    last_finite: RefCell<DVector<f64>>,
}

impl ResidualProblem<'_> {
    fn project(&mut self) {
        if let Some(bounds) = self.bounds {
            for (p, &(lo, hi)) in self.params.iter_mut().zip(bounds.iter()) {
                *p = p.clamp(lo, hi);
            }
        }
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for ResidualProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.copy_from(x);
        self.project();
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let r = (self.residual)(self.params.as_slice());
        // A `None` here ends the whole run, not just the trial step.
        if r.iter().all(|v| v.is_finite()) {
            self.last_finite.borrow_mut().copy_from(&self.params);
            Some(DVector::from_vec(r))
        } else {
            None
        }
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let p = self.params.as_slice();
        let base = (self.residual)(p);
        jacobian(|q| (self.residual)(q), p, &base, self.jac)
    }
}

/// Minimize `Σ r_i(p)²` starting from `p0`.
///
/// # Errors
/// - exit code 2 if `p0` is empty or does not match `bounds`
/// - exit code 4 if the residuals at `p0` are not finite
pub fn minimize(
    residual: &ResidualFn<'_>,
    p0: &[f64],
    bounds: Option<&[(f64, f64)]>,
    jac: JacobianKind,
    settings: &LmSettings,
) -> Result<LmOutcome, AppError> {
    if p0.is_empty() {
        return Err(AppError::invalid_input("No parameters to fit."));
    }
    if let Some(b) = bounds {
        if b.len() != p0.len() {
            return Err(AppError::invalid_input(format!(
                "Bounds length ({}) does not match parameter count ({}).",
                b.len(),
                p0.len()
            )));
        }
    }

    let initial = residual(p0);
    if initial.is_empty() {
        return Err(AppError::insufficient_data("No residuals to minimize."));
    }
    if initial.iter().any(|v| !v.is_finite()) {
        return Err(AppError::fit_failure("Residuals are not finite at the initial point."));
    }

    let mut problem = ResidualProblem {
        residual,
        params: DVector::from_column_slice(p0),
        bounds,
        jac,
        last_finite: RefCell::new(DVector::from_column_slice(p0)),
    };
    problem.project();
    problem.last_finite.replace(problem.params.clone());

    let solver = LevenbergMarquardt::new()
        .with_ftol(settings.ftol)
        .with_xtol(settings.xtol)
        .with_gtol(settings.gtol)
        .with_stepbound(settings.stepbound)
        .with_patience(settings.patience);

    let (problem, report) = solver.minimize(problem);
    let status = Status::from_termination(&report.termination);
    log::debug!(
        nfev = report.number_of_evaluations,
        ier = status.ier;
        "levenberg-marquardt finished: {:?}",
        report.termination
    );

    // The solver hands back the rejected trial point when residuals went
    // non-finite; fall back to the last point that evaluated cleanly.
    let params: Vec<f64> = match report.termination {
        TerminationReason::User(_) => problem.last_finite.borrow().iter().copied().collect(),
        _ => problem.params.iter().copied().collect(),
    };
    let fvec = residual(&params);
    if fvec.len() != initial.len() || fvec.iter().any(|v| !v.is_finite()) {
        return Err(AppError::fit_failure("Residuals are not finite at the solver's final point."));
    }
    let jacobian = jacobian(|q| residual(q), &params, &fvec, jac);

    Ok(LmOutcome {
        params,
        fvec,
        jacobian,
        nfev: report.number_of_evaluations,
        status,
    })
}
