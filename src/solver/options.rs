//! Options accepted by `curve_fit`.
//!
//! Every recognised option is a named field. Solver tuning that only makes
//! sense for the Levenberg-Marquardt backend goes through the `extra` map and
//! is validated into `LmSettings`; unknown keys are rejected instead of being
//! silently ignored.

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::math::JacobianKind;

/// Optimization method. Only Levenberg-Marquardt is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Lm,
}

/// What to do with NaN observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Reject input containing NaN.
    #[default]
    Raise,
    /// Drop observations whose `x`, `y` or `sigma` is NaN before fitting.
    Omit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveFitOptions {
    /// Initial guess. Defaults to all ones.
    pub p0: Option<Vec<f64>>,
    /// Per-observation standard deviations; residuals are divided by these.
    pub sigma: Option<Vec<f64>>,
    /// Treat `sigma` as absolute. When false the covariance is rescaled by the
    /// reduced chi-square.
    pub absolute_sigma: bool,
    /// Reject infinite input.
    pub check_finite: bool,
    /// Per-parameter `(lower, upper)` box. Parameters are projected onto the
    /// box after every step.
    pub bounds: Option<Vec<(f64, f64)>>,
    pub method: Method,
    pub jac: JacobianKind,
    /// Also return residuals, evaluation count, status message and code.
    pub full_output: bool,
    pub nan_policy: NanPolicy,
    /// Backend tuning: `ftol`, `xtol`, `gtol`, `stepbound`, `patience`.
    pub extra: BTreeMap<String, f64>,
}

impl Default for CurveFitOptions {
    fn default() -> Self {
        Self {
            p0: None,
            sigma: None,
            absolute_sigma: false,
            check_finite: true,
            bounds: None,
            method: Method::Lm,
            jac: JacobianKind::TwoPoint,
            full_output: false,
            nan_policy: NanPolicy::Raise,
            extra: BTreeMap::new(),
        }
    }
}

impl CurveFitOptions {
    pub fn with_p0(mut self, p0: Vec<f64>) -> Self {
        self.p0 = Some(p0);
        self
    }

    pub fn with_sigma(mut self, sigma: Vec<f64>, absolute: bool) -> Self {
        self.sigma = Some(sigma);
        self.absolute_sigma = absolute;
        self
    }

    pub fn with_bounds(mut self, bounds: Vec<(f64, f64)>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_jac(mut self, jac: JacobianKind) -> Self {
        self.jac = jac;
        self
    }

    pub fn with_full_output(mut self, full_output: bool) -> Self {
        self.full_output = full_output;
        self
    }

    pub fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: f64) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Levenberg-Marquardt tuning.
///
/// Defaults mirror MINPACK's `lmder`: `ftol = xtol = sqrt(eps)`, `gtol = 0`,
/// step bound 100, and up to `200 * (n + 1)` residual evaluations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmSettings {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub stepbound: f64,
    pub patience: usize,
}

impl Default for LmSettings {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            stepbound: 100.0,
            patience: 200,
        }
    }
}

impl LmSettings {
    pub const KEYS: [&'static str; 5] = ["ftol", "xtol", "gtol", "stepbound", "patience"];

    /// Validate the extension map into settings.
    pub fn from_extra(extra: &BTreeMap<String, f64>) -> Result<Self, AppError> {
        let mut settings = Self::default();
        for (key, &value) in extra {
            if !value.is_finite() {
                return Err(AppError::invalid_input(format!(
                    "Solver option '{key}' must be finite, got {value}."
                )));
            }
            match key.as_str() {
                "ftol" | "xtol" | "gtol" => {
                    if value < 0.0 {
                        return Err(AppError::invalid_input(format!(
                            "Solver option '{key}' must be >= 0, got {value}."
                        )));
                    }
                    match key.as_str() {
                        "ftol" => settings.ftol = value,
                        "xtol" => settings.xtol = value,
                        _ => settings.gtol = value,
                    }
                }
                "stepbound" => {
                    if value <= 0.0 {
                        return Err(AppError::invalid_input(format!(
                            "Solver option 'stepbound' must be > 0, got {value}."
                        )));
                    }
                    settings.stepbound = value;
                }
                "patience" => {
                    if value < 1.0 || value.fract() != 0.0 {
                        return Err(AppError::invalid_input(format!(
                            "Solver option 'patience' must be a positive integer, got {value}."
                        )));
                    }
                    settings.patience = value as usize;
                }
                other => {
                    return Err(AppError::invalid_input(format!(
                        "Unknown solver option '{other}' (expected one of: {}).",
                        Self::KEYS.join(", ")
                    )));
                }
            }
        }
        Ok(settings)
    }
}
