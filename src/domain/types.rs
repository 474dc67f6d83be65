//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::error::AppError;
use crate::math::JacobianKind;

/// Built-in model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// `a + b x`
    Linear,
    /// `a + b x + c x²`
    Quadratic,
    /// `A exp(-x / tau)`
    Exponential,
    /// `A1 exp(-x / tau1) + A2 exp(-x / tau2)`
    DoubleExponential,
    /// `A exp(-(x - mu)² / (2 sigma²))`
    Gaussian,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::Quadratic,
        ModelKind::Exponential,
        ModelKind::DoubleExponential,
        ModelKind::Gaussian,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Quadratic => "quadratic",
            ModelKind::Exponential => "exponential",
            ModelKind::DoubleExponential => "double-exponential",
            ModelKind::Gaussian => "gaussian",
        }
    }

    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Linear => &["a", "b"],
            ModelKind::Quadratic => &["a", "b", "c"],
            ModelKind::Exponential => &["A", "tau"],
            ModelKind::DoubleExponential => &["A1", "tau1", "A2", "tau2"],
            ModelKind::Gaussian => &["A", "mu", "sigma"],
        }
    }

    /// Parameter count used for information criteria.
    pub fn param_count(self) -> usize {
        self.param_names().len()
    }
}

/// Which criterion ranks candidate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    #[default]
    Aicc,
    Aic,
}

impl Criterion {
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Aicc => "AICc",
            Criterion::Aic => "AIC",
        }
    }
}

/// Observations to fit: `y(x)` with optional per-point standard deviations.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataSet {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma: Option<Vec<f64>>,
}

impl DataSet {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y, sigma: None }
    }

    pub fn with_sigma(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Check that `x`, `y` (and `sigma`) line up.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.x.len() != self.y.len() {
            return Err(AppError::invalid_input(format!(
                "x and y lengths differ ({} vs {}).",
                self.x.len(),
                self.y.len()
            )));
        }
        if let Some(sigma) = &self.sigma {
            if sigma.len() != self.y.len() {
                return Err(AppError::invalid_input(format!(
                    "sigma length ({}) does not match y length ({}).",
                    sigma.len(),
                    self.y.len()
                )));
            }
        }
        if self.is_empty() {
            return Err(AppError::insufficient_data("Dataset has no observations."));
        }
        Ok(())
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub models: Vec<ModelKind>,
    /// Explicit initial guess (only meaningful with a single model).
    pub p0: Option<Vec<f64>>,
    pub criterion: Criterion,
    pub jac: JacobianKind,
    pub absolute_sigma: bool,
    pub full_output: bool,
    pub export: Option<PathBuf>,
}

/// One model's row in an exported comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ModelComparison {
    pub model: ModelKind,
    pub param_names: Vec<String>,
    pub params: Vec<f64>,
    /// One-sigma parameter uncertainties from the covariance diagonal.
    pub stderr: Vec<f64>,
    pub rss: f64,
    pub n: usize,
    pub k: usize,
    pub success: bool,
    pub message: String,
    /// From the least-squares solver path.
    pub aic: f64,
    pub aicc: f64,
    /// The declarative model's own AIC, for cross-checking.
    pub model_aic: f64,
    pub model_aicc: f64,
    pub delta: f64,
    pub weight: f64,
}

/// Exported JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub data: String,
    pub n: usize,
    pub criterion: Criterion,
    pub preferred: Option<ModelKind>,
    pub best: Option<ModelKind>,
    pub models: Vec<ModelComparison>,
}

/// Exported JSON report for a single-model fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub data: String,
    pub n: usize,
    pub model: ModelKind,
    pub param_names: Vec<String>,
    pub params: Vec<f64>,
    pub stderr: Vec<f64>,
    /// Present only with full output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ier: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfev: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aicc: Option<f64>,
}
