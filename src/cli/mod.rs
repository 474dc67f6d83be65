//! Command-line parsing for the `fit-aic` tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/scoring code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{Criterion, ModelKind};
use crate::math::JacobianKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fit-aic", version, about = "Least-squares curve fitting with AIC / AICc model selection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute AIC and AICc from a residual sum of squares.
    Score(ScoreArgs),
    /// Fit one model to a CSV data set.
    Fit(FitArgs),
    /// Fit several models and rank them by information criterion.
    Compare(CompareArgs),
    /// Write a synthetic data set drawn from a built-in model.
    Simulate(SimulateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ScoreArgs {
    /// Residual sum of squares.
    #[arg(long, allow_negative_numbers = true)]
    pub rss: f64,

    /// Number of observations.
    #[arg(short = 'n', long)]
    pub n: usize,

    /// Number of fitted parameters.
    #[arg(short = 'k', long)]
    pub k: usize,
}

/// Options shared by `fit` and `compare`.
#[derive(Debug, Parser, Clone)]
pub struct DataArgs {
    /// CSV with columns `x`, `y` and optionally `sigma`.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Finite-difference scheme for the Jacobian.
    #[arg(long, value_enum, default_value_t = JacobianKind::TwoPoint)]
    pub jac: JacobianKind,

    /// Treat `sigma` as absolute (do not rescale the covariance).
    #[arg(long)]
    pub absolute_sigma: bool,

    /// Export the result as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Model to fit.
    #[arg(long, value_enum)]
    pub model: ModelKind,

    /// Initial guess, comma separated (defaults to a data-driven guess).
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub p0: Option<Vec<f64>>,

    /// Report solver status and AIC / AICc.
    #[arg(long)]
    pub full_output: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Models to compare, comma separated (default: all).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub models: Vec<ModelKind>,

    /// Ranking criterion.
    #[arg(long, value_enum, default_value_t = Criterion::Aicc)]
    pub criterion: Criterion,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Model to draw from.
    #[arg(long, value_enum)]
    pub model: ModelKind,

    /// True parameter values, comma separated.
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    pub params: Vec<f64>,

    /// Number of points.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub n: usize,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Standard deviation of the Gaussian noise.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
