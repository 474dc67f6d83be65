//! Shared "fit pipeline" logic behind the `fit` and `compare` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> fit(s) -> scores -> selection -> exportable report
//!
//! The command handlers can then focus on presentation.

use chrono::Utc;

use crate::domain::{ComparisonReport, FitReport, ModelComparison, ModelKind, RunConfig};
use crate::error::AppError;
use crate::fit::{Comparison, FitSettings, compare_models, fit_one};
use crate::io::{IngestedData, load_dataset};
use crate::solver::CurveFitOutput;

const TOOL: &str = "fit-aic";

/// All computed outputs of a `fit-aic fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub ingest: IngestedData,
    pub fit: CurveFitOutput,
    pub report: FitReport,
}

/// All computed outputs of a `fit-aic compare` run.
#[derive(Debug, Clone)]
pub struct CompareRun {
    pub ingest: IngestedData,
    pub comparison: Comparison,
    pub report: ComparisonReport,
}

/// Load the data set and fit a single model.
pub fn run_fit(config: &RunConfig, model: ModelKind) -> Result<FitRun, AppError> {
    let ingest = load_dataset(&config.data_path)?;
    log_row_errors(&ingest);

    let fit = fit_one(&ingest.data, model, &settings_from_config(config), config.full_output)?;

    let full = fit.full.as_ref();
    let report = FitReport {
        tool: TOOL.to_string(),
        generated_at: Utc::now(),
        data: config.data_path.display().to_string(),
        n: ingest.rows_used,
        model,
        param_names: model.param_names().iter().map(|s| s.to_string()).collect(),
        params: fit.popt.clone(),
        stderr: fit.perr(),
        ier: full.map(|f| f.ier),
        message: full.map(|f| f.mesg.clone()),
        nfev: full.map(|f| f.infodict.nfev),
        aic: full.and_then(|f| f.infodict.aic),
        aicc: full.and_then(|f| f.infodict.aicc),
    };

    Ok(FitRun { ingest, fit, report })
}

/// Load the data set, fit every configured model and rank them.
pub fn run_compare(config: &RunConfig) -> Result<CompareRun, AppError> {
    let ingest = load_dataset(&config.data_path)?;
    log_row_errors(&ingest);

    let comparison = compare_models(
        &ingest.data,
        &config.models,
        config.criterion,
        &settings_from_config(config),
    )?;
    let report = comparison_report(config, &ingest, &comparison);

    Ok(CompareRun {
        ingest,
        comparison,
        report,
    })
}

/// Flatten a comparison into its exportable form (rows in request order).
pub fn comparison_report(
    config: &RunConfig,
    ingest: &IngestedData,
    comparison: &Comparison,
) -> ComparisonReport {
    let models = comparison
        .fits
        .iter()
        .enumerate()
        .map(|(i, fit)| {
            let ranked = comparison.ranking.by_input_index(i);
            ModelComparison {
                model: fit.kind,
                param_names: fit.kind.param_names().iter().map(|s| s.to_string()).collect(),
                params: fit.curve_fit.popt.clone(),
                stderr: fit.curve_fit.perr(),
                rss: fit.rss(),
                n: fit.model_result.ndata,
                k: fit.kind.param_count(),
                success: fit.success(),
                message: fit
                    .curve_fit
                    .full
                    .as_ref()
                    .map(|f| f.mesg.clone())
                    .unwrap_or_default(),
                aic: fit.scores.aic,
                aicc: fit.scores.aicc,
                model_aic: fit.model_result.aic,
                model_aicc: fit.model_result.aicc.unwrap_or(f64::NAN),
                delta: ranked.map(|r| r.delta).unwrap_or(f64::NAN),
                weight: ranked.map(|r| r.weight).unwrap_or(0.0),
            }
        })
        .collect();

    ComparisonReport {
        tool: TOOL.to_string(),
        generated_at: Utc::now(),
        data: config.data_path.display().to_string(),
        n: ingest.rows_used,
        criterion: config.criterion,
        preferred: Some(comparison.preferred().kind),
        best: Some(comparison.best().kind),
        models,
    }
}

fn settings_from_config(config: &RunConfig) -> FitSettings {
    FitSettings {
        p0: config.p0.clone(),
        jac: config.jac,
        absolute_sigma: config.absolute_sigma,
    }
}

fn log_row_errors(ingest: &IngestedData) {
    for e in &ingest.row_errors {
        log::warn!(line = e.line; "skipped row: {}", e.message);
    }
}
