//! Fit candidate models and compare them.
//!
//! Every model is fitted twice from the same starting point:
//! - through `augment::curve_fit` (least-squares front-end, AIC + AICc)
//! - through `augment::WithAicc<lmfit::Model>` (native AIC/BIC, AICc attached)
//!
//! Ranking uses the least-squares scores; the declarative model's AIC is kept
//! alongside for cross-checking. Models are fitted in parallel.

use rayon::prelude::*;

use crate::augment::{self, WithAicc};
use crate::domain::{Criterion, DataSet, ModelKind};
use crate::error::AppError;
use crate::fit::selection::{Candidate, Ranking, rank};
use crate::lmfit::{Fitter, Model, ModelResult, Parameters};
use crate::math::JacobianKind;
use crate::models::ModelFunction;
use crate::score::InformationCriteria;
use crate::solver::{CurveFitOptions, CurveFitOutput};

/// Knobs shared by every fit in a run.
#[derive(Debug, Clone, Default)]
pub struct FitSettings {
    /// Overrides the model's data-driven initial guess.
    pub p0: Option<Vec<f64>>,
    pub jac: JacobianKind,
    pub absolute_sigma: bool,
}

/// One model fitted through both front-ends.
#[derive(Debug, Clone)]
pub struct ModelFit {
    pub kind: ModelKind,
    pub curve_fit: CurveFitOutput,
    /// Least-squares AIC/AICc (from `curve_fit`'s info dictionary).
    pub scores: InformationCriteria,
    pub model_result: ModelResult,
}

impl ModelFit {
    pub fn rss(&self) -> f64 {
        self.curve_fit
            .full
            .as_ref()
            .map(|f| crate::score::rss(&f.infodict.fvec))
            .unwrap_or(f64::NAN)
    }

    pub fn success(&self) -> bool {
        self.curve_fit.full.as_ref().is_some_and(|f| f.success())
    }
}

#[derive(Debug, Clone)]
pub struct Comparison {
    /// Successful fits, in the order the models were requested.
    pub fits: Vec<ModelFit>,
    /// Models that could not be fitted and why.
    pub skipped: Vec<(ModelKind, String)>,
    /// Ranking over `fits`; `input_index` refers to `fits`.
    pub ranking: Ranking,
}

impl Comparison {
    pub fn preferred(&self) -> &ModelFit {
        &self.fits[self.ranking.preferred().input_index]
    }

    pub fn best(&self) -> &ModelFit {
        &self.fits[self.ranking.best().input_index]
    }
}

/// Fit every model in `models` and rank them under `criterion`.
///
/// # Errors
/// - exit code 2: invalid dataset, or `p0` given for more than one model
/// - exit code 3: no model could be fitted
pub fn compare_models(
    data: &DataSet,
    models: &[ModelKind],
    criterion: Criterion,
    settings: &FitSettings,
) -> Result<Comparison, AppError> {
    data.validate()?;
    if settings.p0.is_some() && models.len() != 1 {
        return Err(AppError::invalid_input(
            "An explicit initial guess only applies to a single model.",
        ));
    }

    let outcomes: Vec<(ModelKind, Result<ModelFit, AppError>)> = models
        .par_iter()
        .map(|&kind| (kind, fit_both(data, kind, settings)))
        .collect();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(fit) => fits.push(fit),
            Err(err) => {
                log::warn!(model = kind.display_name(); "skipping model: {err}");
                skipped.push((kind, err.message().to_string()));
            }
        }
    }

    if fits.is_empty() {
        return Err(AppError::insufficient_data(
            "No model could be fitted to the data.",
        ));
    }

    let candidates: Vec<Candidate> = fits
        .iter()
        .map(|f| Candidate {
            label: f.kind.display_name().to_string(),
            param_count: f.kind.param_count(),
            scores: f.scores,
        })
        .collect();
    let ranking = rank(&candidates, criterion)?;

    Ok(Comparison {
        fits,
        skipped,
        ranking,
    })
}

/// Fit a single model through the least-squares front-end only.
///
/// With `full_output = false` this is a plain fit and the result carries no
/// scores.
pub fn fit_one(
    data: &DataSet,
    kind: ModelKind,
    settings: &FitSettings,
    full_output: bool,
) -> Result<CurveFitOutput, AppError> {
    data.validate()?;
    let options = curve_fit_options(data, kind, settings).with_full_output(full_output);
    augment::curve_fit(&kind, &data.x, &data.y, &options)
}

fn fit_both(data: &DataSet, kind: ModelKind, settings: &FitSettings) -> Result<ModelFit, AppError> {
    let options = curve_fit_options(data, kind, settings).with_full_output(true);
    let curve_fit = augment::curve_fit(&kind, &data.x, &data.y, &options)?;

    let info = curve_fit
        .full
        .as_ref()
        .map(|f| &f.infodict)
        .ok_or_else(|| AppError::fit_failure("Solver returned no full output."))?;
    let scores = match (info.aic, info.aicc) {
        (Some(aic), Some(aicc)) => InformationCriteria { aic, aicc },
        _ => return Err(AppError::fit_failure("Solver output carries no information criteria.")),
    };

    let mut model = Model::new(kind);
    if let Some(sigma) = &data.sigma {
        model = model.with_weights(sigma.iter().map(|s| 1.0 / s).collect());
    }
    let params = start_params(&model, data, settings)?;
    let model_result = WithAicc::new(model).fit(&data.y, &params, &data.x)?;

    Ok(ModelFit {
        kind,
        curve_fit,
        scores,
        model_result,
    })
}

fn curve_fit_options(data: &DataSet, kind: ModelKind, settings: &FitSettings) -> CurveFitOptions {
    let p0 = settings
        .p0
        .clone()
        .unwrap_or_else(|| kind.initial_guess(&data.x, &data.y));
    let mut options = CurveFitOptions::default().with_p0(p0).with_jac(settings.jac);
    if let Some(sigma) = &data.sigma {
        options = options.with_sigma(sigma.clone(), settings.absolute_sigma);
    }
    options
}

fn start_params(
    model: &Model<ModelKind>,
    data: &DataSet,
    settings: &FitSettings,
) -> Result<Parameters, AppError> {
    let Some(p0) = &settings.p0 else {
        return Ok(model.guess(&data.y, &data.x));
    };
    if p0.len() != model.function().param_count() {
        return Err(AppError::invalid_input(format!(
            "Initial guess has {} values but model '{}' has {} parameters.",
            p0.len(),
            model.name(),
            model.function().param_count()
        )));
    }
    let mut params = model.make_params();
    for (name, &value) in model.function().param_names().iter().zip(p0.iter()) {
        params.set(name, value)?;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{linspace, simulate};

    #[test]
    fn prefers_line_on_linear_data() {
        // Alternating noise carries no curvature for the quadratic to pick up.
        let x = linspace(0.0, 10.0, 40);
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 1.0 + 0.5 * v + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect();
        let data = DataSet::new(x, y);
        let models = [ModelKind::Linear, ModelKind::Quadratic];

        let cmp = compare_models(&data, &models, Criterion::Aicc, &FitSettings::default()).unwrap();
        assert_eq!(cmp.fits.len(), 2);
        assert_eq!(cmp.preferred().kind, ModelKind::Linear);
        for fit in &cmp.fits {
            assert!(fit.model_result.aicc.is_some());
            assert!((fit.scores.aic - fit.model_result.aic).abs() < 1e-2);
        }
    }

    #[test]
    fn picks_double_exponential_when_separation_is_clear() {
        let x = linspace(0.0, 20.0, 200);
        let truth = [3.0, 0.5, 2.0, 6.0];
        let data = simulate(ModelKind::DoubleExponential, &truth, &x, 0.01, 11).unwrap();
        let models = [ModelKind::Exponential, ModelKind::DoubleExponential];

        let cmp = compare_models(&data, &models, Criterion::Aicc, &FitSettings::default()).unwrap();
        assert_eq!(cmp.best().kind, ModelKind::DoubleExponential);
        assert_eq!(cmp.preferred().kind, ModelKind::DoubleExponential);
    }

    #[test]
    fn unfittable_models_are_skipped() {
        let data = DataSet::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.5, 2.2]);
        let models = [ModelKind::Linear, ModelKind::DoubleExponential];

        let cmp = compare_models(&data, &models, Criterion::Aic, &FitSettings::default()).unwrap();
        assert_eq!(cmp.fits.len(), 1);
        assert_eq!(cmp.skipped.len(), 1);
        assert_eq!(cmp.skipped[0].0, ModelKind::DoubleExponential);
    }

    #[test]
    fn explicit_p0_needs_a_single_model() {
        let data = DataSet::new(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]);
        let settings = FitSettings {
            p0: Some(vec![1.0, 1.0]),
            ..FitSettings::default()
        };
        let err = compare_models(
            &data,
            &[ModelKind::Linear, ModelKind::Quadratic],
            Criterion::Aicc,
            &settings,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
    }

    #[test]
    fn fit_one_without_full_output_has_no_scores() {
        let data = DataSet::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 2.1, 2.9, 4.0]);
        let out = fit_one(&data, ModelKind::Linear, &FitSettings::default(), false).unwrap();
        assert!(out.full.is_none());
        assert_eq!(out.popt.len(), 2);

        let out = fit_one(&data, ModelKind::Linear, &FitSettings::default(), true).unwrap();
        assert!(out.full.unwrap().infodict.aicc.is_some());
    }
}
