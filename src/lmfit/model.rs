//! `Model`: a `ModelFunction` fitted through named parameters.
//!
//! Residuals are `(model - data) * weights`. Statistics reported on the
//! result:
//!
//! - `chisqr = Σ residual²`, `ndata`, `nvarys`, `nfree = ndata - nvarys`
//! - `redchi = chisqr / nfree`
//! - `aic = ndata ln(chisqr/ndata) + 2 nvarys`
//! - `bic = ndata ln(chisqr/ndata) + ln(ndata) nvarys`
//!
//! `chisqr` is floored at `1e-250 * ndata` before taking the log so that a
//! perfect fit still yields finite AIC/BIC. `aicc` is never set here.

use nalgebra::DMatrix;

use crate::error::AppError;
use crate::lmfit::parameters::{Parameter, Parameters};
use crate::math::{JacobianKind, normal_pseudo_inverse};
use crate::models::ModelFunction;
use crate::score::rss;
use crate::solver::LmSettings;
use crate::solver::lm::minimize;

/// Anything that fits `Parameters` against data and returns a `ModelResult`.
pub trait Fitter {
    fn fit(&self, data: &[f64], params: &Parameters, x: &[f64]) -> Result<ModelResult, AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    pub model_name: String,
    /// Best-fit parameters (fixed ones unchanged), with `stderr` when available.
    pub params: Parameters,
    pub best_fit: Vec<f64>,
    pub residual: Vec<f64>,
    pub chisqr: f64,
    pub redchi: f64,
    pub aic: f64,
    pub bic: f64,
    pub ndata: usize,
    pub nvarys: usize,
    pub nfree: usize,
    pub nfev: usize,
    pub success: bool,
    pub message: String,
    /// Covariance of the varying parameters, scaled by `redchi`.
    pub covar: Option<DMatrix<f64>>,
    /// Not computed by the model itself; see `augment::WithAicc`.
    pub aicc: Option<f64>,
}

pub struct Model<M> {
    function: M,
    /// Residual weights used by `Fitter::fit`.
    weights: Option<Vec<f64>>,
}

impl<M: ModelFunction> Model<M> {
    pub fn new(function: M) -> Self {
        Self {
            function,
            weights: None,
        }
    }

    /// Weight every residual, typically by `1 / sigma`.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn function(&self) -> &M {
        &self.function
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    /// One parameter per model argument, value 1.0, varying, unbounded.
    pub fn make_params(&self) -> Parameters {
        self.params_from(&vec![1.0; self.function.n_params()])
    }

    /// Parameters seeded with the model's data-driven initial guess.
    pub fn guess(&self, data: &[f64], x: &[f64]) -> Parameters {
        self.params_from(&self.function.initial_guess(x, data))
    }

    /// Evaluate the model with the given parameters.
    pub fn eval(&self, params: &Parameters, x: &[f64]) -> Result<Vec<f64>, AppError> {
        let values = self.ordered_values(params)?;
        Ok(self.function.eval_all(x, &values))
    }

    /// Fit with optional multiplicative residual weights.
    pub fn fit_weighted(
        &self,
        data: &[f64],
        params: &Parameters,
        x: &[f64],
        weights: Option<&[f64]>,
    ) -> Result<ModelResult, AppError> {
        if x.len() != data.len() {
            return Err(AppError::invalid_input(format!(
                "x and data lengths differ ({} vs {}).",
                x.len(),
                data.len()
            )));
        }
        if let Some(w) = weights {
            if w.len() != data.len() {
                return Err(AppError::invalid_input(format!(
                    "weights length ({}) does not match data length ({}).",
                    w.len(),
                    data.len()
                )));
            }
        }
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        if !finite(data) || !finite(x) || !weights.is_none_or(finite) {
            return Err(AppError::invalid_input(
                "Model fit input contains NaN or infinite values.",
            ));
        }

        let names = self.function.param_names();
        let base = self.ordered_values(params)?;
        let ordered: Vec<&Parameter> = names.iter().filter_map(|n| params.get(n)).collect();
        let vary_idx: Vec<usize> = (0..names.len()).filter(|&i| ordered[i].vary).collect();
        let nvarys = vary_idx.len();
        if nvarys == 0 {
            return Err(AppError::invalid_input("No varying parameters to fit."));
        }
        let ndata = data.len();
        if ndata < nvarys {
            return Err(AppError::insufficient_data(format!(
                "Too few data points ({ndata}) for {nvarys} varying parameters."
            )));
        }

        let p0: Vec<f64> = vary_idx.iter().map(|&i| base[i]).collect();
        let bounds: Vec<(f64, f64)> = vary_idx
            .iter()
            .map(|&i| (ordered[i].min, ordered[i].max))
            .collect();
        for (&v, &(lo, hi)) in p0.iter().zip(bounds.iter()) {
            if v < lo || v > hi {
                return Err(AppError::invalid_input(format!(
                    "Initial value {v} is outside its bounds [{lo}, {hi}]."
                )));
            }
        }

        let expand = |varying: &[f64]| -> Vec<f64> {
            let mut full = base.clone();
            for (slot, &i) in vary_idx.iter().enumerate() {
                full[i] = varying[slot];
            }
            full
        };
        let residual = |varying: &[f64]| -> Vec<f64> {
            let full = expand(varying);
            x.iter()
                .zip(data.iter())
                .enumerate()
                .map(|(i, (&xi, &yi))| {
                    let w = weights.map(|w| w[i]).unwrap_or(1.0);
                    (self.function.eval(xi, &full) - yi) * w
                })
                .collect()
        };

        let outcome = minimize(
            &residual,
            &p0,
            Some(bounds.as_slice()),
            JacobianKind::TwoPoint,
            &LmSettings::default(),
        )?;

        if !outcome.status.success() {
            log::warn!(model = self.name(), ier = outcome.status.ier; "model fit did not converge: {}", outcome.status.mesg);
        }

        let chisqr = rss(&outcome.fvec);
        let nfree = ndata - nvarys;
        let redchi = chisqr / nfree.max(1) as f64;
        let (aic, bic) = native_aic_bic(chisqr, ndata, nvarys);

        let covar = if nfree > 0 {
            outcome
                .jacobian
                .as_ref()
                .and_then(normal_pseudo_inverse)
                .map(|c| c * redchi)
        } else {
            None
        };

        let best = expand(&outcome.params);
        let mut fitted = params.clone();
        for (i, name) in names.iter().enumerate() {
            if let Some(p) = fitted.get_mut(name) {
                p.value = best[i];
                p.stderr = vary_idx
                    .iter()
                    .position(|&v| v == i)
                    .and_then(|slot| covar.as_ref().map(|c| c[(slot, slot)].sqrt()));
            }
        }

        log::debug!(
            model = self.name(),
            chisqr = chisqr,
            ndata = ndata,
            nvarys = nvarys,
            aic = aic;
            "model fit finished"
        );

        Ok(ModelResult {
            model_name: self.name().to_string(),
            params: fitted,
            best_fit: self.function.eval_all(x, &best),
            residual: outcome.fvec,
            chisqr,
            redchi,
            aic,
            bic,
            ndata,
            nvarys,
            nfree,
            nfev: outcome.nfev,
            success: outcome.status.success(),
            message: outcome.status.mesg,
            covar,
            aicc: None,
        })
    }

    fn params_from(&self, values: &[f64]) -> Parameters {
        let mut params = Parameters::new();
        for (name, &value) in self.function.param_names().into_iter().zip(values.iter()) {
            params.push(Parameter::new(name, value));
        }
        params
    }

    /// Parameter values in the model's argument order.
    fn ordered_values(&self, params: &Parameters) -> Result<Vec<f64>, AppError> {
        let names = self.function.param_names();
        if let Some(extra) = params.iter().find(|p| !names.contains(&p.name)) {
            return Err(AppError::invalid_input(format!(
                "Parameter '{}' is not an argument of model '{}'.",
                extra.name,
                self.name()
            )));
        }
        names
            .iter()
            .map(|n| {
                params.get(n).map(|p| p.value).ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "Missing value for parameter '{n}' of model '{}'.",
                        self.name()
                    ))
                })
            })
            .collect()
    }
}

impl<M: ModelFunction> Fitter for Model<M> {
    fn fit(&self, data: &[f64], params: &Parameters, x: &[f64]) -> Result<ModelResult, AppError> {
        self.fit_weighted(data, params, x, self.weights.as_deref())
    }
}

fn native_aic_bic(chisqr: f64, ndata: usize, nvarys: usize) -> (f64, f64) {
    let n = ndata as f64;
    let chisqr = chisqr.max(1e-250 * n);
    let neg2_log_likel = n * (chisqr / n).ln();
    let aic = neg2_log_likel + 2.0 * nvarys as f64;
    let bic = neg2_log_likel + n.ln() * nvarys as f64;
    (aic, bic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn decay() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.3).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 2.0 * (-v / 1.5).exp() + 0.02 * ((i as f64) * 2.3).cos())
            .collect();
        (x, y)
    }

    #[test]
    fn make_params_follows_model_arguments() {
        let model = Model::new(ModelKind::DoubleExponential);
        let params = model.make_params();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A1", "tau1", "A2", "tau2"]);
        assert!(params.iter().all(|p| p.value == 1.0 && p.vary));
    }

    #[test]
    fn fit_reports_native_statistics() {
        let (x, y) = decay();
        let model = Model::new(ModelKind::Exponential);
        let mut params = model.make_params();
        params.set("A", 1.5).unwrap();
        params.set("tau", 1.0).unwrap();

        let result = model.fit(&y, &params, &x).unwrap();
        assert!(result.success, "{}", result.message);
        assert_eq!(result.ndata, 30);
        assert_eq!(result.nvarys, 2);
        assert_eq!(result.nfree, 28);
        assert!(result.aicc.is_none());

        let chisqr: f64 = result.residual.iter().map(|r| r * r).sum();
        assert!((result.chisqr - chisqr).abs() < 1e-12);
        let aic = 30.0 * (chisqr / 30.0).ln() + 4.0;
        assert!((result.aic - aic).abs() < 1e-9);
        assert!(result.bic > result.aic);

        let a = result.params.get("A").unwrap();
        assert!((a.value - 2.0).abs() < 0.05);
        assert!(a.stderr.is_some_and(|s| s > 0.0));
        assert_eq!(result.best_fit.len(), 30);
    }

    #[test]
    fn fixed_parameters_stay_put() {
        let (x, y) = decay();
        let model = Model::new(ModelKind::Exponential);
        let mut params = model.make_params();
        params.set("tau", 1.5).unwrap();
        params.fix("tau").unwrap();

        let result = model.fit(&y, &params, &x).unwrap();
        assert_eq!(result.nvarys, 1);
        assert_eq!(result.params.get("tau").unwrap().value, 1.5);
        assert!(result.params.get("tau").unwrap().stderr.is_none());
    }

    #[test]
    fn weights_scale_residuals() {
        let (x, y) = decay();
        let model = Model::new(ModelKind::Exponential);
        let params = model.guess(&y, &x);
        let plain = model.fit(&y, &params, &x).unwrap();

        let weighted = Model::new(ModelKind::Exponential).with_weights(vec![10.0; x.len()]);
        let result = weighted.fit(&y, &params, &x).unwrap();
        assert!((result.chisqr / plain.chisqr - 100.0).abs() < 1e-3);
        assert!((result.redchi / plain.redchi - 100.0).abs() < 1e-3);
    }

    #[test]
    fn perfect_fit_keeps_finite_aic() {
        let (aic, bic) = native_aic_bic(0.0, 10, 2);
        assert!(aic.is_finite() && bic.is_finite());
    }

    #[test]
    fn rejects_mismatched_parameters() {
        let (x, y) = decay();
        let model = Model::new(ModelKind::Exponential);

        let mut params = model.make_params();
        params.add(Parameter::new("extra", 0.0)).unwrap();
        assert!(model.fit(&y, &params, &x).is_err());

        let mut params = Parameters::new();
        params.add(Parameter::new("A", 1.0)).unwrap();
        let err = model.fit(&y, &params, &x).unwrap_err();
        assert!(err.message().contains("tau"));

        let mut params = model.make_params();
        params.fix("A").unwrap();
        params.fix("tau").unwrap();
        assert!(model.fit(&y, &params, &x).is_err());

        assert!(model.fit(&y[..3], &model.make_params(), &x).is_err());
    }

    #[test]
    fn guess_seeds_from_data() {
        let (x, y) = decay();
        let model = Model::new(ModelKind::Exponential);
        let params = model.guess(&y, &x);
        assert!(params.get("tau").unwrap().value > 0.0);
        assert_eq!(model.eval(&params, &[0.0]).unwrap().len(), 1);
    }
}
