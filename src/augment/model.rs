use crate::error::AppError;
use crate::lmfit::{Fitter, ModelResult, Parameters};
use crate::score::information_criteria;

/// Decorates a `Fitter` so that every result carries `aicc`.
///
/// The inner result is otherwise untouched: `aic`, `bic`, `chisqr` and the
/// parameters are exactly what the inner fitter produced.
pub struct WithAicc<F> {
    inner: F,
}

impl<F: Fitter> WithAicc<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: Fitter> Fitter for WithAicc<F> {
    fn fit(&self, data: &[f64], params: &Parameters, x: &[f64]) -> Result<ModelResult, AppError> {
        let mut result = self.inner.fit(data, params, x)?;
        attach_aicc(&mut result)?;
        Ok(result)
    }
}

/// Set `result.aicc` from `(chisqr, ndata, nvarys)`.
///
/// Only `aicc` is written; the native `aic` is kept as reported.
pub fn attach_aicc(result: &mut ModelResult) -> Result<(), AppError> {
    let scores = information_criteria(result.chisqr, result.ndata, result.nvarys)?;
    log::debug!(
        model = result.model_name.as_str(),
        native_aic = result.aic,
        aic = scores.aic,
        aicc = scores.aicc;
        "attached AICc to model result"
    );
    result.aicc = Some(scores.aicc);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::lmfit::Model;

    fn data() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 0.5 - 0.2 * v + if i % 3 == 0 { 0.05 } else { -0.03 })
            .collect();
        (x, y)
    }

    #[test]
    fn decorator_only_adds_aicc() {
        let (x, y) = data();
        let model = Model::new(ModelKind::Linear);
        let params = model.make_params();

        let plain = model.fit(&y, &params, &x).unwrap();
        let wrapped = WithAicc::new(Model::new(ModelKind::Linear));
        let decorated = wrapped.fit(&y, &params, &x).unwrap();

        assert_eq!(decorated.aic, plain.aic);
        assert_eq!(decorated.bic, plain.bic);
        assert_eq!(decorated.chisqr, plain.chisqr);
        assert_eq!(decorated.params, plain.params);
        assert!(plain.aicc.is_none());

        let aicc = decorated.aicc.unwrap();
        let expected = plain.aic + 12.0 / 9.0;
        assert!((aicc - expected).abs() < 1e-9, "{aicc} vs {expected}");
    }

    #[test]
    fn saturated_fit_gets_infinite_aicc() {
        let model = Model::new(ModelKind::Linear);
        let mut result = model
            .fit(&[1.0, 3.0], &model.make_params(), &[0.0, 1.0])
            .unwrap();
        attach_aicc(&mut result).unwrap();
        assert_eq!(result.aicc, Some(f64::INFINITY));
    }

    #[test]
    fn inner_errors_pass_through() {
        let wrapped = WithAicc::new(Model::new(ModelKind::Linear));
        let err = wrapped
            .fit(&[1.0, 2.0], &Parameters::new(), &[0.0, 1.0])
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
    }

    #[test]
    fn fit_that_leaves_the_model_domain_is_still_scored() {
        let sqrt_slope = crate::models::FnModel::new("sqrt-slope", &["s"], |x: f64, p: &[f64]| p[0].sqrt() * x);
        let x: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        let model = Model::new(sqrt_slope);
        let params = model.make_params();

        let result = WithAicc::new(model).fit(&y, &params, &x).unwrap();
        assert!(!result.success);
        assert!(result.aic.is_finite());
        assert!(result.aicc.is_some_and(f64::is_finite));
        assert!(result.params.get("s").is_some_and(|p| p.value >= 0.0));
    }
}
