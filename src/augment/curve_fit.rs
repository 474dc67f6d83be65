use crate::error::AppError;
use crate::models::ModelFunction;
use crate::score::{information_criteria, rss};
use crate::solver::{self, CurveFitOptions, CurveFitOutput};

/// `solver::curve_fit` with information criteria in the full output.
///
/// With `full_output = false` the solver's result is returned as is and no
/// score is computed. Otherwise `RSS = Σ fvec²`, `n = fvec.len()` and
/// `k = popt.len()` are scored and written to `infodict.aic`/`infodict.aicc`.
/// A fit that did not converge is still scored.
///
/// `n` counts only the observations that entered the fit: rows dropped under
/// `NanPolicy::Omit` are not included.
///
/// Solver errors pass through unchanged.
pub fn curve_fit(
    model: &dyn ModelFunction,
    xdata: &[f64],
    ydata: &[f64],
    options: &CurveFitOptions,
) -> Result<CurveFitOutput, AppError> {
    let mut out = solver::curve_fit(model, xdata, ydata, options)?;

    let k = out.popt.len();
    if let Some(full) = out.full.as_mut() {
        let info = &mut full.infodict;
        let scores = information_criteria(rss(&info.fvec), info.fvec.len(), k)?;
        log::debug!(
            model = model.name(),
            n = info.fvec.len(),
            k = k,
            aic = scores.aic,
            aicc = scores.aicc;
            "scored curve fit"
        );
        info.aic = Some(scores.aic);
        info.aicc = Some(scores.aicc);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn line() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 1.0 + 0.5 * v + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        (x, y)
    }

    #[test]
    fn passes_through_without_full_output() {
        let (x, y) = line();
        let options = CurveFitOptions::default();

        let plain = solver::curve_fit(&ModelKind::Linear, &x, &y, &options).unwrap();
        let augmented = curve_fit(&ModelKind::Linear, &x, &y, &options).unwrap();

        assert_eq!(plain.popt, augmented.popt);
        assert_eq!(plain.pcov, augmented.pcov);
        assert!(augmented.full.is_none());
    }

    #[test]
    fn full_output_carries_scores() {
        let (x, y) = line();
        let options = CurveFitOptions::default().with_full_output(true);

        let out = curve_fit(&ModelKind::Linear, &x, &y, &options).unwrap();
        let full = out.full.unwrap();
        let rss: f64 = full.infodict.fvec.iter().map(|r| r * r).sum();
        let expected = 20.0 * (rss / 20.0).ln() + 4.0;

        let aic = full.infodict.aic.unwrap();
        let aicc = full.infodict.aicc.unwrap();
        assert!((aic - expected).abs() < 1e-9);
        assert!((aicc - (expected + 12.0 / 17.0)).abs() < 1e-9);
    }

    #[test]
    fn degenerate_degrees_of_freedom_give_infinite_aicc() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 2.1, 2.9];
        let options = CurveFitOptions::default().with_full_output(true);

        let out = curve_fit(&ModelKind::Linear, &x, &y, &options).unwrap();
        let info = out.full.unwrap().infodict;
        assert!(info.aic.unwrap().is_finite());
        assert_eq!(info.aicc, Some(f64::INFINITY));
    }

    #[test]
    fn unconverged_fit_is_still_scored() {
        let x: Vec<f64> = (0..25).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|&v| 2.0 * (-v / 1.3).exp()).collect();
        let options = CurveFitOptions::default()
            .with_full_output(true)
            .with_p0(vec![3.0, 1.0])
            .with_extra("patience", 1.0);

        let full = curve_fit(&ModelKind::Exponential, &x, &y, &options)
            .unwrap()
            .full
            .unwrap();
        assert!(!full.success());
        assert!(full.infodict.aic.is_some_and(f64::is_finite));
        assert!(full.infodict.aicc.is_some());
    }

    #[test]
    fn omitted_rows_do_not_count_towards_n() {
        let (x, mut y) = line();
        y[3] = f64::NAN;
        let options = CurveFitOptions::default()
            .with_full_output(true)
            .with_nan_policy(crate::solver::NanPolicy::Omit);

        let info = curve_fit(&ModelKind::Linear, &x, &y, &options).unwrap().full.unwrap().infodict;
        assert_eq!(info.fvec.len(), 19);
        let rss: f64 = info.fvec.iter().map(|r| r * r).sum();
        let expected = 19.0 * (rss / 19.0).ln() + 4.0;
        assert!((info.aic.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn solver_errors_pass_through() {
        let options = CurveFitOptions::default().with_full_output(true);
        let err = curve_fit(&ModelKind::Quadratic, &[0.0, 1.0], &[1.0, 2.0], &options).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INSUFFICIENT_DATA);
    }
}
