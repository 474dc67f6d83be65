//! AIC / AICc from a residual sum of squares.
//!
//! The Gaussian-likelihood form is used: for least squares with i.i.d. normal
//! errors, `-2 ln L = n ln(RSS/n)` up to an additive constant that cancels
//! when comparing models on the same data. It does not carry over to other
//! error models.
//!
//! Numeric notes:
//! - `RSS = 0` gives `ln(0) = -inf`, so AIC is `-inf`. That is a legitimate
//!   (degenerate) output and is passed through untouched.
//! - AICc is undefined when the residual degrees of freedom `n - k - 1` are not
//!   strictly positive. We report `+inf` there instead of failing.

use serde::Serialize;

use crate::error::AppError;

/// AIC and AICc for one fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InformationCriteria {
    pub aic: f64,
    /// `+inf` when `n - k - 1 <= 0`.
    pub aicc: f64,
}

impl InformationCriteria {
    /// Whether AICc carries a finite-sample correction (as opposed to the
    /// undefined sentinel).
    pub fn aicc_is_defined(&self) -> bool {
        self.aicc != f64::INFINITY
    }
}

/// Compute AIC and AICc.
///
/// # Arguments
/// - `rss`: residual sum of squares, must be `>= 0`
/// - `n`: number of observations, must be `>= 1`
/// - `k`: number of fitted parameters
///
/// # Errors
/// Fails with exit code 2 on a negative or NaN `rss`, or `n = 0`. These never
/// come out of a real least-squares fit, and a finite number would hide the
/// bug upstream.
pub fn information_criteria(rss: f64, n: usize, k: usize) -> Result<InformationCriteria, AppError> {
    let aic = aic(rss, n, k)?;
    let aicc = match aicc_correction(n, k) {
        Some(correction) => aic + correction,
        None => f64::INFINITY,
    };

    log::trace!(rss = rss, n = n, k = k, aic = aic, aicc = aicc; "information criteria");
    Ok(InformationCriteria { aic, aicc })
}

/// `n * ln(RSS/n) + 2k`.
pub fn aic(rss: f64, n: usize, k: usize) -> Result<f64, AppError> {
    check_preconditions(rss, n)?;
    let n_f = n as f64;
    Ok(n_f * (rss / n_f).ln() + 2.0 * k as f64)
}

/// The finite-sample term `2k(k+1) / (n - k - 1)`.
///
/// Returns `None` when `n - k - 1 <= 0`. The boundary is strict: `n = k + 1`
/// is undefined.
pub fn aicc_correction(n: usize, k: usize) -> Option<f64> {
    // n - k - 1 > 0  <=>  n > k + 1, done in integers to avoid underflow.
    if n <= k.saturating_add(1) {
        return None;
    }
    let k_f = k as f64;
    let dof = (n - k - 1) as f64;
    Some(2.0 * k_f * (k_f + 1.0) / dof)
}

/// Sum of squared residuals.
pub fn rss(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn check_preconditions(rss: f64, n: usize) -> Result<(), AppError> {
    if n == 0 {
        return Err(AppError::invalid_input(
            "Information criteria need at least one observation (n = 0).",
        ));
    }
    if rss.is_nan() {
        return Err(AppError::invalid_input("Residual sum of squares is NaN."));
    }
    if rss < 0.0 {
        return Err(AppError::invalid_input(format!(
            "Residual sum of squares must be non-negative, got {rss}."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closed_form() {
        let ic = information_criteria(100.0, 50, 3).unwrap();
        let aic = 50.0 * 2f64.ln() + 6.0;
        assert!((ic.aic - aic).abs() < 1e-6, "aic={}", ic.aic);
        assert!((ic.aicc - (aic + 24.0 / 46.0)).abs() < 1e-6, "aicc={}", ic.aicc);
        assert!((ic.aic - 40.657).abs() < 1e-3);
        assert!((ic.aicc - 41.179).abs() < 1e-3);
    }

    #[test]
    fn aicc_never_below_aic() {
        for &rss in &[1e-6, 0.5, 3.0, 1e4] {
            for n in 2..40usize {
                for k in 0..n.saturating_sub(1) {
                    let ic = information_criteria(rss, n, k).unwrap();
                    assert!(ic.aicc >= ic.aic, "rss={rss} n={n} k={k}: {ic:?}");
                }
            }
        }
    }

    #[test]
    fn zero_parameters_has_no_correction() {
        let ic = information_criteria(4.0, 10, 0).unwrap();
        assert_eq!(ic.aic, ic.aicc);
    }

    #[test]
    fn degenerate_dof_is_infinite_not_an_error() {
        let ic = information_criteria(2.0, 5, 4).unwrap();
        assert!(ic.aic.is_finite());
        assert_eq!(ic.aicc, f64::INFINITY);
        assert!(!ic.aicc_is_defined());

        // More parameters than observations.
        let ic = information_criteria(2.0, 3, 7).unwrap();
        assert_eq!(ic.aicc, f64::INFINITY);
    }

    #[test]
    fn boundary_is_strict() {
        assert!(aicc_correction(5, 4).is_none());
        let c = aicc_correction(6, 4).unwrap();
        assert!((c - 40.0).abs() < 1e-12);
        assert!(aicc_correction(1, usize::MAX).is_none());
    }

    #[test]
    fn correction_shrinks_with_more_data() {
        let k = 4;
        let ratio = 0.0625;
        let mut prev = f64::INFINITY;
        for &n in &[10usize, 20, 50, 100, 1_000, 10_000] {
            let ic = information_criteria(ratio * n as f64, n, k).unwrap();
            let gap = ic.aicc - ic.aic;
            assert!(gap > 0.0 && gap < prev, "n={n} gap={gap} prev={prev}");
            prev = gap;
        }
        assert!(prev < 0.01);
    }

    #[test]
    fn perfect_fit_gives_negative_infinity() {
        let ic = information_criteria(0.0, 10, 2).unwrap();
        assert_eq!(ic.aic, f64::NEG_INFINITY);
        assert_eq!(ic.aicc, f64::NEG_INFINITY);
        assert!(ic.aicc_is_defined());
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let err = information_criteria(-1.0, 10, 2).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
        assert!(err.message().contains("non-negative"));

        assert!(information_criteria(1.0, 0, 0).is_err());
        assert!(information_criteria(f64::NAN, 10, 2).is_err());
    }

    #[test]
    fn rss_sums_squares() {
        assert_eq!(rss(&[]), 0.0);
        assert!((rss(&[1.0, -2.0, 0.5]) - 5.25).abs() < 1e-12);
    }
}
