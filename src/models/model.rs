//! The `ModelFunction` trait and the built-in model families.
//!
//! A model exposes:
//! - its parameter names (their order is the order of the parameter vector)
//! - `eval(x, params)` for a single abscissa
//! - an optional data-driven initial guess
//!
//! `ModelKind` implements the trait directly; `FnModel` adapts a closure.

use nalgebra::{DMatrix, DVector};

use crate::domain::ModelKind;
use crate::math::solve_least_squares;

pub trait ModelFunction: Sync {
    fn name(&self) -> &str;

    fn param_names(&self) -> Vec<String>;

    fn eval(&self, x: f64, params: &[f64]) -> f64;

    fn n_params(&self) -> usize {
        self.param_names().len()
    }

    /// Starting point for a fit. Defaults to all ones.
    fn initial_guess(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let _ = (x, y);
        vec![1.0; self.n_params()]
    }

    /// Evaluate at every abscissa.
    fn eval_all(&self, x: &[f64], params: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.eval(xi, params)).collect()
    }
}

/// Evaluate a built-in model.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Linear => params[0] + params[1] * x,
        ModelKind::Quadratic => params[0] + params[1] * x + params[2] * x * x,
        ModelKind::Exponential => params[0] * (-x / params[1]).exp(),
        ModelKind::DoubleExponential => {
            params[0] * (-x / params[1]).exp() + params[2] * (-x / params[3]).exp()
        }
        ModelKind::Gaussian => {
            let z = (x - params[1]) / params[2];
            params[0] * (-0.5 * z * z).exp()
        }
    }
}

impl ModelFunction for ModelKind {
    fn name(&self) -> &str {
        self.display_name()
    }

    fn param_names(&self) -> Vec<String> {
        ModelKind::param_names(*self).iter().map(|s| s.to_string()).collect()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        predict(*self, x, params)
    }

    fn n_params(&self) -> usize {
        self.param_count()
    }

    fn initial_guess(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let guess = match self {
            ModelKind::Linear => polynomial_guess(x, y, 1),
            ModelKind::Quadratic => polynomial_guess(x, y, 2),
            ModelKind::Exponential => exponential_guess(x, y).map(|(a, tau)| vec![a, tau]),
            // Split the single-exponential guess into a fast and a slow component.
            ModelKind::DoubleExponential => {
                exponential_guess(x, y).map(|(a, tau)| vec![a / 2.0, tau / 3.0, a / 2.0, tau * 3.0])
            }
            ModelKind::Gaussian => gaussian_guess(x, y),
        };
        match guess {
            Some(g) if g.iter().all(|v| v.is_finite()) => g,
            _ => vec![1.0; self.param_count()],
        }
    }
}

/// A model backed by a closure.
pub struct FnModel<F> {
    name: String,
    param_names: Vec<String>,
    func: F,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    pub fn new(name: impl Into<String>, param_names: &[&str], func: F) -> Self {
        Self {
            name: name.into(),
            param_names: param_names.iter().map(|s| s.to_string()).collect(),
            func,
        }
    }
}

impl<F> ModelFunction for FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn param_names(&self) -> Vec<String> {
        self.param_names.clone()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (self.func)(x, params)
    }
}

fn polynomial_guess(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = x.len().min(y.len());
    if n <= degree {
        return None;
    }
    let mut design = DMatrix::<f64>::zeros(n, degree + 1);
    for i in 0..n {
        let mut pow = 1.0;
        for j in 0..=degree {
            design[(i, j)] = pow;
            pow *= x[i];
        }
    }
    let rhs = DVector::from_column_slice(&y[..n]);
    solve_least_squares(&design, &rhs).map(|beta| beta.iter().copied().collect())
}

/// Log-linear regression `ln y = ln A - x / tau` on the positive observations.
fn exponential_guess(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let (xs, ln_y): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite() && **yi > 0.0)
        .map(|(&xi, &yi)| (xi, yi.ln()))
        .unzip();
    let beta = polynomial_guess(&xs, &ln_y, 1)?;
    let (c0, c1) = (beta[0], beta[1]);
    let a = c0.exp();
    let tau = if c1 < 0.0 {
        -1.0 / c1
    } else {
        // Not decaying: fall back to half the observed span.
        let (lo, hi) = span(&xs)?;
        ((hi - lo) / 2.0).max(1.0)
    };
    Some((a, tau))
}

fn gaussian_guess(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    let (peak_idx, &peak) = y
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    let mu = *x.get(peak_idx)?;

    let mut sw = 0.0;
    let mut s2 = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if yi > 0.0 && yi.is_finite() && xi.is_finite() {
            sw += yi;
            s2 += yi * (xi - mu) * (xi - mu);
        }
    }
    let sigma = if sw > 0.0 && s2 > 0.0 {
        (s2 / sw).sqrt()
    } else {
        let (lo, hi) = span(x)?;
        ((hi - lo) / 4.0).max(1e-3)
    };
    Some(vec![peak, mu, sigma])
}

fn span(values: &[f64]) -> Option<(f64, f64)> {
    let lo = values.iter().copied().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi.is_finite() { Some((lo, hi)) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_double_exponential() {
        let p = [3.0, 1.0, 5.0, 10.0];
        let y = predict(ModelKind::DoubleExponential, 0.0, &p);
        assert!((y - 8.0).abs() < 1e-12);
        let y = predict(ModelKind::DoubleExponential, 10.0, &p);
        assert!((y - (3.0 * (-10.0f64).exp() + 5.0 * (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn gaussian_peaks_at_mu() {
        let p = [2.0, 1.5, 0.3];
        assert!((predict(ModelKind::Gaussian, 1.5, &p) - 2.0).abs() < 1e-12);
        assert!(predict(ModelKind::Gaussian, 3.0, &p) < 2.0);
    }

    #[test]
    fn linear_guess_is_exact_on_linear_data() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 - 0.5 * v).collect();
        let g = ModelKind::Linear.initial_guess(&x, &y);
        assert!((g[0] - 2.0).abs() < 1e-9);
        assert!((g[1] + 0.5).abs() < 1e-9);
    }

    #[test]
    fn exponential_guess_recovers_decay() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 4.0 * (-v / 2.5).exp()).collect();
        let g = ModelKind::Exponential.initial_guess(&x, &y);
        assert!((g[0] - 4.0).abs() < 1e-6);
        assert!((g[1] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn guess_falls_back_to_ones() {
        let g = ModelKind::Exponential.initial_guess(&[1.0], &[-1.0]);
        assert_eq!(g, vec![1.0, 1.0]);
    }

    #[test]
    fn fn_model_wraps_closure() {
        let m = FnModel::new("offset", &["c"], |x, p: &[f64]| x + p[0]);
        assert_eq!(m.name(), "offset");
        assert_eq!(m.n_params(), 1);
        assert_eq!(m.eval_all(&[1.0, 2.0], &[0.5]), vec![1.5, 2.5]);
        assert_eq!(m.initial_guess(&[], &[]), vec![1.0]);
    }
}
