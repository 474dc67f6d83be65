//! Seeded synthetic observations from a built-in model.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DataSet, ModelKind};
use crate::error::AppError;
use crate::models::predict;

/// `n` evenly spaced points from `start` to `stop` inclusive.
///
/// `n = 1` yields `[start]`; `n = 0` yields an empty grid.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Evaluate `model` at `x` and add i.i.d. Gaussian noise of std `noise`.
///
/// The same `seed` always produces the same data set.
pub fn simulate(
    model: ModelKind,
    params: &[f64],
    x: &[f64],
    noise: f64,
    seed: u64,
) -> Result<DataSet, AppError> {
    if params.len() != model.param_count() {
        return Err(AppError::invalid_input(format!(
            "Model '{}' takes {} parameters, got {}.",
            model.display_name(),
            model.param_count(),
            params.len()
        )));
    }
    if x.is_empty() {
        return Err(AppError::invalid_input("Sample count must be > 0."));
    }
    if !(noise.is_finite() && noise >= 0.0) {
        return Err(AppError::invalid_input(format!(
            "Noise level must be finite and >= 0, got {noise}."
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::fit_failure(format!("Noise distribution error: {e}")))?;

    let mut y = Vec::with_capacity(x.len());
    for &xi in x {
        let clean = predict(model, xi, params);
        if !clean.is_finite() {
            return Err(AppError::invalid_input(format!(
                "Model '{}' is not finite at x = {xi} with the given parameters.",
                model.display_name()
            )));
        }
        let z: f64 = normal.sample(&mut rng);
        y.push(clean + noise * z);
    }

    log::debug!(model = model.display_name(), n = x.len(), noise = noise, seed = seed; "simulated data");
    Ok(DataSet::new(x.to_vec(), y))
}
