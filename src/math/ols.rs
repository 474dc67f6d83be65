//! Small dense least-squares helpers on top of nalgebra's SVD.
//!
//! Two uses in this crate:
//! - linear regressions for initial parameter guesses (`solve_least_squares`)
//! - the parameter covariance of a converged fit, `pinv(JᵀJ)`
//!   (`normal_pseudo_inverse`)
//!
//! Parameter dimensions are tiny (2-5 columns), so SVD cost does not matter and
//! its robustness on tall, nearly collinear matrices does.

use nalgebra::{DMatrix, DVector};

/// Solve `min ||X β - y||²` using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Moore-Penrose inverse of `JᵀJ`, computed from the SVD of `J` as
/// `V diag(1/s²) Vᵀ`.
///
/// Singular values below `eps * max(m, n) * s_max` are treated as zero, so a
/// rank-deficient Jacobian still yields a (pseudo-)covariance.
///
/// Returns `None` when `J` is empty, non-finite, or entirely zero.
pub fn normal_pseudo_inverse(j: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let (m, n) = j.shape();
    if m == 0 || n == 0 || j.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = j.clone().svd(false, true);
    let v_t = svd.v_t?;
    let s = svd.singular_values;

    let s_max = s.iter().copied().fold(0.0_f64, f64::max);
    if s_max <= 0.0 {
        return None;
    }
    let threshold = f64::EPSILON * m.max(n) as f64 * s_max;

    // v_t is (min(m, n) x n); only the rows matching kept singular values contribute.
    let mut out = DMatrix::<f64>::zeros(n, n);
    for (idx, &sv) in s.iter().enumerate() {
        if sv <= threshold {
            continue;
        }
        let inv = 1.0 / (sv * sv);
        let row = v_t.row(idx);
        for a in 0..n {
            for b in 0..n {
                out[(a, b)] += inv * row[a] * row[b];
            }
        }
    }

    if out.iter().all(|v| v.is_finite()) {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn pseudo_inverse_matches_inverse_on_full_rank() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let jtj = j.transpose() * &j;
        let expected = jtj.try_inverse().unwrap();
        let got = normal_pseudo_inverse(&j).unwrap();
        for (a, b) in got.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }

    #[test]
    fn pseudo_inverse_handles_rank_deficiency() {
        // Second column duplicates the first.
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let got = normal_pseudo_inverse(&j).unwrap();
        assert!(got.iter().all(|v| v.is_finite()));
        assert!(normal_pseudo_inverse(&DMatrix::zeros(3, 2)).is_none());
    }
}
