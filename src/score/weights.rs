//! Akaike weights: relative likelihoods of a set of candidate models.

/// Convert criterion values (AIC or AICc) into weights that sum to one.
///
/// `w_i = exp(-Δ_i / 2) / Σ_j exp(-Δ_j / 2)` with `Δ_i = score_i - min(score)`.
///
/// Infinite scores (e.g. an undefined AICc) get weight zero. If no score is
/// finite the weights are uniform. A `-inf` score (perfect fit) takes all the
/// weight, shared equally with any other `-inf` scores.
pub fn akaike_weights(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let perfect = scores.iter().filter(|s| **s == f64::NEG_INFINITY).count();
    if perfect > 0 {
        let w = 1.0 / perfect as f64;
        return scores
            .iter()
            .map(|&s| if s == f64::NEG_INFINITY { w } else { 0.0 })
            .collect();
    }

    let best = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !best.is_finite() {
        let w = 1.0 / scores.len() as f64;
        return vec![w; scores.len()];
    }

    let rel: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_finite() { (-(s - best) / 2.0).exp() } else { 0.0 })
        .collect();
    let total: f64 = rel.iter().sum();
    rel.into_iter().map(|r| r / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_and_favor_lowest() {
        let w = akaike_weights(&[10.0, 12.0, 20.0]);
        let total: f64 = w.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(w[0] > w[1] && w[1] > w[2]);
        // Δ = 2 means a relative likelihood of exp(-1).
        assert!((w[1] / w[0] - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn infinite_scores_get_zero_weight() {
        let w = akaike_weights(&[5.0, f64::INFINITY]);
        assert_eq!(w, vec![1.0, 0.0]);

        let w = akaike_weights(&[f64::INFINITY, f64::INFINITY]);
        assert_eq!(w, vec![0.5, 0.5]);
    }

    #[test]
    fn perfect_fit_takes_everything() {
        let w = akaike_weights(&[f64::NEG_INFINITY, 3.0]);
        assert_eq!(w, vec![1.0, 0.0]);
    }

    #[test]
    fn empty_input() {
        assert!(akaike_weights(&[]).is_empty());
    }
}
