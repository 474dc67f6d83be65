//! Model selection by information criterion.
//!
//! Candidates are ranked by AICc (or AIC) and reported with:
//! - `delta = score - best`
//! - Akaike weights `exp(-delta/2)` normalised over the candidate set
//!
//! Selection rule: the best model is the one with the lowest score, but if a
//! simpler model (fewer parameters) is within `PREFER_SIMPLER_DELTA` of it,
//! the simpler model is preferred.

use serde::Serialize;

use crate::domain::Criterion;
use crate::error::AppError;
use crate::score::{InformationCriteria, akaike_weights};

/// Models within this many criterion points of the best are "as good".
pub const PREFER_SIMPLER_DELTA: f64 = 2.0;

/// One model offered for ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub label: String,
    pub param_count: usize,
    pub scores: InformationCriteria,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFit {
    pub label: String,
    pub param_count: usize,
    /// Position in the candidate list passed to `rank`.
    pub input_index: usize,
    pub scores: InformationCriteria,
    /// The score under the ranking criterion.
    pub score: f64,
    pub delta: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub criterion: Criterion,
    /// Ascending by score; ties keep input order.
    pub fits: Vec<RankedFit>,
    /// Index into `fits` of the preferred model.
    pub preferred: usize,
}

impl Ranking {
    pub fn best(&self) -> &RankedFit {
        &self.fits[0]
    }

    pub fn preferred(&self) -> &RankedFit {
        &self.fits[self.preferred]
    }

    /// Look a candidate up by its position in the input list.
    pub fn by_input_index(&self, index: usize) -> Option<&RankedFit> {
        self.fits.iter().find(|f| f.input_index == index)
    }
}

/// Rank candidates under `criterion`.
///
/// # Errors
/// Exit code 3 when there are no candidates.
pub fn rank(candidates: &[Candidate], criterion: Criterion) -> Result<Ranking, AppError> {
    if candidates.is_empty() {
        return Err(AppError::insufficient_data("No fitted models to rank."));
    }

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| criterion_score(&c.scores, criterion))
        .collect();
    let weights = akaike_weights(&scores);

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    // Stable sort: ties keep input order.
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let best = scores[order[0]];

    let fits: Vec<RankedFit> = order
        .iter()
        .map(|&i| {
            let c = &candidates[i];
            RankedFit {
                label: c.label.clone(),
                param_count: c.param_count,
                input_index: i,
                scores: c.scores,
                score: scores[i],
                delta: delta(scores[i], best),
                weight: weights[i],
            }
        })
        .collect();

    let preferred = fits
        .iter()
        .enumerate()
        .filter(|(_, f)| f.delta <= PREFER_SIMPLER_DELTA)
        .min_by_key(|(_, f)| (f.param_count, f.input_index))
        .map(|(pos, _)| pos)
        .unwrap_or(0);

    log::debug!(
        criterion = criterion.label(),
        best = fits[0].label.as_str(),
        preferred = fits[preferred].label.as_str();
        "ranked {} candidates",
        fits.len()
    );

    Ok(Ranking {
        criterion,
        fits,
        preferred,
    })
}

pub fn criterion_score(scores: &InformationCriteria, criterion: Criterion) -> f64 {
    match criterion {
        Criterion::Aicc => scores.aicc,
        Criterion::Aic => scores.aic,
    }
}

fn delta(score: f64, best: f64) -> f64 {
    // Equal infinities would otherwise give NaN.
    if score == best { 0.0 } else { score - best }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, k: usize, aic: f64, aicc: f64) -> Candidate {
        Candidate {
            label: label.to_string(),
            param_count: k,
            scores: InformationCriteria { aic, aicc },
        }
    }

    #[test]
    fn prefers_simpler_when_close() {
        let candidates = vec![
            candidate("simple", 2, 10.0, 11.5),
            candidate("complex", 4, 9.0, 10.0),
        ];
        let ranking = rank(&candidates, Criterion::Aicc).unwrap();

        assert_eq!(ranking.best().label, "complex");
        assert_eq!(ranking.preferred().label, "simple");
        assert!((ranking.preferred().delta - 1.5).abs() < 1e-12);
    }

    #[test]
    fn keeps_best_when_gap_is_large() {
        let candidates = vec![
            candidate("simple", 2, 40.0, 41.0),
            candidate("complex", 4, 9.0, 10.0),
        ];
        let ranking = rank(&candidates, Criterion::Aicc).unwrap();
        assert_eq!(ranking.preferred().label, "complex");
        assert!(ranking.best().weight > 0.99);
    }

    #[test]
    fn criterion_changes_the_order() {
        let candidates = vec![
            candidate("a", 2, 10.0, 10.5),
            candidate("b", 6, 9.0, 14.0),
        ];
        assert_eq!(rank(&candidates, Criterion::Aic).unwrap().best().label, "b");
        assert_eq!(rank(&candidates, Criterion::Aicc).unwrap().best().label, "a");
    }

    #[test]
    fn weights_sum_to_one_and_deltas_start_at_zero() {
        let candidates = vec![
            candidate("a", 1, 3.0, 3.0),
            candidate("b", 2, 1.0, 1.0),
            candidate("c", 3, 7.0, f64::INFINITY),
        ];
        let ranking = rank(&candidates, Criterion::Aicc).unwrap();
        let labels: Vec<&str> = ranking.fits.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(ranking.best().delta, 0.0);
        assert_eq!(ranking.fits[2].weight, 0.0);
        let total: f64 = ranking.fits.iter().map(|f| f.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(ranking.by_input_index(0).unwrap().label, "a");
    }

    #[test]
    fn ties_keep_input_order() {
        let candidates = vec![candidate("x", 3, 5.0, 5.0), candidate("y", 3, 5.0, 5.0)];
        let ranking = rank(&candidates, Criterion::Aicc).unwrap();
        assert_eq!(ranking.best().label, "x");
        assert_eq!(ranking.preferred().label, "x");
    }

    #[test]
    fn all_undefined_aicc_is_not_nan() {
        let candidates = vec![
            candidate("x", 3, 5.0, f64::INFINITY),
            candidate("y", 2, 6.0, f64::INFINITY),
        ];
        let ranking = rank(&candidates, Criterion::Aicc).unwrap();
        assert!(ranking.fits.iter().all(|f| f.delta == 0.0));
        assert_eq!(ranking.preferred().label, "y");
    }

    #[test]
    fn empty_is_insufficient_data() {
        let err = rank(&[], Criterion::Aicc).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INSUFFICIENT_DATA);
    }
}
