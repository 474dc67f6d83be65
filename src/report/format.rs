//! Terminal formatting.
//!
//! We keep formatting code in one place so:
//! - the fitting and scoring code stays free of presentation
//! - output changes are localized

use crate::domain::ModelKind;
use crate::fit::{Comparison, Ranking};
use crate::io::DatasetStats;
use crate::score::InformationCriteria;
use crate::solver::CurveFitOutput;

/// `score` subcommand output.
pub fn format_score(rss: f64, n: usize, k: usize, scores: &InformationCriteria) -> String {
    let mut out = String::new();
    out.push_str(&format!("RSS={} n={n} k={k}\n", fmt_num(rss)));
    out.push_str(&format!("AIC  = {}\n", fmt_num(scores.aic)));
    out.push_str(&format!("AICc = {}", fmt_num(scores.aicc)));
    if !scores.aicc_is_defined() {
        out.push_str(" (undefined: n - k - 1 <= 0)");
    }
    out.push('\n');
    out
}

/// Single-model fit: parameters with one-sigma errors, then solver status and
/// scores when the full output is present.
pub fn format_fit(kind: ModelKind, fit: &CurveFitOutput, stats: &DatasetStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== fit-aic: {} ===\n", kind.display_name()));
    out.push_str(&format!(
        "Points: n={} | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}]\n\n",
        stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max
    ));

    out.push_str(&format!("{:<8} {:>14} {:>14}\n", "param", "value", "stderr"));
    out.push_str(&format!("{:-<8} {:-<14} {:-<14}\n", "", "", ""));
    let perr = fit.perr();
    for ((name, value), err) in kind.param_names().iter().zip(fit.popt.iter()).zip(perr.iter()) {
        out.push_str(&format!("{name:<8} {:>14} {:>14}\n", fmt_num(*value), fmt_num(*err)));
    }

    if let Some(full) = &fit.full {
        out.push('\n');
        out.push_str(&format!("ier={} nfev={}: {}\n", full.ier, full.infodict.nfev, full.mesg));
        if let (Some(aic), Some(aicc)) = (full.infodict.aic, full.infodict.aicc) {
            out.push_str(&format!("AIC={} AICc={}\n", fmt_num(aic), fmt_num(aicc)));
        }
    }

    out
}

/// Multi-model comparison: both front-ends' AIC side by side, then the ranking.
pub fn format_comparison(comparison: &Comparison, stats: &DatasetStats) -> String {
    let mut out = String::new();
    out.push_str("=== fit-aic: model comparison ===\n");
    out.push_str(&format!(
        "Points: n={} | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}]\n\n",
        stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max
    ));

    out.push_str("Model diagnostics:\n");
    out.push_str(&format!(
        "  {:<20} {:>3} {:>12} {:>12} {:>12} {:>12}  {}\n",
        "model", "k", "RSS", "AIC", "AICc", "AIC(model)", "status"
    ));
    for fit in &comparison.fits {
        let status = if fit.success() { "ok" } else { "not converged" };
        out.push_str(&format!(
            "  {:<20} {:>3} {:>12} {:>12} {:>12} {:>12}  {status}\n",
            fit.kind.display_name(),
            fit.kind.param_count(),
            fmt_num(fit.rss()),
            fmt_num(fit.scores.aic),
            fmt_num(fit.scores.aicc),
            fmt_num(fit.model_result.aic),
        ));
    }
    for (kind, reason) in &comparison.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    out.push('\n');
    out.push_str(&format_ranking(&comparison.ranking));
    out
}

/// Ranking table plus the chosen model.
pub fn format_ranking(ranking: &Ranking) -> String {
    let label = ranking.criterion.label();
    let mut out = String::new();
    out.push_str(&format!("Ranking by {label}:\n"));
    out.push_str(&format!(
        "  {:<3} {:<20} {:>12} {:>10} {:>8}\n",
        "#",
        "model",
        label,
        format!("Δ{label}"),
        "weight"
    ));
    for (pos, fit) in ranking.fits.iter().enumerate() {
        let mark = if pos == ranking.preferred { "*" } else { " " };
        out.push_str(&format!(
            "{mark} {:<3} {:<20} {:>12} {:>10} {:>8.4}\n",
            pos + 1,
            truncate(&fit.label, 20),
            fmt_num(fit.score),
            fmt_num(fit.delta),
            fit.weight
        ));
    }

    let best = ranking.best();
    let preferred = ranking.preferred();
    out.push_str(&format!("\nPreferred model: {}", preferred.label));
    if preferred.label != best.label {
        out.push_str(&format!(
            " (simpler than {} and within {:.1} {label})",
            best.label,
            crate::fit::PREFER_SIMPLER_DELTA
        ));
    }
    out.push('\n');
    out
}

fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{v:.4}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
