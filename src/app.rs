//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads data / runs fits and model selection
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, CompareArgs, FitArgs, ScoreArgs, SimulateArgs};
use crate::domain::{ModelKind, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fit-aic` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Score(args) => handle_score(&args),
        Command::Fit(args) => handle_fit(&args),
        Command::Compare(args) => handle_compare(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn handle_score(args: &ScoreArgs) -> Result<(), AppError> {
    let scores = crate::score::information_criteria(args.rss, args.n, args.k)?;
    print!("{}", crate::report::format_score(args.rss, args.n, args.k, &scores));
    Ok(())
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(args);
    let run = pipeline::run_fit(&config, args.model)?;

    println!(
        "{}",
        crate::report::format_fit(args.model, &run.fit, &run.ingest.stats)
    );
    if let Some(path) = &config.export {
        crate::io::write_report_json(path, &run.report)?;
    }
    Ok(())
}

fn handle_compare(args: &CompareArgs) -> Result<(), AppError> {
    let config = compare_config_from_args(args);
    let run = pipeline::run_compare(&config)?;

    println!(
        "{}",
        crate::report::format_comparison(&run.comparison, &run.ingest.stats)
    );
    if let Some(path) = &config.export {
        crate::io::write_report_json(path, &run.report)?;
    }
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    if args.n == 0 {
        return Err(AppError::invalid_input("Sample count must be > 0."));
    }
    if !(args.x_min.is_finite() && args.x_max.is_finite() && args.x_max > args.x_min) {
        return Err(AppError::invalid_input("Invalid x range: require x_min < x_max."));
    }
    let x = crate::data::linspace(args.x_min, args.x_max, args.n);
    let data = crate::data::simulate(args.model, &args.params, &x, args.noise, args.seed)?;
    crate::io::write_dataset(&args.out, &data)?;
    println!("Wrote {} points to {}", data.len(), args.out.display());
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.data.clone(),
        models: vec![args.model],
        p0: args.p0.clone(),
        criterion: Default::default(),
        jac: args.data.jac,
        absolute_sigma: args.data.absolute_sigma,
        full_output: args.full_output,
        export: args.data.export.clone(),
    }
}

pub fn compare_config_from_args(args: &CompareArgs) -> RunConfig {
    let models = if args.models.is_empty() {
        ModelKind::ALL.to_vec()
    } else {
        args.models.clone()
    };
    RunConfig {
        data_path: args.data.data.clone(),
        models,
        p0: None,
        criterion: args.criterion,
        jac: args.data.jac,
        absolute_sigma: args.data.absolute_sigma,
        full_output: true,
        export: args.data.export.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::Criterion;

    #[test]
    fn compare_defaults_to_every_model() {
        let cli = Cli::try_parse_from(["fit-aic", "compare", "--data", "d.csv"]).unwrap();
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        let config = compare_config_from_args(&args);
        assert_eq!(config.models, ModelKind::ALL.to_vec());
        assert_eq!(config.criterion, Criterion::Aicc);
        assert!(config.full_output);
    }
}
