//! `fit-aic` library crate.
//!
//! The binary (`fit-aic`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the scoring and fitting layers are reusable on their own
//!
//! Layers, bottom-up:
//!
//! - `score`: AIC / AICc from `(rss, n, k)` and Akaike weights
//! - `solver`: least-squares `curve_fit` front-end
//! - `lmfit`: declarative `Model` / `Parameters` front-end
//! - `augment`: attaches AIC / AICc to both front-ends' results
//! - `fit`: multi-model comparison and selection

pub mod app;
pub mod augment;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod lmfit;
pub mod math;
pub mod models;
pub mod report;
pub mod score;
pub mod solver;
