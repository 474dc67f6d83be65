//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - built-in model kinds and the selection criterion (`ModelKind`, `Criterion`)
//! - the observation container (`DataSet`)
//! - run configuration and exported report shapes

pub mod types;

pub use types::*;
