//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - data set CSV and report JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
