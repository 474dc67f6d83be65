//! Formatted terminal output for scores, fits and rankings.

pub mod format;

pub use format::*;
