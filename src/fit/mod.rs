//! Fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit each requested model through both front-ends (parallel)
//! - rank the fits by AICc / AIC with the prefer-simpler rule

pub mod compare;
pub mod selection;

pub use compare::*;
pub use selection::*;
