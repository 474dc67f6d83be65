//! AIC/AICc injection into both fitting front-ends.
//!
//! - `curve_fit`: same call as `solver::curve_fit`; when full output is
//!   requested the info dictionary gains `aic` and `aicc`
//! - `WithAicc`: wraps any `lmfit::Fitter` and fills `ModelResult::aicc`
//!
//! Neither path alters the underlying fit. Scores come from
//! `score::information_criteria`.

pub mod curve_fit;
pub mod model;

pub use curve_fit::curve_fit;
pub use model::*;
