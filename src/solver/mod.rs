//! Non-linear least-squares curve fitting.
//!
//! This is the "plain" solver front-end: it knows nothing about information
//! criteria. `augment::curve_fit` wraps it and adds AIC/AICc on request.
//!
//! - `options`: the explicit options struct replacing keyword forwarding
//! - `lm`: the bridge to the `levenberg-marquardt` crate
//! - `curve_fit`: input validation, covariance, termination reporting

pub mod curve_fit;
pub mod lm;
pub mod options;

pub use curve_fit::*;
pub use options::*;
