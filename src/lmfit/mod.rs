//! Declarative model fitting.
//!
//! A `Model` binds a `ModelFunction` to named `Parameters` (each with a value,
//! a vary flag and optional bounds) and fits them against data. The resulting
//! `ModelResult` carries its own goodness-of-fit statistics, including a native
//! AIC and BIC.
//!
//! `Fitter` is the seam other layers decorate (see `augment::WithAicc`).

pub mod model;
pub mod parameters;

pub use model::*;
pub use parameters::*;
