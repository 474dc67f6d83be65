//! Information criteria for least-squares fits.
//!
//! Everything in here is a pure function of `(rss, n, k)`:
//!
//! - `AIC  = n * ln(RSS/n) + 2k`
//! - `AICc = AIC + 2k(k+1) / (n - k - 1)`, or `+inf` when `n - k - 1 <= 0`
//!
//! plus Akaike weights for comparing several candidate fits.

pub mod criteria;
pub mod weights;

pub use criteria::*;
pub use weights::*;
