//! Model functions `y = f(x; p)`.
//!
//! Models are small, pure functions so that both fitting front-ends can stay
//! generic over them.

pub mod model;

pub use model::*;
