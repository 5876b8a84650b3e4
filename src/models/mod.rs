//! Debye thermal-expansion model.
//!
//! Models are implemented as small, pure functions so that fitting code can stay
//! generic over how residuals and derivatives are produced.

pub mod debye;
pub mod model;

pub use debye::*;
pub use model::*;
