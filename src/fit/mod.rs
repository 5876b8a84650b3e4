//! Curve fitting.
//!
//! Responsibilities:
//!
//! - a generic Levenberg–Marquardt solver (`lm`)
//! - the Debye volume-model adapter, covariance and diagnostics (`fitter`)

pub mod fitter;
pub mod lm;

pub use fitter::*;
pub use lm::*;
