//! Numerical building blocks: adaptive quadrature and SVD least squares.

pub mod lstsq;
pub mod quadrature;

pub use lstsq::*;
pub use quadrature::*;
