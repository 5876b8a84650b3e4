//! `debye-fit` library crate.
//!
//! Fits the Debye thermal-expansion model `V(T) = γ/B₀ · U(T; θ_D) + V₀` to
//! measured `(T, V)` pairs.
//!
//! The binary (`debye`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the quadrature, model and optimizer are reusable on their own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
