//! Input/output helpers.
//!
//! - dataset config JSON (`config`)
//! - per-point result exports (CSV) (`export`)
//! - curve JSON read/write (`curve`)

pub mod config;
pub mod curve;
pub mod export;

pub use config::*;
pub use curve::*;
pub use export::*;
