//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated inputs (`Measurements`, `PhysicalConstants`, `DebyeParams`)
//! - the JSON dataset config (`DatasetConfig`) and run options (`FitConfig`)
//! - fit outputs (`FitResult`, `FitQuality`, `CurveFile`, etc.)

pub mod types;

pub use types::*;
