//! Plot rendering.
//!
//! - `ascii`: fixed-size character grid for the terminal
//! - `svg`: Plotters chart written to an SVG file

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
