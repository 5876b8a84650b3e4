//! Input data: the compiled-in reference dataset and synthetic samples.

pub mod reference;
pub mod sample;

pub use reference::*;
pub use sample::*;
