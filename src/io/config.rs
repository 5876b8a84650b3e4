//! Dataset configuration JSON.
//!
//! Recognised fields (all required):
//!
//! ```json
//! {
//!   "temperatures": [270, 240, ...],
//!   "volumes": [587.613, 587.246, ...],
//!   "atom_count": 24,
//!   "boltzmann_constant": 1.38e7,
//!   "initial_guess": [200, 1e-10, 586.15]
//! }
//! ```
//!
//! Unknown fields are rejected so that typos do not silently fall back to
//! defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::domain::DatasetConfig;
use crate::error::AppError;

/// Parse a dataset config from a JSON string.
pub fn parse_dataset_json(text: &str) -> Result<DatasetConfig, AppError> {
    serde_json::from_str(text).map_err(|e| AppError::Config(format!("invalid dataset JSON: {e}")))
}

/// Read a dataset config JSON file.
pub fn read_dataset_json(path: &Path) -> Result<DatasetConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("failed to open dataset '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::Config(format!("invalid dataset JSON '{}': {e}", path.display()))
    })
}

/// Write a dataset config JSON file.
pub fn write_dataset_json(path: &Path, config: &DatasetConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("failed to create dataset '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, config)
        .map_err(|e| AppError::Io(format!("failed to write dataset JSON: {e}")))?;
    Ok(())
}
