//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fit:
//! - constants, fitted parameters and covariance
//! - fit-quality diagnostics
//! - the observations and a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, CurveGrid, FitResult, Measurements, PhysicalConstants};
use crate::error::AppError;

/// Assemble the serializable curve description for a finished fit.
pub fn build_curve_file(
    fit: &FitResult,
    constants: &PhysicalConstants,
    measurements: &Measurements,
    grid: &CurveGrid,
) -> CurveFile {
    CurveFile {
        tool: "debye".to_string(),
        generated_at: Utc::now(),
        constants: *constants,
        params: fit.params,
        covariance: fit.covariance_rows(),
        fit_quality: fit.quality.clone(),
        observations: CurveGrid {
            temperatures: measurements.temperatures().to_vec(),
            volumes: measurements.volumes().to_vec(),
        },
        grid: grid.clone(),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::Io(format!("failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::Config(format!("invalid curve JSON: {e}")))?;
    if curve.grid.temperatures.len() != curve.grid.volumes.len() {
        return Err(AppError::Shape(format!(
            "curve grid has {} temperatures but {} volumes",
            curve.grid.temperatures.len(),
            curve.grid.volumes.len()
        )));
    }
    Ok(curve)
}
