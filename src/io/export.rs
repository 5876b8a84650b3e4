//! Export per-point results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::PointResidual;
use crate::error::AppError;

/// Write per-point results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[PointResidual]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "temperature,v_obs,v_fit,residual")
        .map_err(|e| AppError::Io(format!("failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            out,
            "{},{:.6},{:.6},{:.6e}",
            r.temperature, r.v_obs, r.v_fit, r.residual
        )
        .map_err(|e| AppError::Io(format!("failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::Io(format!("failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("residuals.csv");
        let rows = [
            PointResidual {
                temperature: 270.0,
                v_obs: 587.613,
                v_fit: 587.6,
                residual: 0.013,
            },
            PointResidual {
                temperature: 20.0,
                v_obs: 586.065,
                v_fit: 586.07,
                residual: -0.005,
            },
        ];
        write_results_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "temperature,v_obs,v_fit,residual");
        assert!(lines[1].starts_with("270,587.613000,587.600000,"), "{}", lines[1]);
        assert!(lines[2].starts_with("20,"), "{}", lines[2]);
    }
}
