//! Reporting utilities: residuals, the fitted curve, and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{CurveGrid, DebyeParams, Measurements, PhysicalConstants, PointResidual};
use crate::error::AppError;
use crate::models::predict_volumes;

/// Compute fitted values and residuals for each measurement.
pub fn compute_residuals(
    measurements: &Measurements,
    constants: &PhysicalConstants,
    params: &DebyeParams,
) -> Result<Vec<PointResidual>, AppError> {
    let fitted = predict_volumes(constants, measurements.temperatures(), params)?;
    let mut out = Vec::with_capacity(measurements.len());
    for ((temperature, v_obs), v_fit) in measurements.points().zip(fitted) {
        if !v_fit.is_finite() {
            return Err(AppError::Numerical(format!(
                "non-finite model prediction at T={temperature}"
            )));
        }
        out.push(PointResidual {
            temperature,
            v_obs,
            v_fit,
            residual: v_obs - v_fit,
        });
    }
    Ok(out)
}

/// Sample the fitted model at `n` evenly spaced temperatures over `[t_min, t_max]`.
pub fn fitted_curve(
    constants: &PhysicalConstants,
    params: &DebyeParams,
    t_min: f64,
    t_max: f64,
    n: usize,
) -> Result<CurveGrid, AppError> {
    if n < 2 {
        return Err(AppError::Config(format!("curve needs at least 2 points, got {n}")));
    }
    if !(t_min.is_finite() && t_max.is_finite()) || t_max < t_min {
        return Err(AppError::Config(format!(
            "invalid curve temperature range [{t_min}, {t_max}]"
        )));
    }

    let temperatures: Vec<f64> = (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            t_min + u * (t_max - t_min)
        })
        .collect();
    let volumes = predict_volumes(constants, &temperatures, params)?;
    Ok(CurveGrid {
        temperatures,
        volumes,
    })
}
