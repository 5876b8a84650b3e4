//! Volume model `V(T) = γ/B₀ · U(T, θ_D) + V₀`.
//!
//! The fitter relies on two primitive operations:
//! - predict the volume sequence for a temperature sequence (residuals/plots)
//! - fill a Jacobian row of `∂V/∂(θ_D, γ/B₀, V₀)` (analytic Jacobian mode)
//!
//! Temperatures are independent of each other, so both run through a rayon
//! parallel iterator. Results come back in input order, and when several
//! temperatures fail the error for the lowest index is the one reported.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{DebyeParams, PARAM_COUNT, PhysicalConstants};
use crate::error::AppError;
use crate::models::{thermal_energy, thermal_energy_with_derivative};

/// Predict `V(T)` for a single temperature.
pub fn predict_volume(constants: &PhysicalConstants, t: f64, params: &DebyeParams) -> Result<f64, AppError> {
    let u = thermal_energy(constants, t, params.theta_d)?;
    Ok(params.gamma_over_b0 * u + params.v0)
}

/// Predict `V(T)` for every temperature, preserving order and length.
pub fn predict_volumes(
    constants: &PhysicalConstants,
    temperatures: &[f64],
    params: &DebyeParams,
) -> Result<Vec<f64>, AppError> {
    if temperatures.is_empty() {
        return Err(AppError::Shape("temperature sequence is empty".to_string()));
    }

    let evaluated: Vec<Result<f64, AppError>> = temperatures
        .par_iter()
        .map(|&t| predict_volume(constants, t, params))
        .collect();

    evaluated.into_iter().collect()
}

/// Fill `∂V/∂(θ_D, γ/B₀, V₀)` at temperature `t`.
pub fn fill_jacobian_row(
    constants: &PhysicalConstants,
    t: f64,
    params: &DebyeParams,
    out: &mut [f64; PARAM_COUNT],
) -> Result<(), AppError> {
    let (u, du_dtheta) = thermal_energy_with_derivative(constants, t, params.theta_d)?;
    out[0] = params.gamma_over_b0 * du_dtheta;
    out[1] = u;
    out[2] = 1.0;
    Ok(())
}

/// Analytic Jacobian of the predicted volumes, one row per temperature.
pub fn volume_jacobian(
    constants: &PhysicalConstants,
    temperatures: &[f64],
    params: &DebyeParams,
) -> Result<DMatrix<f64>, AppError> {
    if temperatures.is_empty() {
        return Err(AppError::Shape("temperature sequence is empty".to_string()));
    }

    let rows: Vec<Result<[f64; PARAM_COUNT], AppError>> = temperatures
        .par_iter()
        .map(|&t| {
            let mut row = [0.0; PARAM_COUNT];
            fill_jacobian_row(constants, t, params, &mut row).map(|()| row)
        })
        .collect();

    let mut jac = DMatrix::<f64>::zeros(temperatures.len(), PARAM_COUNT);
    for (i, row) in rows.into_iter().enumerate() {
        let row = row?;
        for (j, v) in row.iter().enumerate() {
            jac[(i, j)] = *v;
        }
    }
    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constants() -> PhysicalConstants {
        PhysicalConstants::new(24, 1.38e7).unwrap()
    }

    #[test]
    fn output_preserves_length_and_order() {
        let c = constants();
        let params = DebyeParams::new(250.0, 8e-12, 586.0);
        let temps = [270.0, 20.0, 130.0, 90.0, 240.0];

        let volumes = predict_volumes(&c, &temps, &params).unwrap();
        assert_eq!(volumes.len(), temps.len());
        for (&t, &v) in temps.iter().zip(volumes.iter()) {
            assert_eq!(v, predict_volume(&c, t, &params).unwrap());
        }
        // Thermal expansion with positive coupling: hotter means larger.
        assert!(volumes[0] > volumes[2] && volumes[2] > volumes[1]);
    }

    #[test]
    fn zero_coupling_gives_reference_volume() {
        let c = constants();
        let params = DebyeParams::new(300.0, 0.0, 42.0);
        let volumes = predict_volumes(&c, &[10.0, 100.0, 1000.0], &params).unwrap();
        assert!(volumes.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn empty_temperatures_are_a_shape_error() {
        let c = constants();
        let params = DebyeParams::new(200.0, 1e-10, 586.15);
        let err = predict_volumes(&c, &[], &params).unwrap_err();
        assert!(matches!(err, AppError::Shape(_)), "{err}");
    }

    #[test]
    fn first_failing_temperature_is_reported() {
        let c = constants();
        let params = DebyeParams::new(200.0, 1e-10, 586.15);
        let err = predict_volumes(&c, &[10.0, -1.0, -2.0, 0.0], &params).unwrap_err();
        assert!(matches!(err, AppError::Domain(_)), "{err}");
        assert!(err.to_string().contains("T=-1"), "{err}");
    }

    #[test]
    fn negative_theta_propagates_domain_error() {
        let c = constants();
        let params = DebyeParams::new(-5.0, 1e-10, 586.15);
        let err = predict_volumes(&c, &[10.0, 20.0], &params).unwrap_err();
        assert!(matches!(err, AppError::Domain(_)), "{err}");
    }

    #[test]
    fn analytic_jacobian_matches_forward_difference() {
        let c = constants();
        let params = DebyeParams::new(320.0, 1.1e-11, 586.1);
        let temps = [20.0, 90.0, 170.0, 270.0];
        let jac = volume_jacobian(&c, &temps, &params).unwrap();
        let base = predict_volumes(&c, &temps, &params).unwrap();

        let steps = [1e-3, 1e-13, 1e-3];
        for (j, h) in steps.iter().enumerate() {
            let mut shifted = params.to_array();
            shifted[j] += h;
            let moved = predict_volumes(&c, &temps, &DebyeParams::from_array(shifted)).unwrap();
            for i in 0..temps.len() {
                let numeric = (moved[i] - base[i]) / h;
                assert_relative_eq!(jac[(i, j)], numeric, max_relative = 1e-3, epsilon = 1e-9);
            }
        }
    }
}
