//! Debye integral and thermal energy.
//!
//! - `D(x) = ∫₀ˣ t³ / (eᵗ − 1) dt`
//! - `U(T, θ_D) = 9 · N·k_B · T · (T/θ_D)³ · D(θ_D / T)`
//!
//! Everything here is a pure function of its arguments, so it can be called
//! from parallel iterators without coordination.

use crate::domain::PhysicalConstants;
use crate::error::AppError;
use crate::math::{Quadrature, QuadratureOptions, integrate};

/// Upper bound beyond which the Debye integrand no longer changes `D(x)`.
///
/// The tail `∫₆₀^∞ t³ e⁻ᵗ dt ≈ 2e-21` is far below the resolution of
/// `D(∞) = π⁴/15` in double precision.
pub const SATURATION_X: f64 = 60.0;

/// `x³ / (eˣ − 1)`, with the removable singularity at 0 filled in.
pub fn debye_integrand(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    x * x * x / x.exp_m1()
}

/// `D(x_max)`.
///
/// `x_max` must be finite and non-negative; `D(0) = 0` exactly.
pub fn debye_integral(x_max: f64) -> Result<Quadrature, AppError> {
    if !x_max.is_finite() || x_max < 0.0 {
        return Err(AppError::Numerical(format!(
            "Debye integral upper bound must be finite and >= 0, got x_max={x_max}"
        )));
    }
    if x_max == 0.0 {
        return Ok(Quadrature::zero());
    }
    integrate(
        debye_integrand,
        0.0,
        x_max.min(SATURATION_X),
        &QuadratureOptions::default(),
    )
}

fn check_inputs(t: f64, theta_d: f64) -> Result<(), AppError> {
    if !(t.is_finite() && t > 0.0) {
        return Err(AppError::Domain(format!(
            "temperature must be finite and > 0 K, got T={t} (theta_D={theta_d})"
        )));
    }
    if !(theta_d.is_finite() && theta_d > 0.0) {
        return Err(AppError::Domain(format!(
            "Debye temperature must be finite and > 0 K, got theta_D={theta_d} (T={t})"
        )));
    }
    Ok(())
}

/// Thermal energy `U(T, θ_D)`.
pub fn thermal_energy(constants: &PhysicalConstants, t: f64, theta_d: f64) -> Result<f64, AppError> {
    check_inputs(t, theta_d)?;
    // θ_D / T overflows to ∞ for subnormal T; D(x) is flat past saturation anyway.
    let integral = debye_integral((theta_d / t).min(SATURATION_X))?;
    let ratio = t / theta_d;
    Ok(9.0 * constants.nkb() * t * ratio.powi(3) * integral.value)
}

/// `U(T, θ_D)` together with `∂U/∂θ_D`.
///
/// With `x = θ_D / T`: `∂U/∂θ_D = 9·N·k_B · x⁻³ · (x³/(eˣ−1) − 3·D(x)/x)`.
pub fn thermal_energy_with_derivative(
    constants: &PhysicalConstants,
    t: f64,
    theta_d: f64,
) -> Result<(f64, f64), AppError> {
    check_inputs(t, theta_d)?;
    let x = theta_d / t;
    let d = debye_integral(x.min(SATURATION_X))?.value;
    let nkb9 = 9.0 * constants.nkb();
    let inv_x3 = x.powi(-3);
    let f = if x > SATURATION_X { 0.0 } else { debye_integrand(x) };

    let energy = nkb9 * t * inv_x3 * d;
    let d_theta = nkb9 * inv_x3 * (f - 3.0 * d / x);
    Ok((energy, d_theta))
}
