//! Debye curve fitter.
//!
//! Given:
//! - measured temperatures `Tᵢ` and volumes `Vᵢ`
//! - the physical constants `N`, `k_B`
//! - an initial guess `(θ_D, γ/B₀, V₀)`
//!
//! we minimise `Σ (V_model(Tᵢ; p) − Vᵢ)²` with Levenberg–Marquardt and derive
//! the parameter covariance from the Jacobian at the optimum.
//!
//! The initial guess is mandatory: the search is local, and a poor guess can
//! wander into non-physical territory (e.g. `θ_D ≤ 0`), which aborts the fit
//! with the model's `Domain` error.

use nalgebra::{DMatrix, DVector, Matrix3};
use tracing::{info, warn};

use crate::domain::{
    DebyeParams, FitQuality, FitResult, JacobianMode, Measurements, PARAM_COUNT, PhysicalConstants,
};
use crate::error::AppError;
use crate::fit::lm::{LeastSquaresProblem, LmOptions, levenberg_marquardt};
use crate::math::covariance_from_jacobian;
use crate::models::{predict_volumes, volume_jacobian};

/// Options that affect how the model is calibrated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitOptions {
    pub jacobian: JacobianMode,
    pub lm: LmOptions,
}

/// Residuals `V_model(Tᵢ; p) − Vᵢ` for a fixed dataset.
struct DebyeProblem<'a> {
    measurements: &'a Measurements,
    constants: &'a PhysicalConstants,
    jacobian: JacobianMode,
}

impl LeastSquaresProblem for DebyeProblem<'_> {
    fn residuals(&self, params: &DVector<f64>) -> Result<DVector<f64>, AppError> {
        let params = DebyeParams::from_vector(params);
        let predicted = predict_volumes(self.constants, self.measurements.temperatures(), &params)?;
        Ok(DVector::from_iterator(
            predicted.len(),
            predicted
                .iter()
                .zip(self.measurements.volumes())
                .map(|(v_fit, v_obs)| v_fit - v_obs),
        ))
    }

    fn jacobian(&self, params: &DVector<f64>) -> Option<Result<DMatrix<f64>, AppError>> {
        match self.jacobian {
            JacobianMode::Numeric => None,
            JacobianMode::Analytic => Some(volume_jacobian(
                self.constants,
                self.measurements.temperatures(),
                &DebyeParams::from_vector(params),
            )),
        }
    }
}

/// Sum of squared residuals for a given parameter vector.
pub fn sum_of_squares(
    measurements: &Measurements,
    constants: &PhysicalConstants,
    params: &DebyeParams,
) -> Result<f64, AppError> {
    let problem = DebyeProblem {
        measurements,
        constants,
        jacobian: JacobianMode::Numeric,
    };
    Ok(problem.residuals(&params.to_vector())?.norm_squared())
}

/// Fit the Debye volume model to `measurements`.
///
/// Returns the optimum with its covariance, or `covariance: None` when the
/// Jacobian at the optimum is singular.
pub fn fit_curve(
    measurements: &Measurements,
    constants: &PhysicalConstants,
    initial: &DebyeParams,
    opts: &FitOptions,
) -> Result<FitResult, AppError> {
    if !initial.is_finite() {
        return Err(AppError::Domain(format!("initial guess must be finite, got {initial:?}")));
    }

    let problem = DebyeProblem {
        measurements,
        constants,
        jacobian: opts.jacobian,
    };
    let report = levenberg_marquardt(&problem, initial.to_vector(), &opts.lm)?;

    let params = DebyeParams::from_vector(&report.params);
    let quality = FitQuality::from_sse(report.sse, measurements.len());
    let covariance = covariance_from_jacobian(&report.jacobian, report.sse, quality.dof)
        .map(|c| Matrix3::from_fn(|i, j| c[(i, j)]));

    info!(
        theta_d = params.theta_d,
        gamma_over_b0 = params.gamma_over_b0,
        v0 = params.v0,
        sse = report.sse,
        iterations = report.iterations,
        evaluations = report.evaluations,
        "fit converged ({})",
        report.convergence.describe()
    );
    if covariance.is_none() {
        warn!(
            dof = quality.dof,
            "Jacobian at the optimum is singular; covariance unavailable"
        );
    }

    debug_assert_eq!(report.params.len(), PARAM_COUNT);
    Ok(FitResult {
        params,
        covariance,
        quality,
        initial_sse: report.initial_sse,
        iterations: report.iterations,
        evaluations: report.evaluations,
        convergence: report.convergence,
    })
}
