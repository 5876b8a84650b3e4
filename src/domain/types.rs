//! Shared domain types.
//!
//! Inputs (`Measurements`, `PhysicalConstants`, `DebyeParams`) are validated once
//! when they are built and are read-only afterwards. Outputs (`FitResult`,
//! `CurveFile`) are created by the fitter / pipeline and never mutated.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use nalgebra::{DVector, Matrix3};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of free parameters in the Debye volume model.
pub const PARAM_COUNT: usize = 3;

/// How the optimizer obtains the Jacobian of the residuals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JacobianMode {
    /// Forward finite differences of the residual function.
    #[default]
    Numeric,
    /// Closed-form partial derivatives of the volume model.
    Analytic,
}

/// Observed `(temperature, volume)` pairs.
///
/// Construction checks that both sequences have the same length, carry at least
/// as many points as free parameters, and hold positive finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    temperatures: Vec<f64>,
    volumes: Vec<f64>,
}

impl Measurements {
    pub fn new(temperatures: Vec<f64>, volumes: Vec<f64>) -> Result<Self, AppError> {
        if temperatures.len() != volumes.len() {
            return Err(AppError::Shape(format!(
                "temperature and volume sequences differ in length ({} vs {})",
                temperatures.len(),
                volumes.len()
            )));
        }
        if temperatures.len() < PARAM_COUNT {
            return Err(AppError::Shape(format!(
                "need at least {PARAM_COUNT} measurements to fit {PARAM_COUNT} parameters, got {}",
                temperatures.len()
            )));
        }
        for (i, &t) in temperatures.iter().enumerate() {
            if !(t.is_finite() && t > 0.0) {
                return Err(AppError::Domain(format!(
                    "temperature #{i} must be finite and > 0 K, got T={t}"
                )));
            }
        }
        for (i, &v) in volumes.iter().enumerate() {
            if !(v.is_finite() && v > 0.0) {
                return Err(AppError::Domain(format!(
                    "volume #{i} must be finite and > 0, got V={v}"
                )));
            }
        }
        Ok(Self {
            temperatures,
            volumes,
        })
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    /// `(min T, max T)` over the dataset.
    pub fn temperature_range(&self) -> (f64, f64) {
        min_max(&self.temperatures)
    }

    /// `(min V, max V)` over the dataset.
    pub fn volume_range(&self) -> (f64, f64) {
        min_max(&self.volumes)
    }

    /// Iterate `(T, V)` pairs in input order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.temperatures
            .iter()
            .copied()
            .zip(self.volumes.iter().copied())
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Atom count and Boltzmann constant for one fitting run.
///
/// The Boltzmann constant is a calibration value in whatever unit system the
/// volumes are expressed in; it is never converted from SI here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    pub atom_count: u32,
    pub boltzmann_constant: f64,
}

impl PhysicalConstants {
    pub fn new(atom_count: u32, boltzmann_constant: f64) -> Result<Self, AppError> {
        if atom_count == 0 {
            return Err(AppError::Domain("atom count must be > 0".to_string()));
        }
        if !(boltzmann_constant.is_finite() && boltzmann_constant > 0.0) {
            return Err(AppError::Domain(format!(
                "Boltzmann constant must be finite and > 0, got {boltzmann_constant}"
            )));
        }
        Ok(Self {
            atom_count,
            boltzmann_constant,
        })
    }

    /// `N · k_B`, the prefactor shared by every thermal-energy evaluation.
    pub fn nkb(&self) -> f64 {
        f64::from(self.atom_count) * self.boltzmann_constant
    }
}

/// Parameters of the Debye thermal-expansion model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebyeParams {
    /// Debye temperature (K).
    pub theta_d: f64,
    /// Grüneisen parameter over bulk modulus.
    pub gamma_over_b0: f64,
    /// Reference volume (same units as the measured volumes).
    pub v0: f64,
}

impl DebyeParams {
    pub fn new(theta_d: f64, gamma_over_b0: f64, v0: f64) -> Self {
        Self {
            theta_d,
            gamma_over_b0,
            v0,
        }
    }

    pub fn from_array(values: [f64; PARAM_COUNT]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn to_array(self) -> [f64; PARAM_COUNT] {
        [self.theta_d, self.gamma_over_b0, self.v0]
    }

    /// Build from an optimizer vector laid out as `(theta_D, gamma/B0, V0)`.
    ///
    /// # Panics
    /// Panics if `v` has fewer than three entries.
    pub fn from_vector(v: &DVector<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_vector(self) -> DVector<f64> {
        DVector::from_row_slice(&self.to_array())
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// A validated dataset ready for fitting.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub measurements: Measurements,
    pub constants: PhysicalConstants,
    pub initial_guess: DebyeParams,
}

/// Serializable dataset description (JSON config file).
///
/// `Default` is the compiled-in reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub temperatures: Vec<f64>,
    pub volumes: Vec<f64>,
    pub atom_count: u32,
    pub boltzmann_constant: f64,
    /// `(theta_D, gamma/B0, V0)`.
    pub initial_guess: [f64; PARAM_COUNT],
}

impl Default for DatasetConfig {
    fn default() -> Self {
        crate::data::reference_dataset()
    }
}

impl DatasetConfig {
    /// Validate the raw config into typed inputs.
    pub fn validate(&self) -> Result<Dataset, AppError> {
        let measurements = Measurements::new(self.temperatures.clone(), self.volumes.clone())?;
        let constants = PhysicalConstants::new(self.atom_count, self.boltzmann_constant)?;
        let initial_guess = DebyeParams::from_array(self.initial_guess);
        if !initial_guess.is_finite() {
            return Err(AppError::Domain(format!(
                "initial guess must be finite, got {:?}",
                self.initial_guess
            )));
        }
        if initial_guess.theta_d <= 0.0 {
            return Err(AppError::Domain(format!(
                "initial Debye temperature must be > 0 K, got theta_D={}",
                initial_guess.theta_d
            )));
        }
        Ok(Dataset {
            measurements,
            constants,
            initial_guess,
        })
    }
}

/// A per-point fitted result (used for tables and exports).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResidual {
    pub temperature: f64,
    pub v_obs: f64,
    pub v_fit: f64,
    /// `v_obs - v_fit`.
    pub residual: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// `SSE / dof`; `None` when there are no degrees of freedom.
    pub reduced_chi2: Option<f64>,
    pub n: usize,
    pub dof: usize,
}

impl FitQuality {
    pub fn from_sse(sse: f64, n: usize) -> Self {
        let dof = n.saturating_sub(PARAM_COUNT);
        let rmse = if n > 0 { (sse / n as f64).sqrt() } else { 0.0 };
        let reduced_chi2 = (dof > 0).then(|| sse / dof as f64);
        Self {
            sse,
            rmse,
            reduced_chi2,
            n,
            dof,
        }
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convergence {
    /// Relative reduction of the SSE fell below `ftol`.
    Cost,
    /// Relative parameter step fell below `xtol`.
    Step,
    /// Residuals vanished exactly.
    Exact,
}

impl Convergence {
    pub fn describe(self) -> &'static str {
        match self {
            Convergence::Cost => "relative SSE reduction below ftol",
            Convergence::Step => "relative step below xtol",
            Convergence::Exact => "exact fit (SSE = 0)",
        }
    }
}

/// Output of the curve fitter.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub params: DebyeParams,
    /// `None` when the Jacobian at the optimum is singular.
    pub covariance: Option<Matrix3<f64>>,
    pub quality: FitQuality,
    /// SSE evaluated at the initial guess.
    pub initial_sse: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub convergence: Convergence,
}

impl FitResult {
    /// One-sigma parameter uncertainties, `sqrt(diag(cov))`.
    pub fn standard_errors(&self) -> Option<[f64; PARAM_COUNT]> {
        self.covariance
            .as_ref()
            .map(|c| [c[(0, 0)].sqrt(), c[(1, 1)].sqrt(), c[(2, 2)].sqrt()])
    }

    /// Covariance as plain nested arrays (row-major) for serialization.
    pub fn covariance_rows(&self) -> Option<[[f64; PARAM_COUNT]; PARAM_COUNT]> {
        self.covariance.as_ref().map(|c| {
            let mut rows = [[0.0; PARAM_COUNT]; PARAM_COUNT];
            for (i, row) in rows.iter_mut().enumerate() {
                for (j, cell) in row.iter_mut().enumerate() {
                    *cell = c[(i, j)];
                }
            }
            rows
        })
    }
}

/// A run's options as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Dataset JSON; `None` uses the compiled-in reference dataset.
    pub dataset_path: Option<PathBuf>,
    /// Number of samples on the fitted curve.
    pub curve_points: usize,
    pub jacobian: JacobianMode,
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub svg_path: Option<PathBuf>,
    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            curve_points: 100,
            jacobian: JacobianMode::Numeric,
            max_evaluations: 200 * (PARAM_COUNT + 1),
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            plot: true,
            plot_width: 80,
            plot_height: 20,
            svg_path: None,
            export_results: None,
            export_curve: None,
        }
    }
}

/// Sampled `(T, V)` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub temperatures: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl CurveGrid {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.temperatures
            .iter()
            .copied()
            .zip(self.volumes.iter().copied())
            .collect()
    }
}

/// A saved fit (JSON): parameters, uncertainty, observations and fitted grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub constants: PhysicalConstants,
    pub params: DebyeParams,
    pub covariance: Option<[[f64; PARAM_COUNT]; PARAM_COUNT]>,
    pub fit_quality: FitQuality,
    pub observations: CurveGrid,
    pub grid: CurveGrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurements_reject_mismatched_lengths() {
        let err = Measurements::new(vec![10.0, 20.0, 30.0], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AppError::Shape(_)), "{err}");
    }

    #[test]
    fn measurements_reject_underdetermined_sets() {
        let err = Measurements::new(vec![10.0, 20.0], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AppError::Shape(_)), "{err}");
    }

    #[test]
    fn measurements_reject_non_positive_temperature() {
        let err = Measurements::new(vec![10.0, 0.0, 30.0], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AppError::Domain(_)), "{err}");
        assert!(err.to_string().contains("T=0"), "{err}");
    }

    #[test]
    fn ranges_follow_data() {
        let m = Measurements::new(vec![30.0, 10.0, 20.0], vec![5.0, 7.0, 6.0]).unwrap();
        assert_eq!(m.temperature_range(), (10.0, 30.0));
        assert_eq!(m.volume_range(), (5.0, 7.0));
        let pairs: Vec<_> = m.points().collect();
        assert_eq!(pairs[0], (30.0, 5.0));
    }

    #[test]
    fn constants_product() {
        let c = PhysicalConstants::new(24, 1.38e7).unwrap();
        assert!((c.nkb() - 3.312e8).abs() < 1e-3);
        assert!(PhysicalConstants::new(0, 1.0).is_err());
        assert!(PhysicalConstants::new(1, f64::NAN).is_err());
    }

    #[test]
    fn config_validation_rejects_bad_initial_theta() {
        let mut cfg = DatasetConfig::default();
        cfg.initial_guess[0] = -5.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, AppError::Domain(_)), "{err}");
    }

    #[test]
    fn quality_without_dof_has_no_reduced_chi2() {
        let q = FitQuality::from_sse(1.0, 3);
        assert_eq!(q.dof, 0);
        assert!(q.reduced_chi2.is_none());
        let q = FitQuality::from_sse(8.0, 5);
        assert_eq!(q.dof, 2);
        assert!((q.reduced_chi2.unwrap() - 4.0).abs() < 1e-12);
    }
}
