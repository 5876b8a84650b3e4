//! Shared "fit pipeline" logic used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! dataset load -> validation -> fit -> covariance check -> residuals -> fitted curve
//!
//! The command handlers can then focus on presentation (printing, plots, exports).

use tracing::info;

use crate::data::reference_dataset;
use crate::domain::{CurveGrid, Dataset, DatasetConfig, FitConfig, FitResult, PointResidual};
use crate::error::AppError;
use crate::fit::{FitOptions, LmOptions, fit_curve};
use crate::io::read_dataset_json;
use crate::report::{compute_residuals, fitted_curve};

/// All computed outputs of a single `debye fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    pub fit: FitResult,
    pub residuals: Vec<PointResidual>,
    pub curve: CurveGrid,
}

/// Load the configured dataset (or the reference one) and run the pipeline.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let dataset = match &config.dataset_path {
        Some(path) => read_dataset_json(path)?,
        None => reference_dataset(),
    };
    run_fit_with_dataset(config, &dataset)
}

/// Execute the pipeline on an already loaded dataset.
///
/// A fit whose covariance cannot be computed stops here with
/// `NoDegreesOfFreedom` (n = 3) or `SingularJacobian`; no curve is produced
/// for it.
pub fn run_fit_with_dataset(config: &FitConfig, dataset: &DatasetConfig) -> Result<RunOutput, AppError> {
    let dataset = dataset.validate()?;
    let (t_min, t_max) = dataset.measurements.temperature_range();
    info!(
        points = dataset.measurements.len(),
        t_min,
        t_max,
        atom_count = dataset.constants.atom_count,
        "dataset loaded"
    );

    let opts = fit_options(config);
    let fit = fit_curve(
        &dataset.measurements,
        &dataset.constants,
        &dataset.initial_guess,
        &opts,
    )?;

    if fit.quality.dof == 0 {
        return Err(AppError::NoDegreesOfFreedom {
            points: fit.quality.n,
            theta_d: fit.params.theta_d,
            gamma_over_b0: fit.params.gamma_over_b0,
            v0: fit.params.v0,
        });
    }
    if fit.covariance.is_none() {
        return Err(AppError::SingularJacobian {
            theta_d: fit.params.theta_d,
            gamma_over_b0: fit.params.gamma_over_b0,
            v0: fit.params.v0,
        });
    }

    let residuals = compute_residuals(&dataset.measurements, &dataset.constants, &fit.params)?;
    let curve = fitted_curve(
        &dataset.constants,
        &fit.params,
        t_min,
        t_max,
        config.curve_points,
    )?;

    Ok(RunOutput {
        dataset,
        fit,
        residuals,
        curve,
    })
}

fn fit_options(config: &FitConfig) -> FitOptions {
    FitOptions {
        jacobian: config.jacobian,
        lm: LmOptions {
            max_evaluations: config.max_evaluations,
            ftol: config.ftol,
            xtol: config.xtol,
            ..LmOptions::default()
        },
    }
}
