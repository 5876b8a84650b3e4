//! Command-line parsing for the Debye thermal-expansion fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::JacobianMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "debye", version, about = "Debye thermal-expansion model fitter")]
pub struct Cli {
    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the Debye model to a (T, V) dataset, print diagnostics, and optionally plot/export.
    Fit(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Write a synthetic dataset generated from known parameters.
    Simulate(SimulateArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Dataset JSON (temperatures, volumes, constants, initial guess).
    /// The built-in reference dataset is used when omitted.
    #[arg(short, long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Number of temperatures sampled on the fitted curve.
    #[arg(long, default_value_t = 100)]
    pub curve_points: usize,

    /// How the optimizer obtains the Jacobian.
    #[arg(long, value_enum, default_value_t = JacobianMode::Numeric)]
    pub jacobian: JacobianMode,

    /// Maximum number of residual evaluations.
    #[arg(long, default_value_t = 800)]
    pub max_evaluations: usize,

    /// Relative SSE-reduction tolerance.
    #[arg(long, default_value_t = 1.49012e-8)]
    pub ftol: f64,

    /// Relative parameter-step tolerance.
    #[arg(long, default_value_t = 1.49012e-8)]
    pub xtol: f64,

    /// Disable the terminal plot (shown by default).
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write an SVG chart of the data and fitted curve.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,

    /// Export per-point results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export curve (constants + params + covariance + fitted grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `debye fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for generating a synthetic dataset.
#[derive(Debug, Parser)]
pub struct SimulateArgs {
    /// Debye temperature (K).
    #[arg(long)]
    pub theta_d: f64,

    /// Grüneisen parameter over bulk modulus.
    #[arg(long)]
    pub gamma_over_b0: f64,

    /// Reference volume.
    #[arg(long)]
    pub v0: f64,

    /// Standard deviation of Gaussian volume noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Temperatures (K); defaults to those of the reference dataset.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub temperatures: Vec<f64>,

    /// Number of atoms per cell.
    #[arg(long, default_value_t = crate::data::REFERENCE_ATOM_COUNT)]
    pub atom_count: u32,

    /// Boltzmann constant in the volume's unit system.
    #[arg(long, default_value_t = crate::data::REFERENCE_BOLTZMANN)]
    pub boltzmann_constant: f64,

    /// Output dataset JSON.
    #[arg(short, long, value_name = "JSON")]
    pub output: PathBuf,
}
