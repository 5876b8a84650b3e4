//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the dataset and runs the fit
//! - prints reports/plots
//! - writes optional exports
//! - generates synthetic datasets

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, FitArgs, PlotArgs, SimulateArgs};
use crate::data::{REFERENCE_TEMPERATURES, SampleSpec, generate_sample};
use crate::domain::{DebyeParams, FitConfig, PhysicalConstants};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `debye` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init_logger(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.dataset, &run.fit, &config)
    );
    println!("{}", crate::report::format_residual_table(&run.residuals));

    let observations: Vec<(f64, f64)> = run.dataset.measurements.points().collect();
    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &observations,
            &run.curve,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional outputs.
    if let Some(path) = &config.svg_path {
        crate::plot::write_svg_plot(path, &observations, &run.curve, &run.fit.params)?;
        info!(path = %path.display(), "wrote SVG plot");
    }
    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, &run.residuals)?;
        info!(path = %path.display(), "wrote residual CSV");
    }
    if let Some(path) = &config.export_curve {
        let curve = crate::io::build_curve_file(
            &run.fit,
            &run.dataset.constants,
            &run.dataset.measurements,
            &run.curve,
        );
        crate::io::write_curve_json(path, &curve)?;
        info!(path = %path.display(), "wrote curve JSON");
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);

    println!(
        "Fit: theta_D={:.2} K, gamma/B0={:.6e}, V0={:.3} ({} at {})",
        curve.params.theta_d,
        curve.params.gamma_over_b0,
        curve.params.v0,
        curve.tool,
        curve.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{plot}");
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let temperatures = if args.temperatures.is_empty() {
        REFERENCE_TEMPERATURES.to_vec()
    } else {
        args.temperatures.clone()
    };
    let spec = SampleSpec {
        params: DebyeParams::new(args.theta_d, args.gamma_over_b0, args.v0),
        constants: PhysicalConstants::new(args.atom_count, args.boltzmann_constant)?,
        temperatures,
        noise: args.noise,
        seed: args.seed,
    };

    let dataset = generate_sample(&spec)?;
    crate::io::write_dataset_json(&args.output, &dataset)?;
    info!(
        path = %args.output.display(),
        points = dataset.temperatures.len(),
        noise = args.noise,
        "wrote synthetic dataset"
    );
    println!(
        "Wrote {} points to {}",
        dataset.temperatures.len(),
        args.output.display()
    );
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        dataset_path: args.config.clone(),
        curve_points: args.curve_points,
        jacobian: args.jacobian,
        max_evaluations: args.max_evaluations,
        ftol: args.ftol,
        xtol: args.xtol,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg_path: args.svg.clone(),
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_is_on_unless_disabled() {
        let cli = Cli::parse_from(["debye", "fit"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit subcommand");
        };
        let config = fit_config_from_args(&args);
        assert!(config.plot);
        assert_eq!(config.plot, FitConfig::default().plot);
    }

    #[test]
    fn no_plot_overrides_plot_default() {
        let cli = Cli::parse_from(["debye", "fit", "--no-plot", "--jacobian", "analytic"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit subcommand");
        };
        let config = fit_config_from_args(&args);
        assert!(!config.plot);
        assert_eq!(config.jacobian, crate::domain::JacobianMode::Analytic);
        assert_eq!(config.curve_points, FitConfig::default().curve_points);
        assert_eq!(config.max_evaluations, FitConfig::default().max_evaluations);
    }

    #[test]
    fn simulate_then_fit_recovers_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let dataset_path = dir.path().join("synthetic.json");
        let curve_path = dir.path().join("curve.json");

        handle_simulate(SimulateArgs {
            theta_d: 250.0,
            gamma_over_b0: 8e-12,
            v0: 586.0,
            noise: 0.0,
            seed: 1,
            temperatures: vec![],
            atom_count: 24,
            boltzmann_constant: 1.38e7,
            output: dataset_path.clone(),
        })
        .unwrap();

        let cli = Cli::parse_from([
            "debye",
            "fit",
            "--no-plot",
            "--config",
            dataset_path.to_str().unwrap(),
            "--export-curve",
            curve_path.to_str().unwrap(),
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit subcommand");
        };
        handle_fit(args).unwrap();

        let curve = crate::io::read_curve_json(&curve_path).unwrap();
        assert!((curve.params.theta_d - 250.0).abs() < 1e-6);
        assert_eq!(curve.grid.temperatures.len(), 100);
        handle_plot(PlotArgs {
            curve: curve_path,
            width: 40,
            height: 10,
        })
        .unwrap();
    }
}
