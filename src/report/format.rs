//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{Dataset, FitConfig, FitResult, PointResidual};

const PARAM_LABELS: [&str; 3] = ["theta_D", "gamma/B0", "V0"];

/// Format the full run summary (dataset stats + convergence + fitted parameters).
pub fn format_run_summary(dataset: &Dataset, fit: &FitResult, config: &FitConfig) -> String {
    let mut out = String::new();
    let m = &dataset.measurements;
    let (t_min, t_max) = m.temperature_range();
    let (v_min, v_max) = m.volume_range();

    out.push_str("=== debye - Debye thermal-expansion fit ===\n");
    out.push_str(&format!(
        "Dataset: {}\n",
        config
            .dataset_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in reference".to_string())
    ));
    out.push_str(&format!(
        "Points: n={} | T=[{t_min:.2}, {t_max:.2}] K | V=[{v_min:.3}, {v_max:.3}]\n",
        m.len()
    ));
    out.push_str(&format!(
        "Constants: N={} | k_B={:e} | N*k_B={:e}\n",
        dataset.constants.atom_count,
        dataset.constants.boltzmann_constant,
        dataset.constants.nkb()
    ));
    let g = &dataset.initial_guess;
    out.push_str(&format!(
        "Initial guess: theta_D={:.2} K, gamma/B0={:.6e}, V0={:.3} (SSE={:.6e})\n",
        g.theta_d, g.gamma_over_b0, g.v0, fit.initial_sse
    ));

    out.push_str("\nOptimizer:\n");
    out.push_str(&format!(
        "- Levenberg-Marquardt, {:?} Jacobian\n",
        config.jacobian
    ));
    out.push_str(&format!(
        "- stopped after {} iterations / {} evaluations: {}\n",
        fit.iterations,
        fit.evaluations,
        fit.convergence.describe()
    ));
    out.push_str(&format!(
        "- SSE={:.6e} RMSE={:.6e} reduced chi2={} (dof={})\n",
        fit.quality.sse,
        fit.quality.rmse,
        fit.quality
            .reduced_chi2
            .map(|v| format!("{v:.6e}"))
            .unwrap_or_else(|| "n/a".to_string()),
        fit.quality.dof
    ));

    out.push_str("\nFitted parameters:\n");
    let p = &fit.params;
    let se = fit.standard_errors();
    let err = |i: usize, fmt: fn(f64) -> String| -> String {
        se.map(|s| format!(" ± {}", fmt(s[i]))).unwrap_or_default()
    };
    out.push_str(&format!(
        "Debye temperature (theta_D): {:.2} K{}\n",
        p.theta_d,
        err(0, |v| format!("{v:.2}"))
    ));
    out.push_str(&format!(
        "Gamma/B0 ratio: {:.6e}{}\n",
        p.gamma_over_b0,
        err(1, |v| format!("{v:.2e}"))
    ));
    out.push_str(&format!(
        "Reference volume (V0): {:.3}{}\n",
        p.v0,
        err(2, |v| format!("{v:.3}"))
    ));

    out.push_str("\nCovariance:\n");
    match &fit.covariance {
        Some(c) => {
            out.push_str(&format!("{:<10}", ""));
            for label in PARAM_LABELS {
                out.push_str(&format!(" {label:>14}"));
            }
            out.push('\n');
            for (i, label) in PARAM_LABELS.iter().enumerate() {
                out.push_str(&format!("{label:<10}"));
                for j in 0..PARAM_LABELS.len() {
                    out.push_str(&format!(" {:>14.6e}", c[(i, j)]));
                }
                out.push('\n');
            }
        }
        None => out.push_str("(unavailable: singular Jacobian)\n"),
    }

    out
}

/// Format the per-point residual table.
pub fn format_residual_table(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:>10} {:>12} {:>12} {:>14}\n", "T (K)", "V_obs", "V_fit", "residual").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<12} {:-<12} {:-<14}\n", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>10.2} {:>12.3} {:>12.3} {:>14.6e}\n",
                r.temperature, r.v_obs, r.v_fit, r.residual
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reference_dataset;
    use crate::domain::{Convergence, DebyeParams, FitQuality};
    use nalgebra::Matrix3;

    fn fit(covariance: Option<Matrix3<f64>>) -> FitResult {
        FitResult {
            params: DebyeParams::new(523.1347, 1.2408e-11, 586.06666),
            covariance,
            quality: FitQuality::from_sse(0.00955, 10),
            initial_sse: 956.4,
            iterations: 8,
            evaluations: 37,
            convergence: Convergence::Cost,
        }
    }

    #[test]
    fn summary_reports_formatted_parameters() {
        let dataset = reference_dataset().validate().unwrap();
        let text = format_run_summary(&dataset, &fit(Some(Matrix3::identity())), &FitConfig::default());
        assert!(text.contains("Debye temperature (theta_D): 523.13 K ± 1.00"), "{text}");
        assert!(text.contains("Gamma/B0 ratio: 1.240800e-11"), "{text}");
        assert!(text.contains("Reference volume (V0): 586.067"), "{text}");
        assert!(text.contains("built-in reference"), "{text}");
    }

    #[test]
    fn summary_flags_missing_covariance() {
        let dataset = reference_dataset().validate().unwrap();
        let text = format_run_summary(&dataset, &fit(None), &FitConfig::default());
        assert!(text.contains("unavailable"), "{text}");
        assert!(!text.contains('±'), "{text}");
    }

    #[test]
    fn residual_table_has_one_row_per_point() {
        let rows = vec![
            PointResidual {
                temperature: 270.0,
                v_obs: 587.613,
                v_fit: 587.6,
                residual: 0.013,
            };
            4
        ];
        let table = format_residual_table(&rows);
        assert_eq!(table.lines().count(), 2 + 4);
        assert!(table.lines().nth(2).unwrap().contains("587.613"));
    }
}
