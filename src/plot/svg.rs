//! SVG chart of the fit, rendered with `plotters`.
//!
//! Observations are drawn as red dots and the fitted curve as a blue line; the
//! legend carries the fitted parameter values.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{CurveGrid, DebyeParams};
use crate::error::AppError;

pub const SVG_WIDTH: u32 = 900;
pub const SVG_HEIGHT: u32 = 600;

/// Write the observations and fitted curve to `output_path` as SVG.
pub fn write_svg_plot(
    output_path: &Path,
    observations: &[(f64, f64)],
    curve: &CurveGrid,
    params: &DebyeParams,
) -> Result<(), AppError> {
    let root = SVGBackend::new(output_path, (SVG_WIDTH, SVG_HEIGHT)).into_drawing_area();
    draw_fit_chart(&root, observations, &curve.points(), params)?;
    root.present()
        .map_err(|e| AppError::Io(format!("failed to write SVG '{}': {e}", output_path.display())))?;
    Ok(())
}

fn draw_fit_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    observations: &[(f64, f64)],
    curve: &[(f64, f64)],
    params: &DebyeParams,
) -> Result<(), AppError>
where
    DB::ErrorType: 'static,
{
    let draw_err = |e: DrawingAreaErrorKind<DB::ErrorType>| AppError::Io(format!("SVG rendering failed: {e:?}"));

    root.fill(&WHITE).map_err(draw_err)?;

    let (x_min, x_max) = bounds(observations.iter().chain(curve).map(|&(t, _)| t));
    let (y_min, y_max) = bounds(observations.iter().chain(curve).map(|&(_, v)| v));

    let mut chart = ChartBuilder::on(root)
        .caption("Fitting V(T) vs. T", ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Temperature (K)")
        .y_desc("Volume V(T)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .y_label_formatter(&|v: &f64| format!("{v:.2}"))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            observations
                .iter()
                .map(|&(t, v)| Circle::new((t, v), 4, RED.filled())),
        )
        .map_err(draw_err)?
        .label("Data")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(curve.iter().copied(), line_color.stroke_width(2)))
        .map_err(draw_err)?
        .label(format!(
            "Fit: θ_D={:.2}, γ/B0={:.6e}, V0={:.3}",
            params.theta_d, params.gamma_over_b0, params.v0
        ))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

/// Padded finite bounds of a series; falls back to `[0, 1]`.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1e-9 * max.abs().max(1.0));
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_svg_with_labels_and_legend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.svg");
        let curve = CurveGrid {
            temperatures: vec![20.0, 145.0, 270.0],
            volumes: vec![586.07, 586.6, 587.6],
        };
        let observations = [(20.0, 586.065), (270.0, 587.613)];
        let params = DebyeParams::new(523.13, 1.2408e-11, 586.067);

        write_svg_plot(&path, &observations, &curve, &params).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Temperature (K)"));
        assert!(svg.contains("Volume V(T)"));
        assert!(svg.contains("523.13"));
    }

    #[test]
    fn bounds_pad_flat_series() {
        let (lo, hi) = bounds([5.0, 5.0].into_iter());
        assert!(lo < 5.0 && hi > 5.0);
        assert_eq!(bounds(std::iter::empty()), (0.0, 1.0));
    }
}
