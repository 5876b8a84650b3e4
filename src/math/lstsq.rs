//! Dense least-squares helpers built on SVD.
//!
//! Two operations are needed by the optimizer:
//!
//! - solve the (tall) damped step system `A x ≈ b` for every trial step
//! - turn the Jacobian at the optimum into a parameter covariance matrix
//!
//! Both go through SVD rather than normal equations: the Debye Jacobian mixes
//! columns whose norms differ by ~13 orders of magnitude, and forming `JᵀJ`
//! directly squares that condition number.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Euclidean norm of each column; zero columns keep a unit scale.
pub fn column_scales(jac: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        jac.ncols(),
        jac.column_iter().map(|c| {
            let n = c.norm();
            if n > 0.0 && n.is_finite() { n } else { 1.0 }
        }),
    )
}

/// Parameter covariance `(JᵀJ)⁻¹ · SSE / dof` from the Jacobian at the optimum.
///
/// The Jacobian is column-normalised before the rank test so that parameters
/// living on very different scales do not look singular. A singular value below
/// `ε · max(m, n) · s_max` counts as rank deficiency, and the covariance is then
/// reported as unavailable (`None`). Also `None` when `dof == 0`.
pub fn covariance_from_jacobian(jac: &DMatrix<f64>, sse: f64, dof: usize) -> Option<DMatrix<f64>> {
    let (m, n) = jac.shape();
    if dof == 0 || m < n || n == 0 || !sse.is_finite() {
        return None;
    }
    if jac.iter().any(|v| !v.is_finite()) || jac.column_iter().any(|c| c.norm() == 0.0) {
        return None;
    }

    let scales = column_scales(jac);
    let mut scaled = jac.clone();
    for (j, mut col) in scaled.column_iter_mut().enumerate() {
        col /= scales[j];
    }

    let svd = scaled.svd(false, true);
    let v_t = svd.v_t?;
    let s = &svd.singular_values;
    if s.len() < n {
        return None;
    }
    let s_max = s.max();
    let threshold = f64::EPSILON * (m.max(n) as f64) * s_max;
    if s_max <= 0.0 || s.iter().any(|&v| v <= threshold) {
        return None;
    }

    // (J̃ᵀJ̃)⁻¹ = V S⁻² Vᵀ, then undo the column scaling on both sides.
    let inv_s2 = DMatrix::from_diagonal(&s.map(|v| 1.0 / (v * v)));
    let pcov_scaled = v_t.transpose() * inv_s2 * &v_t;
    let unscale = DMatrix::from_diagonal(&scales.map(|v| 1.0 / v));
    let pcov = &unscale * pcov_scaled * &unscale;

    let cov = pcov * (sse / dof as f64);
    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn covariance_matches_linear_regression() {
        // Straight line through 4 points: cov = s² (XᵀX)⁻¹ with XᵀX = [[4, 6], [6, 14]].
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let sse = 2.0;
        let cov = covariance_from_jacobian(&x, sse, 2).unwrap();
        let s2 = sse / 2.0;
        let det = 4.0 * 14.0 - 36.0;
        assert_relative_eq!(cov[(0, 0)], s2 * 14.0 / det, max_relative = 1e-10);
        assert_relative_eq!(cov[(1, 1)], s2 * 4.0 / det, max_relative = 1e-10);
        assert_relative_eq!(cov[(0, 1)], -s2 * 6.0 / det, max_relative = 1e-10);
        assert_relative_eq!(cov[(0, 1)], cov[(1, 0)], max_relative = 1e-12);
    }

    #[test]
    fn covariance_survives_badly_scaled_columns() {
        let x = DMatrix::from_row_slice(
            4,
            2,
            &[1e11, 1e-3, 2e11, 3e-3, 3e11, 2e-3, 4e11, 5e-3],
        );
        assert!(covariance_from_jacobian(&x, 1.0, 2).is_some());
    }

    #[test]
    fn rank_deficient_jacobian_has_no_covariance() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(covariance_from_jacobian(&x, 1.0, 1).is_none());
    }

    #[test]
    fn zero_dof_has_no_covariance() {
        let x = DMatrix::<f64>::identity(3, 3);
        assert!(covariance_from_jacobian(&x, 1.0, 0).is_none());
    }
}
