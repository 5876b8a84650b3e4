//! Levenberg–Marquardt for small dense nonlinear least-squares problems.
//!
//! Given a residual function `r(p)` (and optionally its Jacobian), we minimise
//! `Σ rᵢ(p)²` starting from a caller-supplied guess. Convergence is local.
//!
//! Implementation choices:
//! - Columns are scaled by the running maximum of the Jacobian column norms
//!   (MINPACK-style), so parameters on wildly different scales are treated
//!   evenly.
//! - Each damped step solves the augmented system `[J·S⁻¹; √λ·I] δ̃ = [−r; 0]`
//!   with SVD instead of forming `JᵀJ`.
//! - The damping follows the gain ratio `ρ = actual / predicted reduction`:
//!   accepted steps shrink `λ` by `max(1/3, 1 − (2ρ − 1)³)`, rejected steps grow
//!   it geometrically.
//! - Any error from a residual evaluation aborts the solve unchanged.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::Convergence;
use crate::error::AppError;
use crate::math::solve_least_squares;

/// A least-squares problem `min Σ rᵢ(p)²`.
pub trait LeastSquaresProblem {
    /// Residual vector at `params`.
    fn residuals(&self, params: &DVector<f64>) -> Result<DVector<f64>, AppError>;

    /// Closed-form Jacobian `∂r/∂p`, if the problem provides one.
    ///
    /// `None` makes the solver fall back to forward finite differences.
    fn jacobian(&self, _params: &DVector<f64>) -> Option<Result<DMatrix<f64>, AppError>> {
        None
    }
}

/// Solver settings.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Budget of residual evaluations (finite-difference columns included).
    pub max_evaluations: usize,
    /// Relative SSE reduction that counts as converged.
    pub ftol: f64,
    /// Relative parameter step that counts as converged.
    pub xtol: f64,
    /// Starting damping factor in scaled coordinates.
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 800,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            initial_damping: 1e-3,
        }
    }
}

/// Outcome of a converged solve.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Jacobian evaluated at `params`.
    pub jacobian: DMatrix<f64>,
    pub sse: f64,
    pub initial_sse: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub convergence: Convergence,
}

/// Minimise `Σ rᵢ(p)²` from `initial`.
///
/// Fails with `AppError::Fit` when the evaluation budget runs out or the damping
/// diverges, `AppError::Shape` when there are fewer residuals than parameters,
/// and passes through any error raised by the problem itself.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, AppError> {
    let n = initial.len();
    let mut x = initial;
    let mut r = problem.residuals(&x)?;
    let mut evaluations = 1;

    if r.len() < n {
        return Err(AppError::Shape(format!(
            "{} residuals cannot determine {n} parameters",
            r.len()
        )));
    }

    let mut sse = r.norm_squared();
    let initial_sse = sse;
    if !sse.is_finite() {
        return Err(AppError::Numerical(format!(
            "residual sum of squares is not finite at the initial guess ({sse})"
        )));
    }

    let mut iterations = 0;
    let mut lambda = opts.initial_damping;
    let mut nu = 2.0;
    let mut scale = DVector::<f64>::zeros(n);
    let mut jac = jacobian_at(problem, &x, &r, &mut evaluations)?;

    let convergence = loop {
        if sse == 0.0 {
            break Convergence::Exact;
        }
        if evaluations >= opts.max_evaluations || !lambda.is_finite() {
            return Err(AppError::Fit {
                evaluations,
                iterations,
                sse,
                params: x.iter().copied().collect(),
            });
        }
        iterations += 1;

        for (j, col) in jac.column_iter().enumerate() {
            let norm = col.norm();
            if norm.is_finite() && norm > scale[j] {
                scale[j] = norm;
            }
        }
        let safe_scale = scale.map(|s| if s > 0.0 { s } else { 1.0 });

        let step = damped_step(&jac, &r, &safe_scale, lambda)?;
        let trial = &x + &step;
        let trial_r = problem.residuals(&trial)?;
        evaluations += 1;
        let trial_sse = trial_r.norm_squared();

        let predicted = sse - (&r + &jac * &step).norm_squared();
        let rho = if predicted > 0.0 && trial_sse.is_finite() {
            (sse - trial_sse) / predicted
        } else {
            -1.0
        };
        let small_step = step
            .iter()
            .zip(x.iter())
            .all(|(d, p)| d.abs() <= opts.xtol * (p.abs() + opts.xtol));

        if rho > 0.0 {
            let reduction = sse - trial_sse;
            let previous = sse;
            x = trial;
            r = trial_r;
            sse = trial_sse;
            lambda *= (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0);
            nu = 2.0;

            debug!(
                iteration = iterations,
                sse,
                rho,
                lambda,
                params = ?x.as_slice(),
                "accepted step"
            );

            if reduction <= opts.ftol * previous {
                break Convergence::Cost;
            }
            if small_step {
                break Convergence::Step;
            }
            jac = jacobian_at(problem, &x, &r, &mut evaluations)?;
        } else {
            lambda *= nu;
            nu *= 2.0;
            if small_step {
                break Convergence::Step;
            }
        }
    };

    let jacobian = jacobian_at(problem, &x, &r, &mut evaluations)?;

    Ok(LmReport {
        params: x,
        residuals: r,
        jacobian,
        sse,
        initial_sse,
        iterations,
        evaluations,
        convergence,
    })
}

fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Result<DVector<f64>, AppError> {
    let (m, n) = jac.shape();
    let damping = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(m + n, n);
    let mut b = DVector::<f64>::zeros(m + n);
    for j in 0..n {
        for i in 0..m {
            a[(i, j)] = jac[(i, j)] / scale[j];
        }
        a[(m + j, j)] = damping;
    }
    for i in 0..m {
        b[i] = -r[i];
    }

    let scaled_step = solve_least_squares(&a, &b).ok_or_else(|| {
        AppError::Numerical(format!("damped step system is ill-conditioned (lambda={lambda:.3e})"))
    })?;
    Ok(scaled_step.component_div(scale))
}

fn jacobian_at<P: LeastSquaresProblem>(
    problem: &P,
    x: &DVector<f64>,
    r: &DVector<f64>,
    evaluations: &mut usize,
) -> Result<DMatrix<f64>, AppError> {
    match problem.jacobian(x) {
        Some(jac) => jac,
        None => forward_difference(problem, x, r, evaluations),
    }
}

/// Forward-difference Jacobian with step `√ε·|pⱼ|` (`√ε` when `pⱼ = 0`).
fn forward_difference<P: LeastSquaresProblem>(
    problem: &P,
    x: &DVector<f64>,
    r: &DVector<f64>,
    evaluations: &mut usize,
) -> Result<DMatrix<f64>, AppError> {
    let eps = f64::EPSILON.sqrt();
    let mut jac = DMatrix::<f64>::zeros(r.len(), x.len());

    for j in 0..x.len() {
        let h = if x[j] != 0.0 { eps * x[j].abs() } else { eps };
        let mut shifted = x.clone();
        shifted[j] += h;
        // Use the step that is actually representable.
        let h = shifted[j] - x[j];

        let rj = problem.residuals(&shifted)?;
        *evaluations += 1;
        jac.set_column(j, &((rj - r) / h));
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `y = a · exp(b · t)` sampled without noise.
    struct ExpDecay {
        t: Vec<f64>,
        y: Vec<f64>,
        analytic: bool,
    }

    impl ExpDecay {
        fn new(a: f64, b: f64, analytic: bool) -> Self {
            let t: Vec<f64> = (0..12).map(|i| i as f64 * 0.25).collect();
            let y = t.iter().map(|&ti| a * (b * ti).exp()).collect();
            Self { t, y, analytic }
        }
    }

    impl LeastSquaresProblem for ExpDecay {
        fn residuals(&self, p: &DVector<f64>) -> Result<DVector<f64>, AppError> {
            Ok(DVector::from_iterator(
                self.t.len(),
                self.t
                    .iter()
                    .zip(self.y.iter())
                    .map(|(&t, &y)| p[0] * (p[1] * t).exp() - y),
            ))
        }

        fn jacobian(&self, p: &DVector<f64>) -> Option<Result<DMatrix<f64>, AppError>> {
            if !self.analytic {
                return None;
            }
            let mut jac = DMatrix::zeros(self.t.len(), 2);
            for (i, &t) in self.t.iter().enumerate() {
                let e = (p[1] * t).exp();
                jac[(i, 0)] = e;
                jac[(i, 1)] = p[0] * t * e;
            }
            Some(Ok(jac))
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        for analytic in [false, true] {
            let problem = ExpDecay::new(2.5, -1.3, analytic);
            let report = levenberg_marquardt(
                &problem,
                DVector::from_row_slice(&[1.0, -0.5]),
                &LmOptions::default(),
            )
            .unwrap();
            assert_relative_eq!(report.params[0], 2.5, max_relative = 1e-6);
            assert_relative_eq!(report.params[1], -1.3, max_relative = 1e-6);
            assert!(report.sse < report.initial_sse);
            assert!(report.sse < 1e-12, "sse={}", report.sse);
        }
    }

    #[test]
    fn exact_start_stops_immediately() {
        let problem = ExpDecay::new(2.0, -0.7, true);
        let report = levenberg_marquardt(
            &problem,
            DVector::from_row_slice(&[2.0, -0.7]),
            &LmOptions::default(),
        )
        .unwrap();
        assert_eq!(report.convergence, Convergence::Exact);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.params[0], 2.0);
    }

    #[test]
    fn exhausted_budget_is_a_fit_error() {
        let problem = ExpDecay::new(2.5, -1.3, false);
        let opts = LmOptions {
            max_evaluations: 4,
            ..LmOptions::default()
        };
        let err = levenberg_marquardt(&problem, DVector::from_row_slice(&[1.0, -0.5]), &opts)
            .unwrap_err();
        let AppError::Fit { params, evaluations, .. } = &err else {
            panic!("expected fit error, got {err}");
        };
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p.is_finite()));
        assert!(*evaluations >= 4);
    }

    struct Failing;

    impl LeastSquaresProblem for Failing {
        fn residuals(&self, p: &DVector<f64>) -> Result<DVector<f64>, AppError> {
            if p[0] > 1.0 {
                return Err(AppError::Domain(format!("p0={} out of range", p[0])));
            }
            Ok(DVector::from_row_slice(&[p[0] - 5.0, p[0] - 5.0]))
        }
    }

    #[test]
    fn residual_errors_abort_the_solve() {
        let err = levenberg_marquardt(&Failing, DVector::from_row_slice(&[0.5]), &LmOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(_)), "{err}");
    }

    #[test]
    fn underdetermined_problem_is_a_shape_error() {
        let problem = ExpDecay {
            t: vec![0.0],
            y: vec![1.0],
            analytic: false,
        };
        let err = levenberg_marquardt(&problem, DVector::from_row_slice(&[1.0, 1.0]), &LmOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Shape(_)), "{err}");
    }
}
