//! Error taxonomy shared by every layer of the fit.
//!
//! Failures raised by the quadrature or the thermal-energy model are passed up
//! untouched through the volume model and the optimizer, so the variant a user
//! sees always names the evaluation that actually failed.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Quadrature bound is invalid or the adaptive rule ran out of subintervals.
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// Non-physical input (non-positive temperature, Debye temperature, ...).
    #[error("Domain error: {0}")]
    Domain(String),

    /// Empty or mismatched input sequences.
    #[error("Shape error: {0}")]
    Shape(String),

    /// The optimizer exhausted its evaluation budget.
    #[error(
        "Fit error: no convergence after {evaluations} function evaluations \
         ({iterations} iterations, SSE={sse:.6e}) at {}",
        describe_params(.params)
    )]
    Fit {
        evaluations: usize,
        iterations: usize,
        sse: f64,
        /// Last accepted iterate.
        params: Vec<f64>,
    },

    /// The Jacobian at the optimum is rank-deficient so no covariance exists.
    #[error(
        "Fit error: singular Jacobian at theta_D={theta_d:.4}, gamma/B0={gamma_over_b0:.6e}, \
         V0={v0:.4}; covariance unavailable"
    )]
    SingularJacobian {
        theta_d: f64,
        gamma_over_b0: f64,
        v0: f64,
    },

    /// As many data points as parameters: the fit interpolates and no
    /// covariance can be estimated.
    #[error(
        "Fit error: no degrees of freedom ({points} points for 3 parameters) at \
         theta_D={theta_d:.4}, gamma/B0={gamma_over_b0:.6e}, V0={v0:.4}; covariance unavailable"
    )]
    NoDegreesOfFreedom {
        points: usize,
        theta_d: f64,
        gamma_over_b0: f64,
        v0: f64,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Io(_) | AppError::Config(_) => 2,
            AppError::Shape(_) | AppError::Domain(_) => 3,
            AppError::Numerical(_)
            | AppError::Fit { .. }
            | AppError::SingularJacobian { .. }
            | AppError::NoDegreesOfFreedom { .. } => 4,
        }
    }

    /// Short machine-friendly label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Numerical(_) => "NumericalError",
            AppError::Domain(_) => "DomainError",
            AppError::Shape(_) => "ShapeError",
            AppError::Fit { .. }
            | AppError::SingularJacobian { .. }
            | AppError::NoDegreesOfFreedom { .. } => "FitError",
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
        }
    }
}

/// `theta_D=…, gamma/B0=…, V0=…` for Debye parameter vectors, a plain list otherwise.
fn describe_params(params: &[f64]) -> String {
    match params {
        [theta_d, gamma_over_b0, v0] => {
            format!("theta_D={theta_d:.4}, gamma/B0={gamma_over_b0:.6e}, V0={v0:.4}")
        }
        other => format!("parameters {other:?}"),
    }
}
