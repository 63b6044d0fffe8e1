//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// An iterative method failed to converge.
    #[error("Convergence failed after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual value.
        residual: f64,
    },

    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot invert")]
    SingularMatrix,

    /// Matrix or vector dimensions are incompatible.
    #[error("Incompatible dimensions: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// An optimizer was started from a point outside its constraint.
    #[error("Infeasible starting point: {point:?}")]
    InfeasibleStart {
        /// The rejected starting point.
        point: Vec<f64>,
    },

    /// A constrained step could not be brought back inside the feasible region.
    #[error("Cannot update parameter vector: no feasible step after {attempts} halvings")]
    NoFeasibleStep {
        /// Number of step halvings tried.
        attempts: u32,
    },

    /// The cost function could not be evaluated.
    #[error("Cost function evaluation failed: {reason}")]
    CostEvaluation {
        /// Description of the failure.
        reason: String,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a cost evaluation error.
    #[must_use]
    pub fn cost_evaluation(reason: impl Into<String>) -> Self {
        Self::CostEvaluation {
            reason: reason.into(),
        }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates an infeasible start error.
    #[must_use]
    pub fn infeasible_start(point: &[f64]) -> Self {
        Self::InfeasibleStart {
            point: point.to_vec(),
        }
    }
}
