//! Error types for models and calibration.

use arbor_core::ArborError;
use arbor_curves::CurveError;
use arbor_math::MathError;
use thiserror::Error;

/// A specialized Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by models, helpers and calibration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A parameter vector of the wrong length was supplied.
    #[error("Parameter count mismatch: expected {expected}, got {actual}")]
    ParameterCount {
        /// Sum of the parameter sizes.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// A fitting parameter was read before its owner supplied a value.
    #[error("Fitting parameter has no value: {reason}")]
    Unfitted {
        /// Why no value is available.
        reason: String,
    },

    /// A price could not be computed.
    #[error("Pricing failed: {reason}")]
    Pricing {
        /// Description of the failure.
        reason: String,
    },

    /// Invalid model or calibration input.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// Configuration could not be parsed or is inconsistent.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// Error from the optimizer or numerical routines.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error from a term structure.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Error from a core primitive.
    #[error(transparent)]
    Core(#[from] ArborError),
}

impl ModelError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a pricing error.
    #[must_use]
    pub fn pricing(reason: impl Into<String>) -> Self {
        Self::Pricing {
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a parameter count error.
    #[must_use]
    pub fn parameter_count(expected: usize, actual: usize) -> Self {
        Self::ParameterCount { expected, actual }
    }
}
