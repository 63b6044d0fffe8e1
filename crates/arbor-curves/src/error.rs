//! Error types for curve operations.

use arbor_core::ArborError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// A decorator was queried while its underlying handle is empty.
    #[error("No underlying curve linked")]
    NoUnderlyingCurve,

    /// A time before the reference date was requested.
    #[error("Invalid time {t}: negative or not a number")]
    InvalidTime {
        /// The requested time in years.
        t: f64,
    },

    /// Not enough data points to build a curve.
    #[error("Insufficient points: need at least {required}, got {got}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        got: usize,
    },

    /// Invalid curve input.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Error from a core primitive (rates, quotes, handles).
    #[error(transparent)]
    Core(#[from] ArborError),
}

impl CurveError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
