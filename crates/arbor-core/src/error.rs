//! Error types for the Arbor core.
//!
//! This module defines the error type shared by the date, rate, quote and
//! handle primitives.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type ArborResult<T> = Result<T, ArborError>;

/// The main error type for core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArborError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A handle was dereferenced while not linked to anything.
    #[error("Empty handle: no {what} linked")]
    EmptyHandle {
        /// What the handle was expected to point at.
        what: &'static str,
    },

    /// An observer attempted to register with itself.
    #[error("Observer cannot register with itself")]
    SelfRegistration,

    /// A quote was read before it was given a value.
    #[error("Invalid quote: no value set")]
    InvalidQuote,

    /// An interest rate calculation was given an unusable input.
    #[error("Invalid rate: {reason}")]
    InvalidRate {
        /// Description of the problem.
        reason: String,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl ArborError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an empty handle error.
    #[must_use]
    pub fn empty_handle(what: &'static str) -> Self {
        Self::EmptyHandle { what }
    }

    /// Creates an invalid rate error.
    #[must_use]
    pub fn invalid_rate(reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArborError::invalid_date("2025-02-30");
        assert_eq!(err.to_string(), "Invalid date: 2025-02-30");

        let err = ArborError::empty_handle("curve");
        assert_eq!(err.to_string(), "Empty handle: no curve linked");
    }
}
