//! Black's formula for options on a lognormal forward.

use std::fmt;

use arbor_math::distributions::normal_cdf;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// Returns +1 for a call and -1 for a put.
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Black price of an option on `forward` struck at `strike`.
///
/// `std_dev` is the standard deviation of the log forward at expiry (the
/// volatility times the square root of time) and `discount` the discount
/// factor to payment.
///
/// # Errors
///
/// Returns `ModelError::InvalidInput` for a non-positive forward or
/// discount, a negative strike or a negative standard deviation.
///
/// # Example
///
/// ```rust
/// use arbor_models::black::{black_formula, OptionType};
///
/// // At the money, the call and the put have the same value.
/// let call = black_formula(OptionType::Call, 0.95, 0.95, 0.02, 1.0).unwrap();
/// let put = black_formula(OptionType::Put, 0.95, 0.95, 0.02, 1.0).unwrap();
/// assert!((call - put).abs() < 1e-15);
/// ```
pub fn black_formula(
    option_type: OptionType,
    strike: f64,
    forward: f64,
    std_dev: f64,
    discount: f64,
) -> ModelResult<f64> {
    if forward.is_nan() || forward <= 0.0 {
        return Err(ModelError::invalid_input(format!(
            "forward must be positive, got {forward}"
        )));
    }
    if strike.is_nan() || strike < 0.0 {
        return Err(ModelError::invalid_input(format!(
            "strike must be non-negative, got {strike}"
        )));
    }
    if std_dev.is_nan() || std_dev < 0.0 {
        return Err(ModelError::invalid_input(format!(
            "standard deviation must be non-negative, got {std_dev}"
        )));
    }
    if discount.is_nan() || discount <= 0.0 {
        return Err(ModelError::invalid_input(format!(
            "discount must be positive, got {discount}"
        )));
    }

    let omega = option_type.sign();
    if std_dev == 0.0 {
        return Ok((omega * (forward - strike)).max(0.0) * discount);
    }
    if strike == 0.0 {
        return Ok(match option_type {
            OptionType::Call => forward * discount,
            OptionType::Put => 0.0,
        });
    }

    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let value =
        discount * omega * (forward * normal_cdf(omega * d1) - strike * normal_cdf(omega * d2));
    Ok(value.max(0.0))
}
