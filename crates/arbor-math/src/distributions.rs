//! Standard normal distribution helpers.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

/// Cumulative distribution function of the standard normal.
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Probability density function of the standard normal.
#[must_use]
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}
