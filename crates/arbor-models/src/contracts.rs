//! Model capability traits.
//!
//! A concrete model implements the capabilities it has: closed-form bond
//! prices ([`AffineModel`]), an anchor curve it reproduces
//! ([`TermStructureConsistentModel`]) or a short-rate lattice
//! ([`ShortRateModel`]).

use arbor_curves::CurveHandle;

use crate::black::OptionType;
use crate::calibrated::Calibratable;
use crate::error::{ModelError, ModelResult};
use crate::lattice::{ShortRateTree, TimeGrid};

/// A model with closed-form zero-coupon bond prices.
///
/// The three prices are mutually consistent: `discount(t)` equals
/// `discount_bond(0, t, factors)` at today's factors.
pub trait AffineModel {
    /// Returns today's discount factor to time `t`.
    fn discount(&self, t: f64) -> ModelResult<f64>;

    /// Returns the price at `now` of a bond paying 1 at `maturity`, given the
    /// state `factors` at `now`.
    fn discount_bond(&self, now: f64, maturity: f64, factors: &[f64]) -> ModelResult<f64>;

    /// Returns today's price of a European option expiring at `maturity` on
    /// a bond paying 1 at `bond_maturity`.
    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: f64,
        maturity: f64,
        bond_maturity: f64,
    ) -> ModelResult<f64>;
}

/// A model anchored to a yield curve it reproduces exactly.
pub trait TermStructureConsistentModel {
    /// Returns the anchor curve.
    fn term_structure(&self) -> &CurveHandle;
}

/// A calibratable model that can build a short-rate lattice.
pub trait ShortRateModel: Calibratable {
    /// Builds a lattice on `grid` from the current parameters.
    ///
    /// Does not modify the model.
    fn tree(&self, grid: &TimeGrid) -> ModelResult<ShortRateTree>;
}

/// Returns the short rate from a one-factor state vector.
pub(crate) fn short_rate(factors: &[f64]) -> ModelResult<f64> {
    match factors {
        [r] => Ok(*r),
        _ => Err(ModelError::invalid_input(format!(
            "one-factor model needs exactly one state variable, got {}",
            factors.len()
        ))),
    }
}

/// Checks the times of a bond option.
pub(crate) fn check_option_times(maturity: f64, bond_maturity: f64) -> ModelResult<()> {
    if maturity.is_nan() || maturity < 0.0 || bond_maturity.is_nan() || bond_maturity < maturity {
        return Err(ModelError::invalid_input(format!(
            "option expiry {maturity} must be non-negative and not after bond maturity {bond_maturity}"
        )));
    }
    Ok(())
}
