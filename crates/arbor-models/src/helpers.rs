//! Calibration helpers.
//!
//! A helper pairs a market value with the value the model being calibrated
//! gives the same instrument. Calibration minimizes the weighted squares of
//! the helpers' errors. Helpers only read during cost evaluation.

use std::fmt;
use std::rc::Rc;

use arbor_core::handle::Handle;
use arbor_core::quote::{Quote, SimpleQuote};
use serde::{Deserialize, Serialize};

use crate::black::OptionType;
use crate::contracts::AffineModel;
use crate::error::{ModelError, ModelResult};

/// How a helper measures the distance between model and market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationErrorType {
    /// `|market - model| / market`.
    #[default]
    RelativePriceError,
    /// `market - model`.
    PriceError,
}

/// An instrument used to calibrate a model.
///
/// # Required Methods
///
/// - [`market_value`](CalibrationHelper::market_value)
/// - [`model_value`](CalibrationHelper::model_value), priced with the
///   model's current parameters
pub trait CalibrationHelper {
    /// Returns the observed market value.
    fn market_value(&self) -> ModelResult<f64>;

    /// Returns the value implied by the model.
    fn model_value(&self) -> ModelResult<f64>;

    /// Returns how the error is measured.
    fn error_type(&self) -> CalibrationErrorType {
        CalibrationErrorType::default()
    }

    /// Returns the calibration error.
    ///
    /// # Errors
    ///
    /// Propagates pricing failures. A relative error against a zero market
    /// value is `ModelError::Pricing`.
    fn calibration_error(&self) -> ModelResult<f64> {
        let market = self.market_value()?;
        let model = self.model_value()?;
        match self.error_type() {
            CalibrationErrorType::RelativePriceError => {
                if market == 0.0 {
                    return Err(ModelError::pricing(
                        "relative error against a zero market value",
                    ));
                }
                Ok((market - model).abs() / market)
            }
            CalibrationErrorType::PriceError => Ok(market - model),
        }
    }
}

fn quote_value(quote: &Handle<dyn Quote>) -> ModelResult<f64> {
    Ok(quote.get()?.value()?)
}

fn fixed_quote(value: f64) -> Handle<dyn Quote> {
    let quote: Rc<dyn Quote> = Rc::new(SimpleQuote::new(value));
    Handle::new(quote)
}

/// A zero-coupon bond paying 1 at `maturity`.
pub struct DiscountBondHelper {
    maturity: f64,
    market: Handle<dyn Quote>,
    model: Rc<dyn AffineModel>,
    error_type: CalibrationErrorType,
}

impl DiscountBondHelper {
    /// Creates a helper quoting the bond price through `market`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` unless `maturity` is positive.
    pub fn new(
        maturity: f64,
        market: Handle<dyn Quote>,
        model: Rc<dyn AffineModel>,
    ) -> ModelResult<Self> {
        if !maturity.is_finite() || maturity <= 0.0 {
            return Err(ModelError::invalid_input(format!(
                "bond maturity must be positive, got {maturity}"
            )));
        }
        Ok(Self {
            maturity,
            market,
            model,
            error_type: CalibrationErrorType::default(),
        })
    }

    /// Creates a helper with a fixed market price.
    pub fn with_price(maturity: f64, price: f64, model: Rc<dyn AffineModel>) -> ModelResult<Self> {
        Self::new(maturity, fixed_quote(price), model)
    }

    /// Sets how the error is measured.
    #[must_use]
    pub fn with_error_type(mut self, error_type: CalibrationErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    /// Returns the bond maturity in years.
    pub fn maturity(&self) -> f64 {
        self.maturity
    }
}

impl CalibrationHelper for DiscountBondHelper {
    fn market_value(&self) -> ModelResult<f64> {
        quote_value(&self.market)
    }

    fn model_value(&self) -> ModelResult<f64> {
        self.model.discount(self.maturity)
    }

    fn error_type(&self) -> CalibrationErrorType {
        self.error_type
    }
}

impl fmt::Debug for DiscountBondHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountBondHelper")
            .field("maturity", &self.maturity)
            .field("market", &self.market)
            .field("error_type", &self.error_type)
            .finish_non_exhaustive()
    }
}

/// A European option, expiring at `maturity`, on a zero-coupon bond paying
/// 1 at `bond_maturity`.
pub struct BondOptionHelper {
    option_type: OptionType,
    strike: f64,
    maturity: f64,
    bond_maturity: f64,
    market: Handle<dyn Quote>,
    model: Rc<dyn AffineModel>,
    error_type: CalibrationErrorType,
}

impl BondOptionHelper {
    /// Creates a helper quoting the option price through `market`.
    ///
    /// # Errors
    ///
    /// Fails unless `0 < maturity < bond_maturity` and the strike is
    /// positive.
    pub fn new(
        option_type: OptionType,
        strike: f64,
        maturity: f64,
        bond_maturity: f64,
        market: Handle<dyn Quote>,
        model: Rc<dyn AffineModel>,
    ) -> ModelResult<Self> {
        let ordered = maturity.is_finite() && maturity > 0.0 && bond_maturity > maturity;
        if !ordered {
            return Err(ModelError::invalid_input(format!(
                "option expiry {maturity} must be positive and before bond maturity {bond_maturity}"
            )));
        }
        if !strike.is_finite() || strike <= 0.0 {
            return Err(ModelError::invalid_input(format!(
                "strike must be positive, got {strike}"
            )));
        }
        Ok(Self {
            option_type,
            strike,
            maturity,
            bond_maturity,
            market,
            model,
            error_type: CalibrationErrorType::default(),
        })
    }

    /// Creates a helper whose market price is the price given by
    /// `reference`.
    pub fn from_reference_model(
        option_type: OptionType,
        strike: f64,
        maturity: f64,
        bond_maturity: f64,
        reference: &dyn AffineModel,
        model: Rc<dyn AffineModel>,
    ) -> ModelResult<Self> {
        let price = reference.discount_bond_option(option_type, strike, maturity, bond_maturity)?;
        Self::new(
            option_type,
            strike,
            maturity,
            bond_maturity,
            fixed_quote(price),
            model,
        )
    }

    /// Sets how the error is measured.
    #[must_use]
    pub fn with_error_type(mut self, error_type: CalibrationErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    /// Returns the option type.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Returns the strike, in price per unit of bond notional.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Returns the option expiry in years.
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Returns the bond maturity in years.
    pub fn bond_maturity(&self) -> f64 {
        self.bond_maturity
    }
}

impl CalibrationHelper for BondOptionHelper {
    fn market_value(&self) -> ModelResult<f64> {
        quote_value(&self.market)
    }

    fn model_value(&self) -> ModelResult<f64> {
        self.model.discount_bond_option(
            self.option_type,
            self.strike,
            self.maturity,
            self.bond_maturity,
        )
    }

    fn error_type(&self) -> CalibrationErrorType {
        self.error_type
    }
}

impl fmt::Debug for BondOptionHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BondOptionHelper")
            .field("option_type", &self.option_type)
            .field("strike", &self.strike)
            .field("maturity", &self.maturity)
            .field("bond_maturity", &self.bond_maturity)
            .field("error_type", &self.error_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vasicek::Vasicek;
    use approx::assert_relative_eq;
    use arbor_core::error::ArborError;
    use arbor_core::handle::RelinkableHandle;

    struct Fixed {
        market: f64,
        model: f64,
        error_type: CalibrationErrorType,
    }

    impl CalibrationHelper for Fixed {
        fn market_value(&self) -> ModelResult<f64> {
            Ok(self.market)
        }

        fn model_value(&self) -> ModelResult<f64> {
            Ok(self.model)
        }

        fn error_type(&self) -> CalibrationErrorType {
            self.error_type
        }
    }

    #[test]
    fn test_error_types() {
        let relative = Fixed {
            market: 2.0,
            model: 2.5,
            error_type: CalibrationErrorType::RelativePriceError,
        };
        assert_relative_eq!(relative.calibration_error().unwrap(), 0.25);

        let price = Fixed {
            market: 2.0,
            model: 2.5,
            error_type: CalibrationErrorType::PriceError,
        };
        assert_relative_eq!(price.calibration_error().unwrap(), -0.5);

        let zero = Fixed {
            market: 0.0,
            model: 0.1,
            error_type: CalibrationErrorType::RelativePriceError,
        };
        assert!(matches!(
            zero.calibration_error(),
            Err(ModelError::Pricing { .. })
        ));
    }

    #[test]
    fn test_discount_bond_helper() {
        let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
        let exact = model.discount(5.0).unwrap();
        let helper = DiscountBondHelper::with_price(5.0, exact, model).unwrap();
        assert_relative_eq!(helper.calibration_error().unwrap(), 0.0, epsilon = 1e-15);

        let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
        assert!(DiscountBondHelper::with_price(0.0, 1.0, model).is_err());
    }

    #[test]
    fn test_bond_option_helper_from_reference() {
        let reference = Vasicek::new(0.05, 0.2, 0.04, 0.015, 0.0).unwrap();
        let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
        let helper = BondOptionHelper::from_reference_model(
            OptionType::Call,
            0.8,
            1.0,
            5.0,
            &*reference,
            model,
        )
        .unwrap()
        .with_error_type(CalibrationErrorType::PriceError);

        let expected = reference
            .discount_bond_option(OptionType::Call, 0.8, 1.0, 5.0)
            .unwrap();
        assert_relative_eq!(helper.market_value().unwrap(), expected);
        assert!(helper.calibration_error().unwrap().abs() > 0.0);

        let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
        assert!(BondOptionHelper::from_reference_model(
            OptionType::Put,
            0.8,
            5.0,
            1.0,
            &*reference,
            model,
        )
        .is_err());
    }

    #[test]
    fn test_empty_market_quote() {
        let quote: RelinkableHandle<dyn Quote> = RelinkableHandle::empty();
        let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
        let helper = DiscountBondHelper::new(2.0, quote.handle(), model).unwrap();
        assert!(matches!(
            helper.calibration_error(),
            Err(ModelError::Core(ArborError::EmptyHandle { .. }))
        ));
    }
}
