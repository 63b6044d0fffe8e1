//! Hull-White short-rate model.

use std::rc::Rc;

use arbor_core::observer::{register_with, Notifier, Observable, Observer};
use arbor_core::types::Compounding;
use arbor_curves::{CurveError, CurveHandle, YieldTermStructure};
use arbor_math::optimization::PositiveConstraint;
use tracing::{debug, warn};

use crate::black::{black_formula, OptionType};
use crate::calibrated::{Calibratable, CalibratedModel};
use crate::contracts::{
    check_option_times, short_rate, AffineModel, ShortRateModel, TermStructureConsistentModel,
};
use crate::error::{ModelError, ModelResult};
use crate::lattice::{ShortRateTree, TimeGrid};
use crate::parameter::{FittingFunction, Parameter};
use crate::vasicek::{b_factor, bond_volatility, SMALL_MEAN_REVERSION};

const MEAN_REVERSION: usize = 0;
const VOLATILITY: usize = 1;
const FITTING: usize = 2;

/// Hull-White one-factor short-rate model.
///
/// ```text
/// dr = (theta(t) - a r) dt + sigma dW
/// ```
///
/// The drift is fitted so that the model reproduces the anchor curve
/// exactly: `r(t) = x(t) + phi(t)` with `x` an Ornstein-Uhlenbeck process
/// started at zero and
///
/// ```text
/// phi(t) = f(0, t) + 0.5 * (sigma * (1 - exp(-a t)) / a)^2
/// ```
///
/// where `f(0, t)` is the curve's instantaneous forward.
///
/// # Parameters
///
/// - **Mean Reversion (a)**: speed at which rates revert. Must be
///   positive.
/// - **Volatility (σ)**: instantaneous volatility of the short rate. Must
///   be positive.
///
/// `phi` is a fitting parameter with no free coefficients. It is rebuilt
/// whenever the parameters or the curve change.
///
/// The model observes its curve handle and notifies its own observers when
/// the curve changes or is relinked. Queries fail with
/// `CurveError::NoUnderlyingCurve` while the handle is empty.
#[derive(Debug)]
pub struct HullWhite {
    model: CalibratedModel,
    term_structure: CurveHandle,
}

impl HullWhite {
    /// Creates a model anchored to `term_structure`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` if `a` or `sigma` is not positive.
    pub fn new(term_structure: CurveHandle, a: f64, sigma: f64) -> ModelResult<Rc<Self>> {
        let arguments = vec![
            Parameter::constant(a, PositiveConstraint)?,
            Parameter::constant(sigma, PositiveConstraint)?,
            Parameter::term_structure_fitting(),
        ];
        let model = Rc::new(Self {
            model: CalibratedModel::new(arguments),
            term_structure,
        });
        register_with(&model, &model.term_structure)?;
        model.generate_arguments();
        Ok(model)
    }

    /// Returns the mean reversion speed.
    pub fn a(&self) -> f64 {
        self.model.scalar(MEAN_REVERSION)
    }

    /// Returns the short-rate volatility.
    pub fn sigma(&self) -> f64 {
        self.model.scalar(VOLATILITY)
    }

    /// Returns the fitted drift term `phi(t)`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Unfitted` while no curve is linked.
    pub fn phi(&self, t: f64) -> ModelResult<f64> {
        self.model.value(FITTING, t)
    }

    /// Returns today's short rate, the curve's instantaneous forward at
    /// zero.
    pub fn r0(&self) -> ModelResult<f64> {
        Ok(self
            .curve()?
            .forward_rate_t(0.0, 0.0, Compounding::Continuous)?
            .rate())
    }

    fn curve(&self) -> ModelResult<Rc<dyn YieldTermStructure>> {
        self.term_structure
            .current()
            .ok_or(ModelError::Curve(CurveError::NoUnderlyingCurve))
    }

    /// `A(t, T)` in `P(t, T) = A(t, T) exp(-B(t, T) r)`.
    fn a_factor(&self, t: f64, maturity: f64) -> ModelResult<f64> {
        let curve = self.curve()?;
        let discount_t = curve.discount_t(t)?;
        let discount_maturity = curve.discount_t(maturity)?;
        let forward = curve
            .forward_rate_t(t, t, Compounding::Continuous)?
            .rate();

        let a = self.a();
        let b = b_factor(a, maturity - t);
        let temp = self.sigma() * b;
        let value = b * forward - 0.25 * temp * temp * b_factor(a, 2.0 * t);
        Ok(value.exp() * discount_maturity / discount_t)
    }
}

impl AffineModel for HullWhite {
    fn discount(&self, t: f64) -> ModelResult<f64> {
        self.discount_bond(0.0, t, &[self.r0()?])
    }

    fn discount_bond(&self, now: f64, maturity: f64, factors: &[f64]) -> ModelResult<f64> {
        let r = short_rate(factors)?;
        if now.is_nan() || now < 0.0 || maturity.is_nan() || maturity < now {
            return Err(ModelError::invalid_input(format!(
                "bond maturity {maturity} before valuation time {now}"
            )));
        }
        let b = b_factor(self.a(), maturity - now);
        Ok(self.a_factor(now, maturity)? * (-b * r).exp())
    }

    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: f64,
        maturity: f64,
        bond_maturity: f64,
    ) -> ModelResult<f64> {
        check_option_times(maturity, bond_maturity)?;
        let curve = self.curve()?;
        let v = bond_volatility(self.a(), self.sigma(), maturity, bond_maturity);
        let f = curve.discount_t(bond_maturity)?;
        let k = curve.discount_t(maturity)? * strike;
        black_formula(option_type, k, f, v, 1.0)
    }
}

impl TermStructureConsistentModel for HullWhite {
    fn term_structure(&self) -> &CurveHandle {
        &self.term_structure
    }
}

impl ShortRateModel for HullWhite {
    fn tree(&self, grid: &TimeGrid) -> ModelResult<ShortRateTree> {
        let curve = self.curve()?;
        ShortRateTree::fitted(grid.clone(), self.a(), self.sigma(), |t| {
            Ok(curve.discount_t(t)?)
        })
    }
}

impl Calibratable for HullWhite {
    fn calibrated_model(&self) -> &CalibratedModel {
        &self.model
    }

    fn generate_arguments(&self) {
        let (a, sigma) = (self.a(), self.sigma());
        let phi = self
            .term_structure
            .current()
            .map(|curve| -> FittingFunction {
                Rc::new(move |t: f64| -> ModelResult<f64> {
                    let forward = curve
                        .forward_rate_t(t, t, Compounding::Continuous)?
                        .rate();
                    let temp = if a < SMALL_MEAN_REVERSION {
                        sigma * t
                    } else {
                        -sigma * (-a * t).exp_m1() / a
                    };
                    Ok(forward + 0.5 * temp * temp)
                })
            });
        if let Err(error) = self.model.set_fitting(FITTING, phi) {
            warn!(error = %error, "cannot install hull-white fitting function");
        }
    }
}

impl Observer for HullWhite {
    fn update(&self) {
        debug!(
            linked = !self.term_structure.is_empty(),
            "hull-white inputs changed, refitting"
        );
        self.generate_arguments();
        self.notify_observers();
    }
}

impl Notifier for HullWhite {
    fn observable(&self) -> &Observable {
        self.model.observable()
    }
}
