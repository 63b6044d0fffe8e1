//! Vasicek short-rate model.

use std::rc::Rc;

use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_math::optimization::{NoConstraint, PositiveConstraint};
use tracing::trace;

use crate::black::{black_formula, OptionType};
use crate::calibrated::{Calibratable, CalibratedModel};
use crate::contracts::{check_option_times, short_rate, AffineModel, ShortRateModel};
use crate::error::{ModelError, ModelResult};
use crate::lattice::{ShortRateTree, TimeGrid};
use crate::parameter::Parameter;

/// Below this mean reversion the closed forms switch to their `a -> 0`
/// limits.
pub(crate) const SMALL_MEAN_REVERSION: f64 = 1.490_116_119_384_765_6e-8;

/// `(1 - exp(-a tau)) / a`, or `tau` as `a -> 0`.
pub(crate) fn b_factor(a: f64, tau: f64) -> f64 {
    if a < SMALL_MEAN_REVERSION {
        tau
    } else {
        -(-a * tau).exp_m1() / a
    }
}

/// Standard deviation of the log price, at option expiry `maturity`, of a
/// bond maturing at `bond_maturity`.
pub(crate) fn bond_volatility(a: f64, sigma: f64, maturity: f64, bond_maturity: f64) -> f64 {
    let b = b_factor(a, bond_maturity - maturity);
    if maturity <= 0.0 {
        0.0
    } else if a < SMALL_MEAN_REVERSION {
        sigma * b * maturity.sqrt()
    } else {
        sigma * b * (-0.5 * (-2.0 * a * maturity).exp_m1() / a).sqrt()
    }
}

const MEAN_REVERSION: usize = 0;
const LONG_TERM_RATE: usize = 1;
const VOLATILITY: usize = 2;
const RISK_PREMIUM: usize = 3;

/// Vasicek one-factor short-rate model.
///
/// ```text
/// dr = a (b - r) dt + sigma dW
/// ```
///
/// Bond prices are exponential-affine in the short rate and bond options
/// have a Black-type closed form.
///
/// # Parameters
///
/// - **Mean Reversion (a)**: speed at which the rate reverts to `b`.
///   Must be positive.
/// - **Long-term Rate (b)**: level the rate reverts to.
/// - **Volatility (σ)**: instantaneous volatility of the short rate.
///   Must be positive.
/// - **Risk Premium (λ)**: market price of risk.
///
/// The initial short rate `r0` is fixed and not calibrated.
///
/// # Example
///
/// ```rust
/// use arbor_models::prelude::*;
///
/// let model = Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap();
/// let price = model.discount(5.0).unwrap();
/// let same = model.discount_bond(0.0, 5.0, &[0.05]).unwrap();
/// assert!((price - same).abs() < 1e-15);
/// assert_eq!(model.params(), vec![0.1, 0.05, 0.01, 0.0]);
/// ```
#[derive(Debug)]
pub struct Vasicek {
    model: CalibratedModel,
    r0: f64,
}

impl Vasicek {
    /// Creates a model.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` if `a` or `sigma` is not positive.
    pub fn new(r0: f64, a: f64, b: f64, sigma: f64, lambda: f64) -> ModelResult<Rc<Self>> {
        if !r0.is_finite() {
            return Err(ModelError::invalid_input(format!(
                "initial short rate must be finite, got {r0}"
            )));
        }
        let arguments = vec![
            Parameter::constant(a, PositiveConstraint)?,
            Parameter::constant(b, NoConstraint)?,
            Parameter::constant(sigma, PositiveConstraint)?,
            Parameter::constant(lambda, NoConstraint)?,
        ];
        Ok(Rc::new(Self {
            model: CalibratedModel::new(arguments),
            r0,
        }))
    }

    /// Returns the initial short rate.
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// Returns the mean reversion speed.
    pub fn a(&self) -> f64 {
        self.model.scalar(MEAN_REVERSION)
    }

    /// Returns the long-term rate.
    pub fn b(&self) -> f64 {
        self.model.scalar(LONG_TERM_RATE)
    }

    /// Returns the short-rate volatility.
    pub fn sigma(&self) -> f64 {
        self.model.scalar(VOLATILITY)
    }

    /// Returns the market price of risk.
    pub fn lambda(&self) -> f64 {
        self.model.scalar(RISK_PREMIUM)
    }

    /// `A(t, T)` in `P(t, T) = A(t, T) exp(-B(t, T) r)`.
    fn a_factor(&self, tau: f64) -> f64 {
        let (a, sigma, lambda) = (self.a(), self.sigma(), self.lambda());
        let sigma2 = sigma * sigma;
        if a < SMALL_MEAN_REVERSION {
            return (-0.5 * lambda * sigma * tau * tau + sigma2 * tau.powi(3) / 6.0).exp();
        }
        let bt = b_factor(a, tau);
        ((self.b() + lambda * sigma / a - 0.5 * sigma2 / (a * a)) * (bt - tau)
            - 0.25 * sigma2 * bt * bt / a)
            .exp()
    }
}

impl AffineModel for Vasicek {
    fn discount(&self, t: f64) -> ModelResult<f64> {
        self.discount_bond(0.0, t, &[self.r0])
    }

    fn discount_bond(&self, now: f64, maturity: f64, factors: &[f64]) -> ModelResult<f64> {
        let r = short_rate(factors)?;
        let tau = maturity - now;
        if tau.is_nan() || tau < 0.0 {
            return Err(ModelError::invalid_input(format!(
                "bond maturity {maturity} before valuation time {now}"
            )));
        }
        Ok(self.a_factor(tau) * (-b_factor(self.a(), tau) * r).exp())
    }

    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: f64,
        maturity: f64,
        bond_maturity: f64,
    ) -> ModelResult<f64> {
        check_option_times(maturity, bond_maturity)?;
        let v = bond_volatility(self.a(), self.sigma(), maturity, bond_maturity);
        let f = self.discount(bond_maturity)?;
        let k = self.discount(maturity)? * strike;
        black_formula(option_type, k, f, v, 1.0)
    }
}

impl ShortRateModel for Vasicek {
    fn tree(&self, grid: &TimeGrid) -> ModelResult<ShortRateTree> {
        ShortRateTree::fitted(grid.clone(), self.a(), self.sigma(), |t| self.discount(t))
    }
}

impl Calibratable for Vasicek {
    fn calibrated_model(&self) -> &CalibratedModel {
        &self.model
    }
}

impl Observer for Vasicek {
    fn update(&self) {
        trace!("vasicek parameters changed");
        self.generate_arguments();
        self.notify_observers();
    }
}

impl Notifier for Vasicek {
    fn observable(&self) -> &Observable {
        self.model.observable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::observer::{register_with, Flag};
    use arbor_math::optimization::Constraint;

    fn model() -> Rc<Vasicek> {
        Vasicek::new(0.05, 0.1, 0.05, 0.01, 0.0).unwrap()
    }

    #[test]
    fn test_parameters() {
        let m = Vasicek::new(0.03, 0.2, 0.04, 0.015, 0.1).unwrap();
        assert_eq!(m.r0(), 0.03);
        assert_eq!((m.a(), m.b(), m.sigma(), m.lambda()), (0.2, 0.04, 0.015, 0.1));
        let constraint = m.constraint();
        assert!(constraint.test(&[0.2, -0.01, 0.015, -0.5]));
        assert!(!constraint.test(&[-0.2, 0.04, 0.015, 0.0]));
        assert!(!constraint.test(&[0.2, 0.04, 0.0, 0.0]));

        assert!(Vasicek::new(0.05, -0.1, 0.05, 0.01, 0.0).is_err());
        assert!(Vasicek::new(0.05, 0.1, 0.05, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_bond_price() {
        let m = model();
        // ln A = (b - sigma^2 / (2 a^2)) (B - tau) - sigma^2 B^2 / (4 a)
        let tau: f64 = 5.0;
        let b = (1.0 - (-0.1 * tau).exp()) / 0.1;
        let ln_a = (0.05 - 0.5 * 0.0001 / 0.01) * (b - tau) - 0.25 * 0.0001 * b * b / 0.1;
        let expected = (ln_a - b * 0.05).exp();
        assert_relative_eq!(m.discount(tau).unwrap(), expected, epsilon = 1e-15);
        assert_relative_eq!(m.discount(tau).unwrap(), 0.779_935_605_265_847_7, epsilon = 1e-14);
        assert_eq!(m.discount(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_discount_bond_consistency() {
        let m = model();
        for t in [0.25, 1.0, 7.5, 30.0] {
            assert_eq!(
                m.discount(t).unwrap(),
                m.discount_bond(0.0, t, &[m.r0()]).unwrap()
            );
        }
        // Time-homogeneous: only tau matters.
        assert_relative_eq!(
            m.discount_bond(2.0, 7.0, &[0.04]).unwrap(),
            m.discount_bond(0.0, 5.0, &[0.04]).unwrap(),
            epsilon = 1e-15
        );
        assert!(m.discount_bond(2.0, 1.0, &[0.04]).is_err());
        assert!(m.discount_bond(0.0, 1.0, &[]).is_err());
    }

    #[test]
    fn test_small_mean_reversion_limit() {
        let tiny = Vasicek::new(0.04, 1e-9, 0.05, 0.01, 0.2).unwrap();
        let small = Vasicek::new(0.04, 1e-4, 0.05, 0.01, 0.2).unwrap();
        for t in [1.0_f64, 5.0, 10.0] {
            let limit = (-0.5 * 0.2 * 0.01 * t * t + 1e-4 * t.powi(3) / 6.0 - 0.04 * t).exp();
            assert_relative_eq!(tiny.discount(t).unwrap(), limit, max_relative = 1e-14);
            assert_relative_eq!(small.discount(t).unwrap(), limit, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_option_put_call_parity() {
        let m = model();
        let (strike, expiry, bond) = (0.8, 2.0, 7.0);
        let call = m
            .discount_bond_option(OptionType::Call, strike, expiry, bond)
            .unwrap();
        let put = m
            .discount_bond_option(OptionType::Put, strike, expiry, bond)
            .unwrap();
        let forward = m.discount(bond).unwrap() - strike * m.discount(expiry).unwrap();
        assert_relative_eq!(call - put, forward, epsilon = 1e-14);
        assert!(call > forward.max(0.0));
    }

    #[test]
    fn test_expired_option_is_intrinsic() {
        let m = model();
        let call = m.discount_bond_option(OptionType::Call, 0.7, 0.0, 5.0).unwrap();
        assert_relative_eq!(call, m.discount(5.0).unwrap() - 0.7, epsilon = 1e-15);
        assert!(m.discount_bond_option(OptionType::Call, 0.7, 6.0, 5.0).is_err());
    }

    #[test]
    fn test_tree_reprices_model_discounts() {
        let m = model();
        let grid = TimeGrid::new(10.0, 40).unwrap();
        let tree = m.tree(&grid).unwrap();
        for i in [1, 10, 25, 40] {
            assert_relative_eq!(
                tree.discount_bond(i).unwrap(),
                m.discount(grid.time(i)).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_update_notifies() {
        let m = model();
        let flag = Rc::new(Flag::new());
        register_with(&flag, &*m).unwrap();
        m.set_params(&[0.2, 0.04, 0.02, 0.0]).unwrap();
        assert!(!flag.is_up());
        m.update();
        assert_eq!(flag.times_raised(), 1);
        assert_eq!(m.a(), 0.2);
    }
}
