//! Curve with a spread added to its forward rates.

use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::handle::Handle;
use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_core::quote::Quote;
use arbor_core::types::{Compounding, Date};
use tracing::debug;

use crate::error::CurveResult;
use crate::traits::{linked, observe, CurveHandle, YieldTermStructure};

/// An underlying curve with a spread added to its continuously compounded
/// instantaneous forwards.
///
/// Adding a constant to every forward adds the same constant to every
/// continuously compounded zero rate, so discount factors are
/// `U(t) * exp(-spread * t)`. Reference date and day count are the
/// underlying's.
#[derive(Debug)]
pub struct ForwardSpreadedTermStructure {
    underlying: CurveHandle,
    spread: Handle<dyn Quote>,
    observable: Observable,
}

impl ForwardSpreadedTermStructure {
    /// Creates the spreaded curve. Either handle may be empty.
    pub fn new(underlying: CurveHandle, spread: Handle<dyn Quote>) -> Rc<Self> {
        let curve = Rc::new(Self {
            underlying,
            spread,
            observable: Observable::new(),
        });
        observe(&curve, &curve.underlying);
        observe(&curve, &curve.spread);
        curve
    }

    /// Returns the current spread.
    pub fn spread(&self) -> CurveResult<f64> {
        Ok(self.spread.get()?.value()?)
    }
}

impl YieldTermStructure for ForwardSpreadedTermStructure {
    fn reference_date(&self) -> CurveResult<Date> {
        linked(&self.underlying)?.reference_date()
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        linked(&self.underlying)?.day_counter()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let underlying = linked(&self.underlying)?;
        let spread = self.spread()?;
        if t == 0.0 {
            return Ok(1.0);
        }
        let zero = underlying.zero_rate_t(t, Compounding::Continuous)?.rate();
        Ok((-(zero + spread) * t).exp())
    }
}

impl Observer for ForwardSpreadedTermStructure {
    fn update(&self) {
        debug!("forward-spreaded curve input changed");
        self.observable.notify_observers();
    }
}

impl Notifier for ForwardSpreadedTermStructure {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::FlatForward;
    use approx::assert_relative_eq;
    use arbor_core::quote::SimpleQuote;

    #[test]
    fn test_flat_curve_shifts() {
        let today = Date::from_ymd(2025, 1, 15).unwrap();
        let base: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(today, 0.03, DayCountConvention::Act365Fixed);
        let spread: Rc<dyn Quote> = Rc::new(SimpleQuote::new(0.01));
        let curve = ForwardSpreadedTermStructure::new(Handle::new(base), Handle::new(spread));

        assert_eq!(curve.reference_date().unwrap(), today);
        assert_relative_eq!(curve.discount_t(0.0).unwrap(), 1.0);
        assert_relative_eq!(
            curve.discount_t(2.0).unwrap(),
            (-0.08_f64).exp(),
            epsilon = 1e-14
        );
        let fwd = curve
            .forward_rate_t(1.0, 1.0, Compounding::Continuous)
            .unwrap();
        assert_relative_eq!(fwd.rate(), 0.04, epsilon = 1e-10);
    }
}
