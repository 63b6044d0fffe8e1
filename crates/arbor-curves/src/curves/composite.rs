//! Curve whose zero rates combine those of two curves.

use std::fmt;
use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_core::types::{Compounding, Date, InterestRate};
use tracing::debug;

use crate::error::CurveResult;
use crate::traits::{linked, observe, CurveHandle, YieldTermStructure};

/// A curve with zero rates `f(z1(t), z2(t))`.
///
/// Both zero rates are taken in `compounding` (continuous by default) and
/// the combined rate is read in the same compounding. Reference date and
/// day count are those of the first curve. If the second handle is empty
/// the first curve's zero rates are used unchanged.
pub struct CompositeZeroYieldStructure<F> {
    first: CurveHandle,
    second: CurveHandle,
    combine: F,
    compounding: Compounding,
    observable: Observable,
}

impl<F> CompositeZeroYieldStructure<F>
where
    F: Fn(f64, f64) -> f64 + 'static,
{
    /// Creates a composite of continuously compounded zero rates.
    pub fn new(first: CurveHandle, second: CurveHandle, combine: F) -> Rc<Self> {
        Self::with_compounding(first, second, combine, Compounding::Continuous)
    }

    /// Creates a composite of zero rates expressed in `compounding`.
    pub fn with_compounding(
        first: CurveHandle,
        second: CurveHandle,
        combine: F,
        compounding: Compounding,
    ) -> Rc<Self> {
        let curve = Rc::new(Self {
            first,
            second,
            combine,
            compounding,
            observable: Observable::new(),
        });
        observe(&curve, &curve.first);
        observe(&curve, &curve.second);
        curve
    }

    fn zero_yield(&self, t: f64) -> CurveResult<f64> {
        let first = linked(&self.first)?;
        let z1 = first.zero_rate_t(t, self.compounding)?.rate();
        let rate = match self.second.current() {
            Some(second) => {
                let z2 = second.zero_rate_t(t, self.compounding)?.rate();
                (self.combine)(z1, z2)
            }
            None => z1,
        };
        let combined = InterestRate::new(rate, first.day_counter()?, self.compounding);
        Ok(combined.equivalent_rate(Compounding::Continuous, t)?.rate())
    }
}

impl<F> YieldTermStructure for CompositeZeroYieldStructure<F>
where
    F: Fn(f64, f64) -> f64 + 'static,
{
    fn reference_date(&self) -> CurveResult<Date> {
        linked(&self.first)?.reference_date()
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        linked(&self.first)?.day_counter()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        if t == 0.0 {
            linked(&self.first)?;
            return Ok(1.0);
        }
        Ok((-self.zero_yield(t)? * t).exp())
    }
}

impl<F> Observer for CompositeZeroYieldStructure<F> {
    fn update(&self) {
        debug!("composite curve input changed");
        self.observable.notify_observers();
    }
}

impl<F> Notifier for CompositeZeroYieldStructure<F> {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

impl<F> fmt::Debug for CompositeZeroYieldStructure<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeZeroYieldStructure")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("compounding", &self.compounding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::FlatForward;
    use crate::error::CurveError;
    use approx::assert_relative_eq;
    use arbor_core::handle::{Handle, RelinkableHandle};

    fn flat(rate: f64) -> CurveHandle {
        let today = Date::from_ymd(2025, 1, 15).unwrap();
        let curve: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(today, rate, DayCountConvention::Act365Fixed);
        Handle::new(curve)
    }

    #[test]
    fn test_flat_difference() {
        let curve =
            CompositeZeroYieldStructure::new(flat(0.05), flat(0.02), |a: f64, b: f64| a - b);
        for t in [0.0, 0.5, 3.0, 30.0] {
            let fwd = curve.forward_rate_t(t, t, Compounding::Continuous).unwrap();
            assert_relative_eq!(fwd.rate(), 0.03, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_missing_second_curve() {
        let second: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
        let curve =
            CompositeZeroYieldStructure::new(flat(0.04), second.handle(), |a: f64, b: f64| {
                a + b
            });

        let zero = curve.zero_rate_t(2.0, Compounding::Continuous).unwrap();
        assert_relative_eq!(zero.rate(), 0.04, epsilon = 1e-12);

        second.link_to(Some(flat(0.01).get().unwrap()));
        let zero = curve.zero_rate_t(2.0, Compounding::Continuous).unwrap();
        assert_relative_eq!(zero.rate(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_first_curve() {
        let first: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
        let curve =
            CompositeZeroYieldStructure::new(first.handle(), flat(0.01), |a: f64, b: f64| {
                a + b
            });
        assert_eq!(curve.discount_t(1.0), Err(CurveError::NoUnderlyingCurve));
    }

    #[test]
    fn test_annual_combination() {
        let curve = CompositeZeroYieldStructure::with_compounding(
            flat(0.05),
            flat(0.02),
            |a: f64, b: f64| a - b,
            Compounding::Annual,
        );
        let z1 = 0.05_f64.exp() - 1.0;
        let z2 = 0.02_f64.exp() - 1.0;
        let zero = curve.zero_rate_t(4.0, Compounding::Annual).unwrap();
        assert_relative_eq!(zero.rate(), z1 - z2, epsilon = 1e-12);
    }
}
