//! Curve with a spread added to its zero rates.

use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::handle::Handle;
use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_core::quote::Quote;
use arbor_core::types::{Compounding, Date, InterestRate};
use tracing::debug;

use crate::error::CurveResult;
use crate::traits::{linked, observe, CurveHandle, YieldTermStructure};

/// An underlying curve with a spread added to its zero rates.
///
/// The spread is added to zero rates expressed in `compounding`
/// (continuous by default). Reference date and day count are the
/// underlying's.
#[derive(Debug)]
pub struct ZeroSpreadedTermStructure {
    underlying: CurveHandle,
    spread: Handle<dyn Quote>,
    compounding: Compounding,
    observable: Observable,
}

impl ZeroSpreadedTermStructure {
    /// Creates a curve spreading continuously compounded zero rates.
    pub fn new(underlying: CurveHandle, spread: Handle<dyn Quote>) -> Rc<Self> {
        Self::with_compounding(underlying, spread, Compounding::Continuous)
    }

    /// Creates a curve spreading zero rates expressed in `compounding`.
    pub fn with_compounding(
        underlying: CurveHandle,
        spread: Handle<dyn Quote>,
        compounding: Compounding,
    ) -> Rc<Self> {
        let curve = Rc::new(Self {
            underlying,
            spread,
            compounding,
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

    /// Returns the continuously compounded zero yield at time `t`.
    fn zero_yield(&self, t: f64) -> CurveResult<f64> {
        let underlying = linked(&self.underlying)?;
        let zero = underlying.zero_rate_t(t, self.compounding)?;
        let spreaded = InterestRate::new(
            zero.rate() + self.spread()?,
            zero.day_count(),
            self.compounding,
        );
        Ok(spreaded.equivalent_rate(Compounding::Continuous, t)?.rate())
    }
}

impl YieldTermStructure for ZeroSpreadedTermStructure {
    fn reference_date(&self) -> CurveResult<Date> {
        linked(&self.underlying)?.reference_date()
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        linked(&self.underlying)?.day_counter()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        if t == 0.0 {
            linked(&self.underlying)?;
            return Ok(1.0);
        }
        Ok((-self.zero_yield(t)? * t).exp())
    }
}

impl Observer for ZeroSpreadedTermStructure {
    fn update(&self) {
        debug!("zero-spreaded curve input changed");
        self.observable.notify_observers();
    }
}

impl Notifier for ZeroSpreadedTermStructure {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}
