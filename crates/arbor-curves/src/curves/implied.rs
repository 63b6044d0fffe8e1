//! Curve re-anchored at a later reference date.

use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_core::types::Date;
use tracing::debug;

use crate::error::CurveResult;
use crate::traits::{linked, observe, CurveHandle, YieldTermStructure};

/// The curve implied by an underlying curve at a later reference date.
///
/// Discount factors are those of the underlying divided by its discount
/// factor at the new reference date, so `I(d) * U(new_reference) == U(d)`.
/// The day count is the underlying's.
#[derive(Debug)]
pub struct ImpliedTermStructure {
    underlying: CurveHandle,
    reference_date: Date,
    observable: Observable,
}

impl ImpliedTermStructure {
    /// Creates the implied curve. The handle may be empty.
    pub fn new(underlying: CurveHandle, reference_date: Date) -> Rc<Self> {
        let curve = Rc::new(Self {
            underlying,
            reference_date,
            observable: Observable::new(),
        });
        observe(&curve, &curve.underlying);
        curve
    }

    /// Returns the underlying handle.
    pub fn underlying(&self) -> &CurveHandle {
        &self.underlying
    }
}

impl YieldTermStructure for ImpliedTermStructure {
    fn reference_date(&self) -> CurveResult<Date> {
        Ok(self.reference_date)
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        linked(&self.underlying)?.day_counter()
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        let underlying = linked(&self.underlying)?;
        let offset = underlying.time_from_reference(self.reference_date)?;
        Ok(underlying.discount_t(t + offset)? / underlying.discount_t(offset)?)
    }
}

impl Observer for ImpliedTermStructure {
    fn update(&self) {
        debug!(reference = %self.reference_date, "implied curve input changed");
        self.observable.notify_observers();
    }
}

impl Notifier for ImpliedTermStructure {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}
