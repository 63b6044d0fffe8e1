//! The yield term structure contract.
//!
//! Implementations supply a reference date, a day count and discount factors
//! as a function of time. Zero and forward rates are derived from those, so
//! every curve answers rate queries the same way.

use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::handle::Handle;
use arbor_core::observer::{register_with, Notifier, Observer};
use arbor_core::types::{Compounding, Date, InterestRate};
use tracing::warn;

use crate::error::{CurveError, CurveResult};

/// Step used for instantaneous forwards and for zero rates at `t = 0`.
pub const DT: f64 = 1e-4;

/// A shared, relinkable reference to a yield curve.
pub type CurveHandle = Handle<dyn YieldTermStructure>;

/// A discount curve anchored at a reference date.
///
/// # Required Methods
///
/// - [`reference_date`](YieldTermStructure::reference_date)
/// - [`day_counter`](YieldTermStructure::day_counter)
/// - [`discount_impl`](YieldTermStructure::discount_impl), which may assume
///   a non-negative time
///
/// Curves are observable: they notify whenever any input they depend on
/// changes, and recompute lazily on the next query.
///
/// # Example
///
/// ```rust
/// use arbor_core::daycounts::DayCountConvention;
/// use arbor_core::types::{Compounding, Date};
/// use arbor_curves::prelude::*;
///
/// let today = Date::from_ymd(2025, 1, 15).unwrap();
/// let curve = FlatForward::with_rate(today, 0.03, DayCountConvention::Act365Fixed);
///
/// let zero = curve
///     .zero_rate(today.add_days(365), DayCountConvention::Act365Fixed, Compounding::Continuous)
///     .unwrap();
/// assert!((zero.rate() - 0.03).abs() < 1e-12);
/// ```
pub trait YieldTermStructure: Notifier {
    /// Returns the date at which `t = 0`.
    fn reference_date(&self) -> CurveResult<Date>;

    /// Returns the day count used to turn dates into times.
    fn day_counter(&self) -> CurveResult<DayCountConvention>;

    /// Returns the discount factor at time `t >= 0`.
    fn discount_impl(&self, t: f64) -> CurveResult<f64>;

    /// Returns the time in years from the reference date to `date`.
    fn time_from_reference(&self, date: Date) -> CurveResult<f64> {
        Ok(self
            .day_counter()?
            .year_fraction(self.reference_date()?, date))
    }

    /// Returns the discount factor at time `t`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::InvalidTime` for a negative time.
    fn discount_t(&self, t: f64) -> CurveResult<f64> {
        if t.is_nan() || t < 0.0 {
            return Err(CurveError::InvalidTime { t });
        }
        self.discount_impl(t)
    }

    /// Returns the discount factor at `date`.
    fn discount(&self, date: Date) -> CurveResult<f64> {
        self.discount_t(self.time_from_reference(date)?)
    }

    /// Returns the zero rate to `date`, expressed with the given day count
    /// and compounding.
    fn zero_rate(
        &self,
        date: Date,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> CurveResult<InterestRate> {
        let reference = self.reference_date()?;
        if date == reference {
            let compound = 1.0 / self.discount_t(DT)?;
            return Ok(InterestRate::implied_rate(
                compound,
                day_count,
                compounding,
                DT,
            )?);
        }
        let compound = 1.0 / self.discount(date)?;
        Ok(InterestRate::implied_rate_between(
            compound,
            day_count,
            compounding,
            reference,
            date,
        )?)
    }

    /// Returns the zero rate to time `t` under the curve's own day count.
    fn zero_rate_t(&self, t: f64, compounding: Compounding) -> CurveResult<InterestRate> {
        let t = if t == 0.0 { DT } else { t };
        let compound = 1.0 / self.discount_t(t)?;
        Ok(InterestRate::implied_rate(
            compound,
            self.day_counter()?,
            compounding,
            t,
        )?)
    }

    /// Returns the forward rate between two dates.
    ///
    /// Equal dates give the instantaneous forward, estimated over a step of
    /// [`DT`] centred on the date (and starting no earlier than the
    /// reference date).
    fn forward_rate(
        &self,
        start: Date,
        end: Date,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> CurveResult<InterestRate> {
        if start == end {
            let t = self.time_from_reference(start)?;
            return self.instantaneous_forward(t, day_count, compounding);
        }
        let compound = self.discount(start)? / self.discount(end)?;
        Ok(InterestRate::implied_rate_between(
            compound,
            day_count,
            compounding,
            start,
            end,
        )?)
    }

    /// Returns the forward rate between two times under the curve's own day
    /// count.
    fn forward_rate_t(
        &self,
        t1: f64,
        t2: f64,
        compounding: Compounding,
    ) -> CurveResult<InterestRate> {
        let day_count = self.day_counter()?;
        if t1 == t2 {
            return self.instantaneous_forward(t1, day_count, compounding);
        }
        if t2 < t1 {
            return Err(CurveError::invalid_input(format!(
                "forward start {t1} later than end {t2}"
            )));
        }
        let compound = self.discount_t(t1)? / self.discount_t(t2)?;
        Ok(InterestRate::implied_rate(
            compound,
            day_count,
            compounding,
            t2 - t1,
        )?)
    }

    /// Returns the instantaneous forward rate at time `t`.
    fn instantaneous_forward(
        &self,
        t: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> CurveResult<InterestRate> {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        let compound = self.discount_t(t1)? / self.discount_t(t2)?;
        Ok(InterestRate::implied_rate(
            compound,
            day_count,
            compounding,
            DT,
        )?)
    }
}

/// Returns the curve behind `handle`, or `CurveError::NoUnderlyingCurve`.
pub(crate) fn linked(handle: &CurveHandle) -> CurveResult<Rc<dyn YieldTermStructure>> {
    handle.current().ok_or(CurveError::NoUnderlyingCurve)
}

/// Registers `observer` with one of its inputs.
///
/// Curve inputs live behind their own `Rc`, so registration cannot fail;
/// a rejected registration is logged and the curve stays detached.
pub(crate) fn observe<O, N>(observer: &Rc<O>, notifier: &N)
where
    O: Observer + 'static,
    N: Notifier + ?Sized,
{
    if let Err(error) = register_with(observer, notifier) {
        warn!(error = %error, "curve could not observe its input");
    }
}
