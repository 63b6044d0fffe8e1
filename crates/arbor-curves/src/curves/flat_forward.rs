//! Flat forward curve.

use std::rc::Rc;

use arbor_core::daycounts::DayCountConvention;
use arbor_core::handle::Handle;
use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_core::quote::{Quote, SimpleQuote};
use arbor_core::settings::EvaluationDate;
use arbor_core::types::{Compounding, Date, InterestRate};
use tracing::trace;

use crate::error::CurveResult;
use crate::traits::{observe, YieldTermStructure};

/// How a curve finds its reference date.
#[derive(Debug, Clone)]
enum Reference {
    Fixed(Date),
    Moving {
        today: Rc<EvaluationDate>,
        settlement_days: i64,
    },
}

/// A curve with a single forward rate for every maturity.
///
/// The rate comes from a quote handle and is read on every query, so quote
/// changes and relinks take effect immediately and are forwarded to
/// observers.
///
/// A moving curve sits `settlement_days` calendar days after the evaluation
/// date and follows it.
#[derive(Debug)]
pub struct FlatForward {
    reference: Reference,
    forward: Handle<dyn Quote>,
    day_count: DayCountConvention,
    compounding: Compounding,
    observable: Observable,
}

impl FlatForward {
    /// Creates a curve with a fixed reference date.
    pub fn new(
        reference_date: Date,
        forward: Handle<dyn Quote>,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> Rc<Self> {
        Self::build(Reference::Fixed(reference_date), forward, day_count, compounding)
    }

    /// Creates a curve at a constant continuously compounded rate.
    pub fn with_rate(reference_date: Date, rate: f64, day_count: DayCountConvention) -> Rc<Self> {
        let quote: Rc<dyn Quote> = Rc::new(SimpleQuote::new(rate));
        Self::new(
            reference_date,
            Handle::new(quote),
            day_count,
            Compounding::Continuous,
        )
    }

    /// Creates a curve whose reference date follows the evaluation date.
    pub fn moving(
        today: Rc<EvaluationDate>,
        settlement_days: i64,
        forward: Handle<dyn Quote>,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> Rc<Self> {
        let curve = Self::build(
            Reference::Moving {
                today: Rc::clone(&today),
                settlement_days,
            },
            forward,
            day_count,
            compounding,
        );
        observe(&curve, &*today);
        curve
    }

    fn build(
        reference: Reference,
        forward: Handle<dyn Quote>,
        day_count: DayCountConvention,
        compounding: Compounding,
    ) -> Rc<Self> {
        let curve = Rc::new(Self {
            reference,
            forward,
            day_count,
            compounding,
            observable: Observable::new(),
        });
        observe(&curve, &curve.forward);
        curve
    }

    /// Returns the compounding the quoted rate is expressed in.
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    fn rate(&self) -> CurveResult<InterestRate> {
        let quote = self.forward.get()?;
        Ok(InterestRate::new(
            quote.value()?,
            self.day_count,
            self.compounding,
        ))
    }
}

impl YieldTermStructure for FlatForward {
    fn reference_date(&self) -> CurveResult<Date> {
        Ok(match &self.reference {
            Reference::Fixed(date) => *date,
            Reference::Moving {
                today,
                settlement_days,
            } => today.value().add_days(*settlement_days),
        })
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        Ok(self.day_count)
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        Ok(self.rate()?.discount_factor(t)?)
    }
}

impl Observer for FlatForward {
    fn update(&self) {
        trace!("flat forward input changed");
        self.observable.notify_observers();
    }
}

impl Notifier for FlatForward {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}
