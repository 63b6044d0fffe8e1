//! Interest rates with an explicit day count and compounding convention.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Compounding, Date};
use crate::daycounts::DayCountConvention;
use crate::error::{ArborError, ArborResult};

/// An interest rate together with the conventions it is quoted under.
///
/// Converting between conventions goes through the compound factor: two
/// rates are equivalent over a period if they accrue the same amount.
///
/// # Example
///
/// ```rust
/// use arbor_core::daycounts::DayCountConvention;
/// use arbor_core::types::{Compounding, InterestRate};
///
/// let annual = InterestRate::new(0.05, DayCountConvention::Act365Fixed, Compounding::Annual);
/// let continuous = annual.equivalent_rate(Compounding::Continuous, 1.0).unwrap();
/// assert!((continuous.rate() - 1.05_f64.ln()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestRate {
    rate: f64,
    day_count: DayCountConvention,
    compounding: Compounding,
}

impl InterestRate {
    /// Creates a new interest rate.
    #[must_use]
    pub fn new(rate: f64, day_count: DayCountConvention, compounding: Compounding) -> Self {
        Self {
            rate,
            day_count,
            compounding,
        }
    }

    /// Returns the rate value.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the day count convention.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Returns the compounding convention.
    #[must_use]
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// Returns the growth of one unit over `t` years.
    ///
    /// # Errors
    ///
    /// Returns `ArborError::InvalidRate` for a negative time.
    pub fn compound_factor(&self, t: f64) -> ArborResult<f64> {
        if t < 0.0 {
            return Err(ArborError::invalid_rate(format!(
                "negative time ({t}) not allowed"
            )));
        }

        let r = self.rate;
        let factor = match self.compounding.periods_per_year() {
            Some(f) => {
                let f = f64::from(f);
                (1.0 + r / f).powf(f * t)
            }
            None if self.compounding.is_simple() => 1.0 + r * t,
            None => (r * t).exp(),
        };
        Ok(factor)
    }

    /// Returns the growth of one unit between two dates, measured with this
    /// rate's day count.
    pub fn compound_factor_between(&self, start: Date, end: Date) -> ArborResult<f64> {
        self.compound_factor(self.day_count.year_fraction(start, end))
    }

    /// Returns the discount factor over `t` years.
    pub fn discount_factor(&self, t: f64) -> ArborResult<f64> {
        Ok(1.0 / self.compound_factor(t)?)
    }

    /// Returns the rate that produces `compound` over `t` years.
    ///
    /// # Errors
    ///
    /// Returns `ArborError::InvalidRate` if the compound factor is not
    /// positive, or if `t` is not positive while the factor differs from one.
    pub fn implied_rate(
        compound: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        t: f64,
    ) -> ArborResult<Self> {
        if compound <= 0.0 {
            return Err(ArborError::invalid_rate(format!(
                "positive compound factor required, got {compound}"
            )));
        }

        let rate = if compound == 1.0 {
            if t < 0.0 {
                return Err(ArborError::invalid_rate(format!(
                    "non-negative time required, got {t}"
                )));
            }
            0.0
        } else {
            if t <= 0.0 {
                return Err(ArborError::invalid_rate(format!(
                    "positive time required, got {t}"
                )));
            }
            match compounding.periods_per_year() {
                Some(f) => {
                    let f = f64::from(f);
                    (compound.powf(1.0 / (f * t)) - 1.0) * f
                }
                None if compounding.is_simple() => (compound - 1.0) / t,
                None => compound.ln() / t,
            }
        };

        Ok(Self::new(rate, day_count, compounding))
    }

    /// Returns the rate that produces `compound` between two dates.
    pub fn implied_rate_between(
        compound: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        start: Date,
        end: Date,
    ) -> ArborResult<Self> {
        if start > end {
            return Err(ArborError::invalid_rate(format!(
                "start date ({start}) later than end date ({end})"
            )));
        }
        Self::implied_rate(
            compound,
            day_count,
            compounding,
            day_count.year_fraction(start, end),
        )
    }

    /// Returns the rate under `compounding` that accrues the same amount as
    /// this one over `t` years.
    pub fn equivalent_rate(&self, compounding: Compounding, t: f64) -> ArborResult<Self> {
        Self::implied_rate(self.compound_factor(t)?, self.day_count, compounding, t)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}% {} {}",
            self.rate * 100.0,
            self.day_count,
            self.compounding
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DC: DayCountConvention = DayCountConvention::Act365Fixed;

    #[test]
    fn test_compound_factors() {
        let t = 2.5;
        let simple = InterestRate::new(0.04, DC, Compounding::Simple);
        let semi = InterestRate::new(0.04, DC, Compounding::SemiAnnual);
        let cont = InterestRate::new(0.04, DC, Compounding::Continuous);

        assert_relative_eq!(simple.compound_factor(t).unwrap(), 1.1);
        assert_relative_eq!(semi.compound_factor(t).unwrap(), 1.02_f64.powf(5.0));
        assert_relative_eq!(cont.compound_factor(t).unwrap(), 0.1_f64.exp());
        assert_relative_eq!(
            cont.discount_factor(t).unwrap(),
            (-0.1_f64).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_implied_rate_inverts_compound_factor() {
        for compounding in [
            Compounding::Simple,
            Compounding::Annual,
            Compounding::Quarterly,
            Compounding::Daily,
            Compounding::Continuous,
        ] {
            let rate = InterestRate::new(0.0375, DC, compounding);
            let compound = rate.compound_factor(3.2).unwrap();
            let implied = InterestRate::implied_rate(compound, DC, compounding, 3.2).unwrap();
            assert_relative_eq!(implied.rate(), 0.0375, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_equivalent_rate_round_trip() {
        let simple = InterestRate::new(0.05, DC, Compounding::Simple);
        let cont = simple.equivalent_rate(Compounding::Continuous, 0.75).unwrap();
        assert_relative_eq!(cont.rate(), (1.0 + 0.05 * 0.75_f64).ln() / 0.75);
        let back = cont.equivalent_rate(Compounding::Simple, 0.75).unwrap();
        assert_relative_eq!(back.rate(), 0.05, epsilon = 1e-14);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(InterestRate::implied_rate(0.0, DC, Compounding::Continuous, 1.0).is_err());
        assert!(InterestRate::implied_rate(1.1, DC, Compounding::Continuous, 0.0).is_err());
        assert_eq!(
            InterestRate::implied_rate(1.0, DC, Compounding::Continuous, 0.0)
                .unwrap()
                .rate(),
            0.0
        );
        let rate = InterestRate::new(0.05, DC, Compounding::Annual);
        assert!(rate.compound_factor(-1.0).is_err());
    }
}
