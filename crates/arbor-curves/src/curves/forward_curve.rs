//! Forward curve interpolated backward-flat between dates.

use arbor_core::daycounts::DayCountConvention;
use arbor_core::observer::{Notifier, Observable};
use arbor_core::types::Date;

use crate::error::{CurveError, CurveResult};
use crate::traits::YieldTermStructure;

/// Backward-flat interpolation: between two nodes the value is the one at
/// the right node.
#[derive(Debug, Clone)]
struct BackwardFlat {
    x: Vec<f64>,
    y: Vec<f64>,
    primitive: Vec<f64>,
}

impl BackwardFlat {
    fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        let mut primitive = vec![0.0; x.len()];
        for i in 1..x.len() {
            primitive[i] = primitive[i - 1] + (x[i] - x[i - 1]) * y[i];
        }
        Self { x, y, primitive }
    }

    /// Index of the segment containing `x`, clamped to the first and last
    /// segments.
    fn locate(&self, x: f64) -> usize {
        let n = self.x.len();
        if x < self.x[0] {
            0
        } else if x > self.x[n - 1] {
            n - 2
        } else {
            self.x[..n - 1].partition_point(|&node| node <= x) - 1
        }
    }

    fn value(&self, x: f64) -> f64 {
        if x <= self.x[0] {
            return self.y[0];
        }
        let i = self.locate(x);
        if x == self.x[i] {
            self.y[i]
        } else {
            self.y[i + 1]
        }
    }

    fn primitive(&self, x: f64) -> f64 {
        let i = self.locate(x);
        self.primitive[i] + (x - self.x[i]) * self.y[i + 1]
    }

    fn last(&self) -> (f64, f64) {
        let n = self.x.len();
        (self.x[n - 1], self.y[n - 1])
    }
}

/// A curve defined by instantaneous forward rates at a set of dates.
///
/// The forward is backward-flat between dates and flat at the last rate
/// beyond the final date. The first date is the reference date. The
/// continuously compounded zero rate to `t` is the average forward over
/// `[0, t]`.
///
/// # Example
///
/// ```rust
/// use arbor_core::daycounts::DayCountConvention;
/// use arbor_core::types::Date;
/// use arbor_curves::prelude::*;
///
/// let dates = vec![
///     Date::from_ymd(2025, 1, 1).unwrap(),
///     Date::from_ymd(2026, 1, 1).unwrap(),
///     Date::from_ymd(2027, 1, 1).unwrap(),
/// ];
/// let curve = InterpolatedForwardCurve::new(
///     dates,
///     vec![0.02, 0.02, 0.04],
///     DayCountConvention::Act365Fixed,
/// )
/// .unwrap();
///
/// assert!((curve.forward_at(1.5) - 0.04).abs() < 1e-15);
/// ```
#[derive(Debug)]
pub struct InterpolatedForwardCurve {
    dates: Vec<Date>,
    day_count: DayCountConvention,
    forwards: BackwardFlat,
    observable: Observable,
}

impl InterpolatedForwardCurve {
    /// Creates a curve from dates and the forwards at those dates.
    ///
    /// # Errors
    ///
    /// Fails with fewer than two dates, mismatched lengths, or dates that do
    /// not strictly increase.
    pub fn new(
        dates: Vec<Date>,
        forwards: Vec<f64>,
        day_count: DayCountConvention,
    ) -> CurveResult<Self> {
        if dates.len() < 2 {
            return Err(CurveError::InsufficientPoints {
                required: 2,
                got: dates.len(),
            });
        }
        if dates.len() != forwards.len() {
            return Err(CurveError::invalid_input(format!(
                "dates ({}) and forwards ({}) must have same length",
                dates.len(),
                forwards.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(CurveError::invalid_input(format!(
                "dates must be strictly increasing: {} followed by {}",
                pair[0], pair[1]
            )));
        }
        if let Some(bad) = forwards.iter().find(|f| !f.is_finite()) {
            return Err(CurveError::invalid_input(format!(
                "forward rates must be finite, got {bad}"
            )));
        }

        let reference = dates[0];
        let times: Vec<f64> = dates
            .iter()
            .map(|&d| day_count.year_fraction(reference, d))
            .collect();

        Ok(Self {
            dates,
            day_count,
            forwards: BackwardFlat::new(times, forwards),
            observable: Observable::new(),
        })
    }

    /// Returns the node dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Returns the node times.
    pub fn times(&self) -> &[f64] {
        &self.forwards.x
    }

    /// Returns the node forwards.
    pub fn forwards(&self) -> &[f64] {
        &self.forwards.y
    }

    /// Returns the instantaneous forward at time `t`.
    pub fn forward_at(&self, t: f64) -> f64 {
        let (t_max, f_max) = self.forwards.last();
        if t <= t_max {
            self.forwards.value(t)
        } else {
            f_max
        }
    }

    /// Returns the continuously compounded zero yield at time `t`.
    pub fn zero_yield(&self, t: f64) -> f64 {
        if t == 0.0 {
            return self.forward_at(0.0);
        }
        let (t_max, f_max) = self.forwards.last();
        let integral = if t <= t_max {
            self.forwards.primitive(t)
        } else {
            self.forwards.primitive(t_max) + f_max * (t - t_max)
        };
        integral / t
    }
}

impl YieldTermStructure for InterpolatedForwardCurve {
    fn reference_date(&self) -> CurveResult<Date> {
        Ok(self.dates[0])
    }

    fn day_counter(&self) -> CurveResult<DayCountConvention> {
        Ok(self.day_count)
    }

    fn discount_impl(&self, t: f64) -> CurveResult<f64> {
        if t == 0.0 {
            return Ok(1.0);
        }
        Ok((-self.zero_yield(t) * t).exp())
    }
}

impl Notifier for InterpolatedForwardCurve {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arbor_core::types::Compounding;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn sample() -> InterpolatedForwardCurve {
        // Times 0, 1, 2 under Act/365 (2025 and 2026 are not leap years).
        InterpolatedForwardCurve::new(
            vec![date(2025, 1, 1), date(2026, 1, 1), date(2027, 1, 1)],
            vec![0.01, 0.02, 0.04],
            DayCountConvention::Act365Fixed,
        )
        .unwrap()
    }

    #[test]
    fn test_backward_flat_values() {
        let curve = sample();
        assert_eq!(curve.forward_at(0.0), 0.01);
        assert_eq!(curve.forward_at(0.5), 0.02);
        assert_eq!(curve.forward_at(1.0), 0.02);
        assert_eq!(curve.forward_at(1.0 + 1e-9), 0.04);
        assert_eq!(curve.forward_at(2.0), 0.04);
        assert_eq!(curve.forward_at(10.0), 0.04);
    }

    #[test]
    fn test_zero_yield_is_average_forward() {
        let curve = sample();
        assert_relative_eq!(curve.zero_yield(0.5), 0.02, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_yield(1.5), (0.02 + 0.5 * 0.04) / 1.5, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_yield(2.0), 0.03, epsilon = 1e-15);
        // Flat extrapolation at the last forward.
        assert_relative_eq!(curve.zero_yield(4.0), (0.06 + 2.0 * 0.04) / 4.0, epsilon = 1e-15);
    }

    #[test]
    fn test_discount_and_forward() {
        let curve = sample();
        assert_eq!(curve.discount(date(2025, 1, 1)).unwrap(), 1.0);
        assert_relative_eq!(
            curve.discount(date(2027, 1, 1)).unwrap(),
            (-0.06_f64).exp(),
            epsilon = 1e-15
        );

        let fwd = curve
            .forward_rate(
                date(2026, 7, 1),
                date(2026, 7, 1),
                DayCountConvention::Act365Fixed,
                Compounding::Continuous,
            )
            .unwrap();
        assert_relative_eq!(fwd.rate(), 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_inputs() {
        let dc = DayCountConvention::Act365Fixed;
        assert!(matches!(
            InterpolatedForwardCurve::new(vec![date(2025, 1, 1)], vec![0.01], dc),
            Err(CurveError::InsufficientPoints { .. })
        ));
        assert!(InterpolatedForwardCurve::new(
            vec![date(2025, 1, 1), date(2026, 1, 1)],
            vec![0.01],
            dc
        )
        .is_err());
        assert!(InterpolatedForwardCurve::new(
            vec![date(2026, 1, 1), date(2025, 1, 1)],
            vec![0.01, 0.02],
            dc
        )
        .is_err());
        assert!(InterpolatedForwardCurve::new(
            vec![date(2025, 1, 1), date(2026, 1, 1)],
            vec![0.01, f64::NAN],
            dc
        )
        .is_err());
    }
}
