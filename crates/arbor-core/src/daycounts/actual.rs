//! Actual day count conventions.

use chrono::Datelike;

use super::DayCount;
use crate::types::Date;

/// Actual/360 day count convention.
///
/// Year fraction = actual days / 360.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "ACT/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/365 Fixed day count convention.
///
/// Year fraction = actual days / 365, regardless of leap years.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "ACT/365F"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 365.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/Actual ISDA day count convention.
///
/// The period is split into the portions falling in each calendar year;
/// each portion is divided by that year's length.
///
/// # Formula
///
/// $$\text{Year Fraction} = \frac{\text{Days in non-leap year}}{365} + \frac{\text{Days in leap year}}{366}$$
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ACT/ACT ISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        if start == end {
            return 0.0;
        }
        if start > end {
            return -self.year_fraction(end, start);
        }

        let y1 = start.year();
        let y2 = end.year();
        let basis1 = f64::from(start.days_in_year());
        let basis2 = f64::from(end.days_in_year());

        // Days from start to Jan 1 of the following year, and from Jan 1 of
        // the end year to end.
        let days_to_next_year = f64::from(start.days_in_year() - start.as_naive_date().ordinal0());
        let days_into_end_year = f64::from(end.as_naive_date().ordinal0());

        if y1 == y2 {
            return start.days_between(&end) as f64 / basis1;
        }

        days_to_next_year / basis1 + f64::from(y2 - y1 - 1) + days_into_end_year / basis2
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}
