//! Evaluation context.

use std::cell::Cell;

use log::debug;

use crate::observer::{Notifier, Observable};
use crate::types::Date;

/// The date at which valuations are performed.
///
/// Curves whose reference date moves with "today" hold an
/// `Rc<EvaluationDate>` and observe it. Setting a new date notifies them, the
/// same way a quote change would.
///
/// ```rust
/// use arbor_core::settings::EvaluationDate;
/// use arbor_core::types::Date;
///
/// let today = EvaluationDate::new(Date::from_ymd(2025, 1, 15).unwrap());
/// today.set(today.value().add_days(30));
/// assert_eq!(today.value(), Date::from_ymd(2025, 2, 14).unwrap());
/// ```
#[derive(Debug)]
pub struct EvaluationDate {
    date: Cell<Date>,
    observable: Observable,
}

impl EvaluationDate {
    /// Creates an evaluation context at `date`.
    #[must_use]
    pub fn new(date: Date) -> Self {
        Self {
            date: Cell::new(date),
            observable: Observable::new(),
        }
    }

    /// Returns the current evaluation date.
    #[must_use]
    pub fn value(&self) -> Date {
        self.date.get()
    }

    /// Moves the evaluation date, notifying observers if it changed.
    pub fn set(&self, date: Date) {
        let previous = self.date.replace(date);
        if previous != date {
            debug!("evaluation date moved from {previous} to {date}");
            self.observable.notify_change();
        }
    }
}

impl Notifier for EvaluationDate {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{register_with, Flag};
    use std::rc::Rc;

    #[test]
    fn test_set_notifies_on_change() {
        let today = Date::from_ymd(2025, 1, 15).unwrap();
        let context = EvaluationDate::new(today);
        let flag = Rc::new(Flag::new());
        register_with(&flag, &context).unwrap();

        context.set(today);
        assert!(!flag.is_up());

        context.set(today.add_days(1));
        assert!(flag.is_up());
        assert_eq!(context.value(), today.add_days(1));
    }
}
