//! Observable market quotes.

use std::cell::Cell;

use crate::error::{ArborError, ArborResult};
use crate::observer::{Notifier, Observable};

/// A scalar market value that notifies its observers when it changes.
pub trait Quote: Notifier {
    /// Returns the current value.
    ///
    /// # Errors
    ///
    /// Returns `ArborError::InvalidQuote` if the quote holds no value.
    fn value(&self) -> ArborResult<f64>;

    /// Returns true if the quote holds a value.
    fn is_valid(&self) -> bool;
}

/// A quote whose value is set directly.
///
/// ```rust
/// use arbor_core::quote::{Quote, SimpleQuote};
///
/// let spread = SimpleQuote::new(0.01);
/// spread.set_value(0.005);
/// assert_eq!(spread.value().unwrap(), 0.005);
/// ```
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: Cell<Option<f64>>,
    observable: Observable,
}

impl SimpleQuote {
    /// Creates a quote holding `value`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: Cell::new(Some(value)),
            observable: Observable::new(),
        }
    }

    /// Creates a quote holding no value.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Sets a new value and returns the change from the old one.
    ///
    /// Observers are notified only if the value actually changed.
    pub fn set_value(&self, value: f64) -> f64 {
        let previous = self.value.replace(Some(value));
        let diff = previous.map_or(value, |old| value - old);
        if diff != 0.0 || previous.is_none() {
            self.observable.notify_change();
        }
        diff
    }

    /// Clears the value and notifies observers.
    pub fn reset(&self) {
        if self.value.replace(None).is_some() {
            self.observable.notify_change();
        }
    }
}

impl Notifier for SimpleQuote {
    fn observable(&self) -> &Observable {
        &self.observable
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> ArborResult<f64> {
        self.value.get().ok_or(ArborError::InvalidQuote)
    }

    fn is_valid(&self) -> bool {
        self.value.get().is_some()
    }
}
