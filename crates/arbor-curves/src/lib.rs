//! # Arbor Curves
//!
//! Observable yield term structures for the Arbor calibration library.
//!
//! Every curve implements [`YieldTermStructure`]: a reference date, a day
//! count and discount factors, from which zero and forward rates follow.
//! Curves are single-threaded change-graph nodes; they notify their
//! observers whenever a quote, handle or evaluation date they depend on
//! changes.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use arbor_core::prelude::*;
//! use arbor_curves::prelude::*;
//!
//! let today = Date::from_ymd(2025, 1, 15).unwrap();
//! let base: Rc<dyn YieldTermStructure> =
//!     FlatForward::with_rate(today, 0.03, DayCountConvention::Act365Fixed);
//! let underlying: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
//! let spread: Rc<dyn Quote> = Rc::new(SimpleQuote::new(0.01));
//!
//! let curve = ZeroSpreadedTermStructure::new(underlying.handle(), Handle::new(spread));
//! assert!(curve.reference_date().is_err());
//!
//! underlying.link_to(Some(base));
//! let zero = curve.zero_rate_t(2.0, Compounding::Continuous).unwrap();
//! assert!((zero.rate() - 0.04).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::float_cmp)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::many_single_char_names)]

pub mod curves;
pub mod error;
pub mod traits;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curves::{
        CompositeZeroYieldStructure, FlatForward, ForwardSpreadedTermStructure,
        ImpliedTermStructure, InterpolatedForwardCurve, ZeroSpreadedTermStructure,
    };
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::traits::{CurveHandle, YieldTermStructure, DT};
}

pub use error::{CurveError, CurveResult};
pub use traits::{CurveHandle, YieldTermStructure};
