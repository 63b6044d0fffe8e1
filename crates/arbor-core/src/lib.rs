//! # Arbor Core
//!
//! Foundational types for the Arbor calibration library.
//!
//! - **Types**: `Date`, `Compounding`, `InterestRate`
//! - **Day Count Conventions**: year fractions between dates
//! - **Change graph**: `Observable`/`Observer` with weak, synchronous,
//!   depth-first notification
//! - **Handles**: shared relinkable references to observable objects
//! - **Quotes** and the **evaluation date** context
//!
//! Everything in the change graph is single-threaded (`Rc`/`RefCell`);
//! callers that share a graph across threads must serialize access
//! themselves.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use arbor_core::prelude::*;
//!
//! let quote: Rc<dyn Quote> = Rc::new(SimpleQuote::new(0.01));
//! let spread: RelinkableHandle<dyn Quote> = RelinkableHandle::empty();
//! let flag = Rc::new(Flag::new());
//! register_with(&flag, &*spread).unwrap();
//!
//! spread.link_to(Some(quote));
//! assert!(flag.is_up());
//! assert_eq!(spread.get().unwrap().value().unwrap(), 0.01);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]
#![allow(clippy::return_self_not_must_use)]

pub mod daycounts;
pub mod error;
pub mod handle;
pub mod observer;
pub mod quote;
pub mod settings;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::daycounts::{DayCount, DayCountConvention};
    pub use crate::error::{ArborError, ArborResult};
    pub use crate::handle::{Handle, RelinkableHandle};
    pub use crate::observer::{
        register_with, unregister_with, Flag, Notifier, Observable, Observer,
    };
    pub use crate::quote::{Quote, SimpleQuote};
    pub use crate::settings::EvaluationDate;
    pub use crate::types::{Compounding, Date, InterestRate};
}

pub use error::{ArborError, ArborResult};
pub use types::Date;
