//! # Arbor Models
//!
//! Calibrated short-rate models for the Arbor calibration library.
//!
//! - **Parameters**: constant, null, piecewise-constant and term-structure
//!   fitting parameters, each with its own constraint
//! - **Calibration**: [`CalibratedModel`] storage, the [`Calibratable`]
//!   workflow and calibration helpers priced by the model
//! - **Models**: [`Vasicek`] and [`HullWhite`], with closed-form bond and
//!   bond option prices and fitted short-rate lattices
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use arbor_core::prelude::*;
//! use arbor_curves::prelude::*;
//! use arbor_math::prelude::{EndCriteria, LevenbergMarquardt};
//! use arbor_models::prelude::*;
//!
//! let today = Date::from_ymd(2025, 1, 15).unwrap();
//! let curve: Rc<dyn YieldTermStructure> =
//!     FlatForward::with_rate(today, 0.04, DayCountConvention::Act365Fixed);
//! let handle = Handle::new(curve);
//!
//! let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
//! let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
//!
//! let helpers: Vec<Rc<dyn CalibrationHelper>> = [(1.0, 5.0), (2.0, 7.0), (3.0, 10.0)]
//!     .into_iter()
//!     .map(|(expiry, bond)| {
//!         let helper = BondOptionHelper::from_reference_model(
//!             OptionType::Call, 0.8, expiry, bond, &*reference, model.clone(),
//!         )
//!         .unwrap();
//!         Rc::new(helper) as Rc<dyn CalibrationHelper>
//!     })
//!     .collect();
//!
//! let report = model
//!     .calibrate(&helpers, &LevenbergMarquardt::new(), &EndCriteria::default(), None, &[])
//!     .unwrap();
//! assert!(report.converged());
//! assert!(report.rms_error < 1e-4);
//! assert!((model.a() - 0.1).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]

pub mod black;
pub mod calibrated;
pub mod config;
pub mod constraint;
pub mod contracts;
pub mod error;
pub mod helpers;
pub mod hull_white;
pub mod lattice;
pub mod parameter;
pub mod vasicek;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::black::{black_formula, OptionType};
    pub use crate::calibrated::{Calibratable, CalibratedModel, CalibrationReport};
    pub use crate::config::{CalibrationConfig, MethodConfig};
    pub use crate::constraint::ParameterConstraint;
    pub use crate::contracts::{AffineModel, ShortRateModel, TermStructureConsistentModel};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::helpers::{
        BondOptionHelper, CalibrationErrorType, CalibrationHelper, DiscountBondHelper,
    };
    pub use crate::hull_white::HullWhite;
    pub use crate::lattice::{ShortRateTree, TimeGrid};
    pub use crate::parameter::{Parameter, ParameterKind};
    pub use crate::vasicek::Vasicek;
}

pub use calibrated::{Calibratable, CalibratedModel, CalibrationReport};
pub use error::{ModelError, ModelResult};
pub use hull_white::HullWhite;
pub use vasicek::Vasicek;
