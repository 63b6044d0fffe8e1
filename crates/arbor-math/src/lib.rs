//! # Arbor Math
//!
//! Numerical utilities for the Arbor calibration library.
//!
//! - **Optimization**: constraints, cost functions, end criteria and the
//!   Levenberg-Marquardt, Nelder-Mead simplex and steepest descent methods
//! - **Linear Algebra**: dense solves used by the optimizers
//! - **Distributions**: standard normal helpers for closed-form pricing

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
#![allow(clippy::too_many_lines)]
#![allow(clippy::float_cmp)]

pub mod distributions;
pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::distributions::{normal_cdf, normal_pdf};
    pub use crate::error::{MathError, MathResult};
    pub use crate::optimization::{
        BoundaryConstraint, CompositeConstraint, Constraint, CostFunction, EndCriteria,
        EndCriteriaType, LevenbergMarquardt, NoConstraint, OptimizationMethod,
        OptimizationResult, PositiveConstraint, Problem, ResidualFn, Simplex, SteepestDescent,
    };
}

pub use error::{MathError, MathResult};
