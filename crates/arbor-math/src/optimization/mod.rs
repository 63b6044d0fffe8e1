//! Constrained optimization.
//!
//! An optimizer receives a [`Problem`] (cost function, constraint, starting
//! point) and [`EndCriteria`], and returns the best point it found together
//! with the reason it stopped. Running out of iterations is a normal
//! outcome reported through [`EndCriteriaType`], not an error.
//!
//! Every method rejects an infeasible starting point with
//! `MathError::InfeasibleStart` and evaluates the cost only at feasible
//! points.
//!
//! # Example
//!
//! ```rust
//! use arbor_math::optimization::*;
//!
//! let cost = ResidualFn::new(|x: &[f64]| vec![x[0] - 2.0, x[1] - 3.0]);
//! let problem = Problem::new(&cost, &NoConstraint, vec![0.0, 0.0]);
//! let result = LevenbergMarquardt::default()
//!     .minimize(&problem, &EndCriteria::default())
//!     .unwrap();
//!
//! assert!(result.converged());
//! assert!((result.parameters[0] - 2.0).abs() < 1e-6);
//! ```

mod constraint;
mod cost_function;
mod end_criteria;
mod levenberg_marquardt;
mod problem;
mod simplex;
mod steepest_descent;

pub use constraint::{
    BoundaryConstraint, CompositeConstraint, Constraint, NoConstraint, PositiveConstraint,
};
pub use cost_function::{CostFunction, ResidualFn, DEFAULT_GRADIENT_STEP};
pub use end_criteria::{EndCriteria, EndCriteriaType};
pub use levenberg_marquardt::LevenbergMarquardt;
pub use problem::Problem;
pub use simplex::Simplex;
pub use steepest_descent::SteepestDescent;

use crate::error::MathResult;

/// Result of an optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best point found.
    pub parameters: Vec<f64>,
    /// Cost at `parameters`.
    pub objective_value: f64,
    /// Number of iterations used.
    pub iterations: usize,
    /// Number of cost evaluations used.
    pub function_evaluations: usize,
    /// Why the optimizer stopped.
    pub end_criteria: EndCriteriaType,
}

impl OptimizationResult {
    /// Returns true if the termination indicates convergence.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.end_criteria.succeeded()
    }
}

/// A minimization algorithm.
pub trait OptimizationMethod {
    /// Returns the method's name.
    fn name(&self) -> &'static str;

    /// Minimizes `problem` starting from its initial point.
    ///
    /// # Errors
    ///
    /// Fails if the starting point is infeasible or the cost function fails.
    fn minimize(
        &self,
        problem: &Problem<'_>,
        end_criteria: &EndCriteria,
    ) -> MathResult<OptimizationResult>;
}

/// Euclidean norm.
pub(crate) fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// The feasible finite-difference stencil along one coordinate.
pub(crate) enum Bump {
    /// Both `x + h` and `x - h` are feasible.
    Central { up: Vec<f64>, down: Vec<f64>, h: f64 },
    /// Only `x + h` is feasible.
    Forward { up: Vec<f64>, h: f64 },
    /// Only `x - h` is feasible.
    Backward { down: Vec<f64>, h: f64 },
    /// Neither bump is feasible.
    Stuck,
}

/// Chooses a finite-difference stencil for coordinate `j` that only
/// touches feasible points. The step is relative for large coordinates.
pub(crate) fn feasible_bump(constraint: &dyn Constraint, x: &[f64], j: usize, step: f64) -> Bump {
    let h = step * x[j].abs().max(1.0);
    let mut up = x.to_vec();
    up[j] += h;
    let mut down = x.to_vec();
    down[j] -= h;

    match (constraint.test(&up), constraint.test(&down)) {
        (true, true) => Bump::Central { up, down, h },
        (true, false) => Bump::Forward { up, h },
        (false, true) => Bump::Backward { down, h },
        (false, false) => Bump::Stuck,
    }
}
