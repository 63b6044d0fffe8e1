//! A constrained minimization problem.

use std::cell::Cell;

use super::{Constraint, CostFunction};
use crate::error::{MathError, MathResult};

/// A cost function, its domain constraint and a starting point.
///
/// Counts cost evaluations so optimizers can report them.
pub struct Problem<'a> {
    cost: &'a dyn CostFunction,
    constraint: &'a dyn Constraint,
    initial: Vec<f64>,
    evaluations: Cell<usize>,
}

impl<'a> Problem<'a> {
    /// Creates a problem.
    pub fn new(
        cost: &'a dyn CostFunction,
        constraint: &'a dyn Constraint,
        initial: Vec<f64>,
    ) -> Self {
        Self {
            cost,
            constraint,
            initial,
            evaluations: Cell::new(0),
        }
    }

    /// Returns the starting point.
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    /// Returns the domain constraint.
    pub fn constraint(&self) -> &dyn Constraint {
        self.constraint
    }

    /// Fails with `MathError::InfeasibleStart` unless the starting point is
    /// feasible.
    pub fn check_initial(&self) -> MathResult<()> {
        if self.constraint.test(&self.initial) {
            Ok(())
        } else {
            Err(MathError::infeasible_start(&self.initial))
        }
    }

    /// Evaluates the scalar cost.
    pub fn value(&self, x: &[f64]) -> MathResult<f64> {
        self.evaluations.set(self.evaluations.get() + 1);
        self.cost.value(x)
    }

    /// Evaluates the residual vector.
    pub fn values(&self, x: &[f64]) -> MathResult<Vec<f64>> {
        self.evaluations.set(self.evaluations.get() + 1);
        self.cost.values(x)
    }

    /// Returns the number of cost evaluations so far.
    pub fn function_evaluations(&self) -> usize {
        self.evaluations.get()
    }
}

impl std::fmt::Debug for Problem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("initial", &self.initial)
            .field("evaluations", &self.evaluations.get())
            .finish()
    }
}
