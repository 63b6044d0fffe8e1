//! Feasibility constraints on parameter vectors.

use crate::error::{MathError, MathResult};

/// Maximum number of step halvings in [`Constraint::update`].
const MAX_UPDATE_HALVINGS: u32 = 200;

/// A feasibility predicate over a real vector.
///
/// `test` must be pure. Optimizers only evaluate cost functions at points
/// for which it returns true.
pub trait Constraint {
    /// Returns true if `params` is feasible.
    fn test(&self, params: &[f64]) -> bool;

    /// Returns the componentwise upper bound at `params`.
    fn upper_bound(&self, params: &[f64]) -> Vec<f64> {
        vec![f64::MAX; params.len()]
    }

    /// Returns the componentwise lower bound at `params`.
    fn lower_bound(&self, params: &[f64]) -> Vec<f64> {
        vec![-f64::MAX; params.len()]
    }

    /// Moves `params` by `beta * direction`, halving `beta` until the result
    /// is feasible. Returns the step factor actually applied.
    ///
    /// # Errors
    ///
    /// Returns `MathError::NoFeasibleStep` if no feasible step is found, in
    /// which case `params` is left unchanged.
    fn update(&self, params: &mut [f64], direction: &[f64], beta: f64) -> MathResult<f64> {
        let mut factor = beta;
        let step = |factor: f64| -> Vec<f64> {
            params
                .iter()
                .zip(direction)
                .map(|(p, d)| p + factor * d)
                .collect()
        };

        let mut candidate = step(factor);
        let mut attempts = 0;
        while !self.test(&candidate) {
            if attempts >= MAX_UPDATE_HALVINGS {
                return Err(MathError::NoFeasibleStep { attempts });
            }
            factor *= 0.5;
            attempts += 1;
            candidate = step(factor);
        }

        params.copy_from_slice(&candidate);
        Ok(factor)
    }
}

/// Accepts every vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _params: &[f64]) -> bool {
        true
    }
}

/// Requires every component to be strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, params: &[f64]) -> bool {
        params.iter().all(|&p| p > 0.0)
    }

    fn lower_bound(&self, params: &[f64]) -> Vec<f64> {
        vec![0.0; params.len()]
    }
}

/// Requires every component to lie in `[low, high]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    low: f64,
    high: f64,
}

impl BoundaryConstraint {
    /// Creates a boundary constraint.
    ///
    /// # Errors
    ///
    /// Returns `MathError::InvalidInput` if `low > high` or either bound is NaN.
    pub fn new(low: f64, high: f64) -> MathResult<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(MathError::invalid_input(format!(
                "invalid boundary [{low}, {high}]"
            )));
        }
        Ok(Self { low, high })
    }

    /// Returns the lower boundary.
    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Returns the upper boundary.
    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, params: &[f64]) -> bool {
        params.iter().all(|&p| p >= self.low && p <= self.high)
    }

    fn upper_bound(&self, params: &[f64]) -> Vec<f64> {
        vec![self.high; params.len()]
    }

    fn lower_bound(&self, params: &[f64]) -> Vec<f64> {
        vec![self.low; params.len()]
    }
}

/// The conjunction of several constraints over the same vector.
///
/// Bounds are the tightest of the parts.
#[derive(Default)]
pub struct CompositeConstraint<'a> {
    parts: Vec<&'a dyn Constraint>,
}

impl<'a> CompositeConstraint<'a> {
    /// Creates the conjunction of two constraints.
    #[must_use]
    pub fn new(first: &'a dyn Constraint, second: &'a dyn Constraint) -> Self {
        Self {
            parts: vec![first, second],
        }
    }

    /// Adds another constraint to the conjunction.
    #[must_use]
    pub fn and(mut self, other: &'a dyn Constraint) -> Self {
        self.parts.push(other);
        self
    }
}

impl Constraint for CompositeConstraint<'_> {
    fn test(&self, params: &[f64]) -> bool {
        self.parts.iter().all(|c| c.test(params))
    }

    fn upper_bound(&self, params: &[f64]) -> Vec<f64> {
        self.parts.iter().fold(vec![f64::MAX; params.len()], |acc, c| {
            acc.iter()
                .zip(c.upper_bound(params))
                .map(|(a, b)| a.min(b))
                .collect()
        })
    }

    fn lower_bound(&self, params: &[f64]) -> Vec<f64> {
        self.parts.iter().fold(vec![-f64::MAX; params.len()], |acc, c| {
            acc.iter()
                .zip(c.lower_bound(params))
                .map(|(a, b)| a.max(b))
                .collect()
        })
    }
}

impl std::fmt::Debug for CompositeConstraint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConstraint")
            .field("parts", &self.parts.len())
            .finish()
    }
}
