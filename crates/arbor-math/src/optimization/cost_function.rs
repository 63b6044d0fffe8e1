//! Cost functions minimized by the optimizers.

use crate::error::MathResult;

/// Default step for finite-difference gradients.
pub const DEFAULT_GRADIENT_STEP: f64 = 1e-8;

/// A function to be minimized.
///
/// Least-squares problems implement [`values`](CostFunction::values) as the
/// residual vector; the default [`value`](CostFunction::value) is then the
/// sum of squared residuals.
pub trait CostFunction {
    /// Returns the residual vector at `x`.
    fn values(&self, x: &[f64]) -> MathResult<Vec<f64>>;

    /// Returns the scalar cost at `x`.
    fn value(&self, x: &[f64]) -> MathResult<f64> {
        Ok(self.values(x)?.iter().map(|r| r * r).sum())
    }
}

/// Adapts a residual closure into a [`CostFunction`].
///
/// ```rust
/// use arbor_math::optimization::{CostFunction, ResidualFn};
///
/// let cost = ResidualFn::new(|x: &[f64]| vec![x[0] - 1.0, 2.0 * (x[1] + 0.5)]);
/// assert_eq!(cost.value(&[1.0, -0.5]).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ResidualFn<F> {
    f: F,
}

impl<F> ResidualFn<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    /// Wraps a residual closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> CostFunction for ResidualFn<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn values(&self, x: &[f64]) -> MathResult<Vec<f64>> {
        Ok((self.f)(x))
    }
}
