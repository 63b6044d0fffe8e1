//! The constraint of a whole parameter vector.

use std::fmt;
use std::rc::Rc;

use arbor_math::optimization::Constraint;

use crate::parameter::Parameter;

/// Joins the constraints of a model's parameters into one constraint over
/// the concatenated vector.
///
/// The vector is sliced by the parameter sizes, in declaration order, and
/// each slice is tested against its own parameter's constraint. There are
/// no terms across parameters.
#[derive(Clone)]
pub struct ParameterConstraint {
    parts: Vec<(usize, Rc<dyn Constraint>)>,
}

impl ParameterConstraint {
    /// Builds the joint constraint of `arguments`.
    pub fn new(arguments: &[Parameter]) -> Self {
        Self {
            parts: arguments
                .iter()
                .map(|p| (p.size(), p.constraint()))
                .collect(),
        }
    }

    /// Returns the expected vector length.
    pub fn size(&self) -> usize {
        self.parts.iter().map(|(size, _)| size).sum()
    }

    /// Calls `f` on each parameter's slice of `params`.
    ///
    /// # Panics
    ///
    /// Panics if `params.len()` differs from [`size`](Self::size).
    fn for_each_slice<'v>(&self, params: &'v [f64], mut f: impl FnMut(&'v [f64], &dyn Constraint)) {
        assert_eq!(
            params.len(),
            self.size(),
            "parameter vector has length {} but the parameters declare {}",
            params.len(),
            self.size()
        );
        let mut start = 0;
        for (size, constraint) in &self.parts {
            f(&params[start..start + size], constraint.as_ref());
            start += size;
        }
    }
}

impl Constraint for ParameterConstraint {
    /// # Panics
    ///
    /// Panics if the vector length differs from the sum of the parameter
    /// sizes.
    fn test(&self, params: &[f64]) -> bool {
        let mut feasible = true;
        self.for_each_slice(params, |slice, constraint| {
            feasible = feasible && constraint.test(slice);
        });
        feasible
    }

    fn upper_bound(&self, params: &[f64]) -> Vec<f64> {
        let mut bound = Vec::with_capacity(params.len());
        self.for_each_slice(params, |slice, constraint| {
            bound.extend(constraint.upper_bound(slice));
        });
        bound
    }

    fn lower_bound(&self, params: &[f64]) -> Vec<f64> {
        let mut bound = Vec::with_capacity(params.len());
        self.for_each_slice(params, |slice, constraint| {
            bound.extend(constraint.lower_bound(slice));
        });
        bound
    }
}

impl fmt::Debug for ParameterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes: Vec<usize> = self.parts.iter().map(|(size, _)| *size).collect();
        f.debug_struct("ParameterConstraint")
            .field("sizes", &sizes)
            .finish()
    }
}
