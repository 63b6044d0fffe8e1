//! Model parameters.
//!
//! A [`Parameter`] is one segment of a model's parameter vector: a fixed
//! number of raw coefficients, a rule turning them into a value at time
//! `t`, and a feasibility constraint on the coefficients. Models hold an
//! ordered list of parameters whose coefficients, concatenated, form the
//! vector an optimizer works on.

use std::fmt;
use std::rc::Rc;

use arbor_math::optimization::{Constraint, NoConstraint};

use crate::error::{ModelError, ModelResult};

/// A time function supplied by a model for a term-structure fitting
/// parameter.
pub type FittingFunction = Rc<dyn Fn(f64) -> ModelResult<f64>>;

/// How a parameter's coefficients turn into values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// One coefficient, constant in time.
    Constant,
    /// No coefficients; the value is zero.
    Null,
    /// One coefficient per interval between step times.
    PiecewiseConstant,
    /// No coefficients; the value comes from the owning model.
    TermStructureFitting,
}

#[derive(Clone)]
enum Shape {
    Constant,
    Null,
    PiecewiseConstant { times: Vec<f64> },
    Fitting(Option<FittingFunction>),
}

/// One segment of a model's parameter vector.
///
/// The number of coefficients is fixed at construction. Only
/// [`set_params`](Parameter::set_params) changes them, and it never
/// resizes.
#[derive(Clone)]
pub struct Parameter {
    shape: Shape,
    params: Vec<f64>,
    constraint: Rc<dyn Constraint>,
}

impl Parameter {
    /// Creates a constant parameter.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` if `value` violates `constraint`.
    pub fn constant(value: f64, constraint: impl Constraint + 'static) -> ModelResult<Self> {
        Self::build(Shape::Constant, vec![value], Rc::new(constraint))
    }

    /// Creates a parameter with no coefficients and value zero.
    pub fn null() -> Self {
        Self {
            shape: Shape::Null,
            params: Vec::new(),
            constraint: Rc::new(NoConstraint),
        }
    }

    /// Creates a piecewise-constant parameter.
    ///
    /// `values[i]` applies before `times[i]`; the last value applies from
    /// the last time onwards, so `values` has one more element than
    /// `times`.
    ///
    /// # Errors
    ///
    /// Fails if the lengths disagree, the times are not strictly increasing
    /// and positive, or the values violate `constraint`.
    pub fn piecewise_constant(
        times: Vec<f64>,
        values: Vec<f64>,
        constraint: impl Constraint + 'static,
    ) -> ModelResult<Self> {
        if values.len() != times.len() + 1 {
            return Err(ModelError::invalid_input(format!(
                "{} step times need {} values, got {}",
                times.len(),
                times.len() + 1,
                values.len()
            )));
        }
        let increasing = times.first().map_or(true, |&t| t > 0.0)
            && times.windows(2).all(|pair| pair[1] > pair[0]);
        if !increasing {
            return Err(ModelError::invalid_input(
                "step times must be positive and strictly increasing",
            ));
        }
        Self::build(Shape::PiecewiseConstant { times }, values, Rc::new(constraint))
    }

    /// Creates a fitting parameter with no coefficients. Its value is
    /// supplied by the owning model through
    /// [`set_fitting`](Parameter::set_fitting).
    pub fn term_structure_fitting() -> Self {
        Self {
            shape: Shape::Fitting(None),
            params: Vec::new(),
            constraint: Rc::new(NoConstraint),
        }
    }

    fn build(shape: Shape, params: Vec<f64>, constraint: Rc<dyn Constraint>) -> ModelResult<Self> {
        if !constraint.test(&params) {
            return Err(ModelError::invalid_input(format!(
                "parameter values {params:?} violate their constraint"
            )));
        }
        Ok(Self {
            shape,
            params,
            constraint,
        })
    }

    /// Returns the kind of parameter.
    pub fn kind(&self) -> ParameterKind {
        match self.shape {
            Shape::Constant => ParameterKind::Constant,
            Shape::Null => ParameterKind::Null,
            Shape::PiecewiseConstant { .. } => ParameterKind::PiecewiseConstant,
            Shape::Fitting(_) => ParameterKind::TermStructureFitting,
        }
    }

    /// Returns the number of coefficients.
    pub fn size(&self) -> usize {
        self.params.len()
    }

    /// Returns the coefficients.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Overwrites the coefficients.
    ///
    /// Feasibility is not checked here; callers test the whole vector
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ParameterCount` if the length differs from
    /// [`size`](Parameter::size). Nothing is written in that case.
    pub fn set_params(&mut self, params: &[f64]) -> ModelResult<()> {
        if params.len() != self.params.len() {
            return Err(ModelError::parameter_count(self.params.len(), params.len()));
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    /// Applies this parameter's feasibility rule to `params`.
    pub fn test_params(&self, params: &[f64]) -> bool {
        self.constraint.test(params)
    }

    /// Returns the constraint on the coefficients.
    pub fn constraint(&self) -> Rc<dyn Constraint> {
        Rc::clone(&self.constraint)
    }

    /// Installs or clears the function behind a fitting parameter.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` for any other kind of parameter.
    pub fn set_fitting(&mut self, function: Option<FittingFunction>) -> ModelResult<()> {
        match &mut self.shape {
            Shape::Fitting(slot) => {
                *slot = function;
                Ok(())
            }
            _ => Err(ModelError::invalid_input(format!(
                "{:?} parameter has no fitting function",
                self.kind()
            ))),
        }
    }

    /// Returns the value at time `t`.
    ///
    /// # Errors
    ///
    /// A fitting parameter whose owner has not supplied a function returns
    /// `ModelError::Unfitted`; a supplied function may fail too.
    pub fn value(&self, t: f64) -> ModelResult<f64> {
        match &self.shape {
            Shape::Constant => Ok(self.params.first().copied().unwrap_or_default()),
            Shape::Null => Ok(0.0),
            Shape::PiecewiseConstant { times } => {
                let i = times.partition_point(|&s| s <= t);
                Ok(self.params.get(i).copied().unwrap_or_default())
            }
            Shape::Fitting(Some(function)) => function(t),
            Shape::Fitting(None) => Err(ModelError::Unfitted {
                reason: "term structure not available".to_string(),
            }),
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Parameter");
        s.field("kind", &self.kind()).field("params", &self.params);
        match &self.shape {
            Shape::PiecewiseConstant { times } => {
                s.field("times", times);
            }
            Shape::Fitting(function) => {
                s.field("fitted", &function.is_some());
            }
            Shape::Constant | Shape::Null => {}
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_math::optimization::{BoundaryConstraint, PositiveConstraint};

    #[test]
    fn test_constant() {
        let p = Parameter::constant(0.1, PositiveConstraint).unwrap();
        assert_eq!(p.kind(), ParameterKind::Constant);
        assert_eq!(p.size(), 1);
        assert_eq!(p.value(0.0).unwrap(), 0.1);
        assert_eq!(p.value(30.0).unwrap(), 0.1);
        assert!(p.test_params(&[0.2]));
        assert!(!p.test_params(&[-0.2]));
    }

    #[test]
    fn test_constant_rejects_infeasible_value() {
        assert!(Parameter::constant(-0.1, PositiveConstraint).is_err());
    }

    #[test]
    fn test_null_and_fitting_have_no_coefficients() {
        let null = Parameter::null();
        assert_eq!(null.size(), 0);
        assert_eq!(null.value(5.0).unwrap(), 0.0);

        let mut fitting = Parameter::term_structure_fitting();
        assert_eq!(fitting.size(), 0);
        assert!(matches!(fitting.value(1.0), Err(ModelError::Unfitted { .. })));

        fitting
            .set_fitting(Some(Rc::new(|t: f64| Ok(0.01 * t))))
            .unwrap();
        assert_eq!(fitting.value(2.0).unwrap(), 0.02);

        fitting.set_fitting(None).unwrap();
        assert!(fitting.value(1.0).is_err());
        assert!(null.clone().set_fitting(None).is_err());
    }

    #[test]
    fn test_piecewise_constant() {
        let p = Parameter::piecewise_constant(
            vec![1.0, 2.0],
            vec![0.01, 0.02, 0.03],
            BoundaryConstraint::new(0.0, 1.0).unwrap(),
        )
        .unwrap();
        assert_eq!(p.size(), 3);
        assert_eq!(p.value(0.5).unwrap(), 0.01);
        assert_eq!(p.value(1.0).unwrap(), 0.02);
        assert_eq!(p.value(1.5).unwrap(), 0.02);
        assert_eq!(p.value(7.0).unwrap(), 0.03);

        assert!(Parameter::piecewise_constant(vec![1.0], vec![0.01], NoConstraint).is_err());
        assert!(
            Parameter::piecewise_constant(vec![2.0, 1.0], vec![0.0; 3], NoConstraint).is_err()
        );
    }

    #[test]
    fn test_set_params_never_resizes() {
        let mut p = Parameter::constant(0.1, NoConstraint).unwrap();
        assert_eq!(
            p.set_params(&[0.1, 0.2]),
            Err(ModelError::parameter_count(1, 2))
        );
        assert_eq!(p.params(), &[0.1]);

        p.set_params(&[0.3]).unwrap();
        assert_eq!(p.value(0.0).unwrap(), 0.3);
    }
}
