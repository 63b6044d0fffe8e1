//! Calibrated models.
//!
//! A calibrated model owns an ordered list of [`Parameter`]s. Their
//! coefficients, concatenated, form the vector an optimizer searches, under
//! the [`ParameterConstraint`] built from the parameters' own constraints.
//!
//! # Calibration
//!
//! [`Calibratable::calibrate`] writes each candidate vector into the model,
//! regenerates derived arguments and asks every helper for its error. The
//! optimizer minimizes the weighted sum of squared errors. The best vector
//! is then committed and observers are notified exactly once. Candidate
//! writes never notify.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use arbor_core::observer::{Notifier, Observable, Observer};
use arbor_math::optimization::{
    CompositeConstraint, Constraint, CostFunction, EndCriteria, EndCriteriaType,
    OptimizationMethod, OptimizationResult, Problem,
};
use arbor_math::{MathError, MathResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constraint::ParameterConstraint;
use crate::error::{ModelError, ModelResult};
use crate::helpers::CalibrationHelper;
use crate::parameter::{FittingFunction, Parameter};

/// Parameter state shared by every calibrated model.
///
/// Holds the parameters, the model's observable and the termination
/// reason of the last calibration. Models embed one and expose it through
/// [`Calibratable::calibrated_model`].
pub struct CalibratedModel {
    arguments: RefCell<Vec<Parameter>>,
    observable: Observable,
    end_criteria: Cell<EndCriteriaType>,
}

impl CalibratedModel {
    /// Creates the state from the model's parameters, in declaration order.
    pub fn new(arguments: Vec<Parameter>) -> Self {
        Self {
            arguments: RefCell::new(arguments),
            observable: Observable::new(),
            end_criteria: Cell::new(EndCriteriaType::None),
        }
    }

    /// Returns the parameters.
    pub fn arguments(&self) -> Ref<'_, [Parameter]> {
        Ref::map(self.arguments.borrow(), Vec::as_slice)
    }

    /// Returns the value of parameter `index` at time `t`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown index or an unfitted fitting parameter.
    pub fn value(&self, index: usize, t: f64) -> ModelResult<f64> {
        let arguments = self.arguments.borrow();
        let parameter = arguments.get(index).ok_or_else(|| {
            ModelError::invalid_input(format!("model has no parameter {index}"))
        })?;
        parameter.value(t)
    }

    /// Returns the first coefficient of parameter `index`, or zero if it
    /// has none.
    pub fn scalar(&self, index: usize) -> f64 {
        self.arguments
            .borrow()
            .get(index)
            .and_then(|p| p.params().first().copied())
            .unwrap_or_default()
    }

    /// Returns the number of free coefficients.
    pub fn size(&self) -> usize {
        self.arguments.borrow().iter().map(Parameter::size).sum()
    }

    /// Returns a snapshot of the concatenated coefficients.
    pub fn params(&self) -> Vec<f64> {
        self.arguments
            .borrow()
            .iter()
            .flat_map(|p| p.params().iter().copied())
            .collect()
    }

    /// Writes `params` back into the parameters, slice by slice.
    ///
    /// Does not notify observers.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ParameterCount` if the length differs from
    /// [`size`](Self::size); nothing is written in that case.
    pub fn set_params(&self, params: &[f64]) -> ModelResult<()> {
        let expected = self.size();
        if params.len() != expected {
            return Err(ModelError::parameter_count(expected, params.len()));
        }
        let mut start = 0;
        for parameter in self.arguments.borrow_mut().iter_mut() {
            let end = start + parameter.size();
            parameter.set_params(&params[start..end])?;
            start = end;
        }
        Ok(())
    }

    /// Returns the constraint over the concatenated coefficients.
    pub fn constraint(&self) -> ParameterConstraint {
        ParameterConstraint::new(&self.arguments.borrow())
    }

    /// Installs or clears the function behind fitting parameter `index`.
    pub fn set_fitting(&self, index: usize, function: Option<FittingFunction>) -> ModelResult<()> {
        let mut arguments = self.arguments.borrow_mut();
        let parameter = arguments.get_mut(index).ok_or_else(|| {
            ModelError::invalid_input(format!("model has no parameter {index}"))
        })?;
        parameter.set_fitting(function)
    }

    /// Returns why the last calibration stopped.
    pub fn end_criteria(&self) -> EndCriteriaType {
        self.end_criteria.get()
    }

    fn record_end_criteria(&self, end_criteria: EndCriteriaType) {
        self.end_criteria.set(end_criteria);
    }

    /// Returns the model's observable.
    pub fn observable(&self) -> &Observable {
        &self.observable
    }
}

impl fmt::Debug for CalibratedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalibratedModel")
            .field("arguments", &*self.arguments.borrow())
            .field("end_criteria", &self.end_criteria.get())
            .finish()
    }
}

/// Summary of a finished calibration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Why the optimizer stopped.
    pub end_criteria: EndCriteriaType,
    /// The committed parameter vector.
    pub parameters: Vec<f64>,
    /// Weighted sum of squared errors at `parameters`.
    pub objective_value: f64,
    /// Optimizer iterations.
    pub iterations: usize,
    /// Cost function evaluations.
    pub function_evaluations: usize,
    /// Each helper's error at `parameters`, unweighted.
    pub errors: Vec<f64>,
    /// Root mean square of `errors`.
    pub rms_error: f64,
    /// Largest absolute value in `errors`.
    pub max_error: f64,
}

impl CalibrationReport {
    fn new(result: OptimizationResult, errors: Vec<f64>) -> Self {
        let rms_error = if errors.is_empty() {
            0.0
        } else {
            (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt()
        };
        let max_error = errors.iter().fold(0.0_f64, |acc, e| acc.max(e.abs()));
        Self {
            end_criteria: result.end_criteria,
            parameters: result.parameters,
            objective_value: result.objective_value,
            iterations: result.iterations,
            function_evaluations: result.function_evaluations,
            errors,
            rms_error,
            max_error,
        }
    }

    /// Returns true if the optimizer converged.
    pub fn converged(&self) -> bool {
        self.end_criteria.succeeded()
    }
}

/// A model whose parameters can be fitted to market instruments.
///
/// # Required Methods
///
/// - [`calibrated_model`](Calibratable::calibrated_model)
///
/// Models that derive quantities from their parameters (such as a fitted
/// drift) override [`generate_arguments`](Calibratable::generate_arguments).
/// Their [`Observer::update`] must call it and then notify their own
/// observers once.
pub trait Calibratable: Observer + Notifier {
    /// Returns the parameter state.
    fn calibrated_model(&self) -> &CalibratedModel;

    /// Recomputes quantities derived from the parameters. Never notifies.
    fn generate_arguments(&self) {}

    /// Returns a snapshot of the parameter vector.
    fn params(&self) -> Vec<f64> {
        self.calibrated_model().params()
    }

    /// Writes the parameter vector without notifying.
    ///
    /// Derived arguments are not regenerated; call
    /// [`generate_arguments`](Calibratable::generate_arguments) or
    /// [`Observer::update`] afterwards.
    fn set_params(&self, params: &[f64]) -> ModelResult<()> {
        self.calibrated_model().set_params(params)
    }

    /// Returns the constraint over the parameter vector.
    fn constraint(&self) -> ParameterConstraint {
        self.calibrated_model().constraint()
    }

    /// Returns why the last calibration stopped.
    fn end_criteria(&self) -> EndCriteriaType {
        self.calibrated_model().end_criteria()
    }

    /// Fits the parameters to `helpers`.
    ///
    /// Minimizes `sum(w_i * err_i^2)` with `method`, starting from the
    /// current parameters, under the model's constraint and
    /// `extra_constraint`. Empty `weights` mean a weight of 1 for every
    /// helper.
    ///
    /// On success the best vector is committed, derived arguments are
    /// regenerated and observers are notified once. Running out of
    /// iterations is reported in the result, not as an error.
    ///
    /// # Errors
    ///
    /// - `ModelError::InvalidInput` for no helpers, or weights that are
    ///   negative or do not match the helpers
    /// - the helper's own error if a helper fails while pricing
    /// - `ModelError::Math` if the optimizer fails
    ///
    /// On error the parameters are left as they were and nobody is
    /// notified.
    fn calibrate(
        &self,
        helpers: &[Rc<dyn CalibrationHelper>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        extra_constraint: Option<&dyn Constraint>,
        weights: &[f64],
    ) -> ModelResult<CalibrationReport> {
        if helpers.is_empty() {
            return Err(ModelError::invalid_input("no calibration helpers"));
        }
        let weights = resolve_weights(weights, helpers.len())?;

        let own = self.constraint();
        let composite;
        let constraint: &dyn Constraint = match extra_constraint {
            Some(extra) => {
                composite = CompositeConstraint::new(&own, extra);
                &composite
            }
            None => &own,
        };

        let original = self.params();
        let function = CalibrationFunction::new(self, helpers, &weights);
        let problem = Problem::new(&function, constraint, original.clone());
        debug!(
            method = method.name(),
            helpers = helpers.len(),
            parameters = original.len(),
            "starting calibration"
        );

        let result = match method.minimize(&problem, end_criteria) {
            Ok(result) => result,
            Err(error) => {
                self.set_params(&original)?;
                self.generate_arguments();
                warn!(method = method.name(), error = %error, "calibration failed");
                return Err(function
                    .take_failure()
                    .unwrap_or(ModelError::Math(error)));
            }
        };

        self.set_params(&result.parameters)?;
        self.calibrated_model().record_end_criteria(result.end_criteria);
        self.update();

        if result.converged() {
            info!(
                method = method.name(),
                end_criteria = %result.end_criteria,
                iterations = result.iterations,
                objective = result.objective_value,
                "calibration complete"
            );
        } else {
            warn!(
                method = method.name(),
                end_criteria = %result.end_criteria,
                iterations = result.iterations,
                objective = result.objective_value,
                "calibration stopped without converging"
            );
        }

        let errors = helpers
            .iter()
            .map(|helper| helper.calibration_error())
            .collect::<ModelResult<Vec<f64>>>()?;
        Ok(CalibrationReport::new(result, errors))
    }
}

fn resolve_weights(weights: &[f64], helpers: usize) -> ModelResult<Vec<f64>> {
    if weights.is_empty() {
        return Ok(vec![1.0; helpers]);
    }
    if weights.len() != helpers {
        return Err(ModelError::invalid_input(format!(
            "{} weights for {helpers} helpers",
            weights.len()
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ModelError::invalid_input(format!(
            "weights must be finite and non-negative, got {bad}"
        )));
    }
    Ok(weights.to_vec())
}

/// The least-squares cost of a calibration.
///
/// Each residual is `sqrt(w_i) * err_i`, so the cost is
/// `sum(w_i * err_i^2)`. Evaluating a candidate writes it into the model
/// and regenerates the model's derived arguments. A helper failure aborts
/// the optimizer; the original error is kept and can be recovered with
/// [`take_failure`](Self::take_failure).
pub struct CalibrationFunction<'a, M: Calibratable + ?Sized> {
    model: &'a M,
    helpers: &'a [Rc<dyn CalibrationHelper>],
    scales: Vec<f64>,
    failure: RefCell<Option<ModelError>>,
}

impl<'a, M: Calibratable + ?Sized> CalibrationFunction<'a, M> {
    /// Creates the cost of fitting `model` to `helpers` with `weights`.
    pub fn new(model: &'a M, helpers: &'a [Rc<dyn CalibrationHelper>], weights: &[f64]) -> Self {
        Self {
            model,
            helpers,
            scales: weights.iter().map(|w| w.sqrt()).collect(),
            failure: RefCell::new(None),
        }
    }

    /// Returns the model error that stopped the last evaluation, if any.
    pub fn take_failure(&self) -> Option<ModelError> {
        self.failure.borrow_mut().take()
    }

    fn fail(&self, error: ModelError) -> MathError {
        let reported = MathError::cost_evaluation(error.to_string());
        *self.failure.borrow_mut() = Some(error);
        reported
    }
}

impl<M: Calibratable + ?Sized> CostFunction for CalibrationFunction<'_, M> {
    fn values(&self, x: &[f64]) -> MathResult<Vec<f64>> {
        self.model.set_params(x).map_err(|e| self.fail(e))?;
        self.model.generate_arguments();
        self.helpers
            .iter()
            .zip(&self.scales)
            .map(|(helper, scale)| {
                helper
                    .calibration_error()
                    .map(|error| scale * error)
                    .map_err(|e| self.fail(e))
            })
            .collect()
    }
}

impl<M: Calibratable + ?Sized> fmt::Debug for CalibrationFunction<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalibrationFunction")
            .field("helpers", &self.helpers.len())
            .field("scales", &self.scales)
            .finish_non_exhaustive()
    }
}
