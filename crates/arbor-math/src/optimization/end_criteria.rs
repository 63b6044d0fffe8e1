//! Termination rules for optimizers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndCriteriaType {
    /// No optimization has run.
    #[default]
    None,
    /// The iteration limit was reached.
    MaxIterations,
    /// The point stopped moving.
    StationaryPoint,
    /// The function value stopped changing.
    StationaryFunctionValue,
    /// The function value fell below the target accuracy.
    StationaryFunctionAccuracy,
    /// The gradient vanished.
    ZeroGradientNorm,
    /// The optimizer stopped for another reason.
    Unknown,
}

impl EndCriteriaType {
    /// Returns true for the terminations that indicate convergence.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            EndCriteriaType::StationaryPoint
                | EndCriteriaType::StationaryFunctionValue
                | EndCriteriaType::StationaryFunctionAccuracy
                | EndCriteriaType::ZeroGradientNorm
        )
    }
}

impl fmt::Display for EndCriteriaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndCriteriaType::None => "None",
            EndCriteriaType::MaxIterations => "MaxIterations",
            EndCriteriaType::StationaryPoint => "StationaryPoint",
            EndCriteriaType::StationaryFunctionValue => "StationaryFunctionValue",
            EndCriteriaType::StationaryFunctionAccuracy => "StationaryFunctionAccuracy",
            EndCriteriaType::ZeroGradientNorm => "ZeroGradientNorm",
            EndCriteriaType::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}

fn default_max_iterations() -> usize {
    1000
}

fn default_max_stationary_state_iterations() -> usize {
    100
}

fn default_epsilon() -> f64 {
    1e-8
}

/// Iteration and tolerance limits for an optimization.
///
/// Each `check_*` method returns the termination reason when its criterion
/// is met.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Number of consecutive stationary iterations tolerated before stopping.
    #[serde(default = "default_max_stationary_state_iterations")]
    pub max_stationary_state_iterations: usize,
    /// Tolerance on the change of the point.
    #[serde(default = "default_epsilon")]
    pub root_epsilon: f64,
    /// Tolerance on the function value or its change.
    #[serde(default = "default_epsilon")]
    pub function_epsilon: f64,
    /// Tolerance on the gradient norm.
    #[serde(default = "default_epsilon")]
    pub gradient_norm_epsilon: f64,
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_stationary_state_iterations: default_max_stationary_state_iterations(),
            root_epsilon: default_epsilon(),
            function_epsilon: default_epsilon(),
            gradient_norm_epsilon: default_epsilon(),
        }
    }
}

impl EndCriteria {
    /// Creates end criteria.
    #[must_use]
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: f64,
        function_epsilon: f64,
        gradient_norm_epsilon: f64,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
        }
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stops once `iteration` reaches the limit.
    #[must_use]
    pub fn check_max_iterations(&self, iteration: usize) -> Option<EndCriteriaType> {
        (iteration >= self.max_iterations).then_some(EndCriteriaType::MaxIterations)
    }

    /// Stops once the point has moved less than `root_epsilon` for more than
    /// `max_stationary_state_iterations` consecutive iterations.
    pub fn check_stationary_point(
        &self,
        x_old: f64,
        x_new: f64,
        stationary_iterations: &mut usize,
    ) -> Option<EndCriteriaType> {
        self.check_stationary(
            (x_new - x_old).abs() < self.root_epsilon,
            stationary_iterations,
            EndCriteriaType::StationaryPoint,
        )
    }

    /// Stops once the function value has changed less than
    /// `function_epsilon` for more than `max_stationary_state_iterations`
    /// consecutive iterations.
    pub fn check_stationary_function_value(
        &self,
        f_old: f64,
        f_new: f64,
        stationary_iterations: &mut usize,
    ) -> Option<EndCriteriaType> {
        self.check_stationary(
            (f_new - f_old).abs() < self.function_epsilon,
            stationary_iterations,
            EndCriteriaType::StationaryFunctionValue,
        )
    }

    /// For non-negative objectives, stops once `f` is below `function_epsilon`.
    #[must_use]
    pub fn check_stationary_function_accuracy(
        &self,
        f: f64,
        positive_optimization: bool,
    ) -> Option<EndCriteriaType> {
        (positive_optimization && f < self.function_epsilon)
            .then_some(EndCriteriaType::StationaryFunctionAccuracy)
    }

    /// Stops once the gradient norm is below `gradient_norm_epsilon`.
    #[must_use]
    pub fn check_zero_gradient_norm(&self, gradient_norm: f64) -> Option<EndCriteriaType> {
        (gradient_norm < self.gradient_norm_epsilon).then_some(EndCriteriaType::ZeroGradientNorm)
    }

    fn check_stationary(
        &self,
        stationary: bool,
        stationary_iterations: &mut usize,
        reason: EndCriteriaType,
    ) -> Option<EndCriteriaType> {
        if !stationary {
            *stationary_iterations = 0;
            return None;
        }
        *stationary_iterations += 1;
        (*stationary_iterations > self.max_stationary_state_iterations).then_some(reason)
    }
}
