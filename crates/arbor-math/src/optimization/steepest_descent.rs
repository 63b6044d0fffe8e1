//! Steepest descent with backtracking line search.

use log::debug;

use super::{
    feasible_bump, norm, Bump, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult, Problem, DEFAULT_GRADIENT_STEP,
};
use crate::error::MathResult;

/// Steepest descent with an Armijo backtracking line search.
///
/// Gradients are central differences over feasible points. Each line
/// search starts from the longest feasible step along the descent
/// direction, as found by [`Constraint::update`], and halves it until the
/// Armijo test passes.
///
/// [`Constraint::update`]: super::Constraint::update
#[derive(Debug, Clone, Copy)]
pub struct SteepestDescent {
    /// Relative step for numerical gradients.
    pub gradient_step: f64,
    /// Armijo sufficient-decrease parameter.
    pub armijo: f64,
    /// Smallest line-search step before giving up.
    pub min_step: f64,
}

impl Default for SteepestDescent {
    fn default() -> Self {
        Self {
            gradient_step: DEFAULT_GRADIENT_STEP,
            armijo: 0.5,
            min_step: 1e-15,
        }
    }
}

impl SteepestDescent {
    fn gradient(&self, problem: &Problem<'_>, x: &[f64], fx: f64) -> MathResult<Vec<f64>> {
        let mut gradient = vec![0.0; x.len()];
        for (j, g) in gradient.iter_mut().enumerate() {
            *g = match feasible_bump(problem.constraint(), x, j, self.gradient_step) {
                Bump::Central { up, down, h } => {
                    (problem.value(&up)? - problem.value(&down)?) / (2.0 * h)
                }
                Bump::Forward { up, h } => (problem.value(&up)? - fx) / h,
                Bump::Backward { down, h } => (fx - problem.value(&down)?) / h,
                Bump::Stuck => 0.0,
            };
        }
        Ok(gradient)
    }
}

impl OptimizationMethod for SteepestDescent {
    fn name(&self) -> &'static str {
        "SteepestDescent"
    }

    fn minimize(
        &self,
        problem: &Problem<'_>,
        end_criteria: &EndCriteria,
    ) -> MathResult<OptimizationResult> {
        problem.check_initial()?;

        let mut params = problem.initial().to_vec();
        let mut best_value = problem.value(&params)?;
        let mut stationary_iterations = 0;
        let mut iterations = 0;

        let end_criteria_type = loop {
            if let Some(reason) = end_criteria.check_max_iterations(iterations) {
                break reason;
            }
            iterations += 1;

            let gradient = self.gradient(problem, &params, best_value)?;
            let grad_mag = norm(&gradient);
            if let Some(reason) = end_criteria.check_zero_gradient_norm(grad_mag) {
                break reason;
            }

            let descent: Vec<f64> = gradient.iter().map(|g| -g).collect();
            let mut new_params = params.clone();
            let Ok(mut step) = problem.constraint().update(&mut new_params, &descent, 1.0) else {
                break EndCriteriaType::StationaryPoint;
            };
            let accepted = loop {
                if step < self.min_step {
                    break None;
                }
                if problem.constraint().test(&new_params) {
                    let new_value = problem.value(&new_params)?;
                    if new_value < best_value - self.armijo * step * grad_mag * grad_mag {
                        break Some((new_params, new_value));
                    }
                }

                step *= 0.5;
                new_params = params
                    .iter()
                    .zip(&descent)
                    .map(|(p, d)| p + step * d)
                    .collect();
            };

            let Some((new_params, new_value)) = accepted else {
                break EndCriteriaType::StationaryPoint;
            };

            let previous = best_value;
            params = new_params;
            best_value = new_value;

            if let Some(reason) = end_criteria.check_stationary_function_value(
                previous,
                best_value,
                &mut stationary_iterations,
            ) {
                break reason;
            }
        };

        debug!("steepest descent stopped after {iterations} iterations ({end_criteria_type})");

        Ok(OptimizationResult {
            parameters: params,
            objective_value: best_value,
            iterations,
            function_evaluations: problem.function_evaluations(),
            end_criteria: end_criteria_type,
        })
    }
}
