//! Levenberg-Marquardt least squares.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};

use super::{
    feasible_bump, norm, Bump, EndCriteria, EndCriteriaType, OptimizationMethod,
    OptimizationResult, Problem,
};
use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_damped_normal_equations;

/// Levenberg-Marquardt optimizer for least-squares cost functions.
///
/// Minimizes the sum of squared residuals returned by
/// [`CostFunction::values`](super::CostFunction::values). The Jacobian is
/// built by finite differences that only touch feasible points; trial steps
/// that leave the feasible region are rejected like uphill steps, by
/// increasing the damping.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Damping adjustment factor.
    pub lambda_factor: f64,
    /// Minimum damping.
    pub min_lambda: f64,
    /// Maximum damping; exceeding it means no downhill step exists.
    pub max_lambda: f64,
    /// Relative finite difference step for the Jacobian.
    pub jacobian_step: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            initial_lambda: 0.001,
            lambda_factor: 10.0,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            jacobian_step: 1e-6,
        }
    }
}

impl LevenbergMarquardt {
    /// Creates an optimizer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial damping.
    #[must_use]
    pub fn with_initial_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Sets the Jacobian finite difference step.
    #[must_use]
    pub fn with_jacobian_step(mut self, step: f64) -> Self {
        self.jacobian_step = step;
        self
    }

    fn residuals(problem: &Problem<'_>, x: &[f64], expected: usize) -> MathResult<DVector<f64>> {
        let values = problem.values(x)?;
        if values.len() != expected {
            return Err(MathError::dimension_mismatch(expected, values.len()));
        }
        Ok(DVector::from_vec(values))
    }

    fn jacobian(
        &self,
        problem: &Problem<'_>,
        x: &[f64],
        residuals: &DVector<f64>,
    ) -> MathResult<DMatrix<f64>> {
        let m = residuals.len();
        let n = x.len();
        let mut jacobian = DMatrix::zeros(m, n);

        for j in 0..n {
            let column = match feasible_bump(problem.constraint(), x, j, self.jacobian_step) {
                Bump::Central { up, down, h } => {
                    (Self::residuals(problem, &up, m)? - Self::residuals(problem, &down, m)?)
                        / (2.0 * h)
                }
                Bump::Forward { up, h } => (Self::residuals(problem, &up, m)? - residuals) / h,
                Bump::Backward { down, h } => {
                    (residuals - Self::residuals(problem, &down, m)?) / h
                }
                Bump::Stuck => {
                    trace!("no feasible bump for coordinate {j}; column left at zero");
                    continue;
                }
            };
            jacobian.set_column(j, &column);
        }

        Ok(jacobian)
    }
}

impl OptimizationMethod for LevenbergMarquardt {
    fn name(&self) -> &'static str {
        "LevenbergMarquardt"
    }

    fn minimize(
        &self,
        problem: &Problem<'_>,
        end_criteria: &EndCriteria,
    ) -> MathResult<OptimizationResult> {
        problem.check_initial()?;
        let constraint = problem.constraint();

        let mut x = problem.initial().to_vec();
        let first = problem.values(&x)?;
        if first.is_empty() {
            return Err(MathError::invalid_input(
                "least-squares problem has no residuals",
            ));
        }
        let m = first.len();
        let mut residuals = DVector::from_vec(first);
        let mut cost = residuals.norm_squared();

        let mut lambda = self.initial_lambda;
        let mut stationary_iterations = 0;
        let mut iterations = 0;

        let end_criteria_type = loop {
            if let Some(reason) = end_criteria.check_stationary_function_accuracy(cost, true) {
                break reason;
            }
            if let Some(reason) = end_criteria.check_max_iterations(iterations) {
                break reason;
            }
            if x.is_empty() {
                break EndCriteriaType::StationaryPoint;
            }
            iterations += 1;

            let jacobian = self.jacobian(problem, &x, &residuals)?;
            let gradient = jacobian.transpose() * &residuals;
            if let Some(reason) = end_criteria.check_zero_gradient_norm(gradient.norm()) {
                break reason;
            }

            // Increase damping until a feasible downhill step is found.
            let mut accepted = None;
            while lambda <= self.max_lambda {
                let step = match solve_damped_normal_equations(&jacobian, &residuals, lambda) {
                    Ok(step) => step,
                    Err(MathError::SingularMatrix) => {
                        lambda *= self.lambda_factor;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                let candidate: Vec<f64> = x.iter().zip(step.iter()).map(|(a, d)| a + d).collect();
                if !constraint.test(&candidate) {
                    lambda *= self.lambda_factor;
                    continue;
                }

                let candidate_residuals = Self::residuals(problem, &candidate, m)?;
                let candidate_cost = candidate_residuals.norm_squared();
                if candidate_cost < cost {
                    lambda = (lambda / self.lambda_factor).max(self.min_lambda);
                    accepted = Some((candidate, candidate_residuals, candidate_cost, step.norm()));
                    break;
                }
                lambda *= self.lambda_factor;
            }

            let Some((candidate, candidate_residuals, candidate_cost, step_norm)) = accepted else {
                debug!("no downhill step at damping {lambda:.1e}; treating point as stationary");
                break EndCriteriaType::StationaryPoint;
            };

            let previous_cost = cost;
            x = candidate;
            residuals = candidate_residuals;
            cost = candidate_cost;
            trace!("LM iteration {iterations}: cost = {cost:.3e}, lambda = {lambda:.1e}");

            let eps = end_criteria.root_epsilon;
            if step_norm < eps * (norm(&x) + eps) {
                break EndCriteriaType::StationaryPoint;
            }
            if let Some(reason) = end_criteria.check_stationary_function_value(
                previous_cost,
                cost,
                &mut stationary_iterations,
            ) {
                break reason;
            }
        };

        debug!(
            "Levenberg-Marquardt stopped after {iterations} iterations ({end_criteria_type}), f = {cost:.3e}"
        );

        Ok(OptimizationResult {
            parameters: x,
            objective_value: cost,
            iterations,
            function_evaluations: problem.function_evaluations(),
            end_criteria: end_criteria_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        BoundaryConstraint, Constraint, CostFunction, NoConstraint, PositiveConstraint,
        ResidualFn,
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_least_squares() {
        // Fit y = a + b t to exact data.
        let ts = [0.0, 1.0, 2.0, 3.0];
        let cost = ResidualFn::new(move |x: &[f64]| {
            ts.iter().map(|t| x[0] + x[1] * t - (1.5 + 0.5 * t)).collect()
        });
        let problem = Problem::new(&cost, &NoConstraint, vec![0.0, 0.0]);
        let criteria = EndCriteria::new(100, 10, 1e-12, 1e-20, 1e-14);

        let result = LevenbergMarquardt::default().minimize(&problem, &criteria).unwrap();

        assert!(result.converged());
        assert_abs_diff_eq!(result.parameters[0], 1.5, epsilon = 1e-8);
        assert_abs_diff_eq!(result.parameters[1], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_exponential_decay_fit() {
        // y = 2 exp(-0.7 t), fitted under positivity.
        let ts: Vec<f64> = (0..10).map(|i| f64::from(i) * 0.5).collect();
        let cost = ResidualFn::new(move |x: &[f64]| {
            ts.iter()
                .map(|t| x[0] * (-x[1] * t).exp() - 2.0 * (-0.7 * t).exp())
                .collect()
        });
        let problem = Problem::new(&cost, &PositiveConstraint, vec![1.0, 0.2]);
        let criteria = EndCriteria::new(200, 10, 1e-14, 1e-24, 1e-16);

        let result = LevenbergMarquardt::default().minimize(&problem, &criteria).unwrap();

        assert!(result.converged());
        assert_abs_diff_eq!(result.parameters[0], 2.0, epsilon = 1e-7);
        assert_abs_diff_eq!(result.parameters[1], 0.7, epsilon = 1e-7);
        assert!(cost.value(&result.parameters).unwrap() < 1e-14);
    }

    #[test]
    fn test_bounded_solution_stays_feasible() {
        let cost = ResidualFn::new(|x: &[f64]| vec![x[0] - 2.0]);
        let bounded = BoundaryConstraint::new(0.0, 1.0).unwrap();
        let problem = Problem::new(&cost, &bounded, vec![0.5]);

        let result = LevenbergMarquardt::default()
            .minimize(&problem, &EndCriteria::default())
            .unwrap();

        assert!(bounded.test(&result.parameters));
        assert!(result.parameters[0] > 0.9);
    }

    #[test]
    fn test_infeasible_start() {
        let cost = ResidualFn::new(|x: &[f64]| vec![x[0]]);
        let problem = Problem::new(&cost, &PositiveConstraint, vec![-1.0]);
        let result = LevenbergMarquardt::default().minimize(&problem, &EndCriteria::default());
        assert!(matches!(result, Err(MathError::InfeasibleStart { .. })));
    }

    #[test]
    fn test_no_residuals() {
        let cost = ResidualFn::new(|_: &[f64]| Vec::new());
        let problem = Problem::new(&cost, &NoConstraint, vec![1.0]);
        let result = LevenbergMarquardt::default().minimize(&problem, &EndCriteria::default());
        assert!(matches!(result, Err(MathError::InvalidInput { .. })));
    }
}
