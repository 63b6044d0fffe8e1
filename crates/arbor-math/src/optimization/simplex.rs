//! Nelder-Mead downhill simplex.

use log::{debug, trace};

use super::{
    norm, Constraint, EndCriteria, EndCriteriaType, OptimizationMethod, OptimizationResult,
    Problem,
};
use crate::error::{MathError, MathResult};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Maximum halvings of the initial edge length when building the simplex.
const MAX_EDGE_HALVINGS: u32 = 64;

/// Nelder-Mead downhill simplex.
///
/// Derivative-free. Infeasible trial points are never evaluated; they count
/// as worse than any feasible vertex. Stops when the mean distance of the
/// vertices from their centroid falls below `root_epsilon`.
#[derive(Debug, Clone, Copy)]
pub struct Simplex {
    lambda: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self { lambda: 0.1 }
    }
}

impl Simplex {
    /// Creates a simplex whose initial edges have length `lambda`.
    ///
    /// # Errors
    ///
    /// Returns `MathError::InvalidInput` unless `lambda` is positive.
    pub fn new(lambda: f64) -> MathResult<Self> {
        if lambda > 0.0 && lambda.is_finite() {
            Ok(Self { lambda })
        } else {
            Err(MathError::invalid_input(format!(
                "simplex edge length must be positive, got {lambda}"
            )))
        }
    }

    /// Returns the initial edge length.
    #[must_use]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Builds the vertex `x0 ± lambda * e_i`, shrinking the edge until it is
    /// feasible.
    fn vertex(&self, constraint: &dyn Constraint, x0: &[f64], i: usize) -> MathResult<Vec<f64>> {
        let mut edge = self.lambda;
        for _ in 0..MAX_EDGE_HALVINGS {
            for sign in [1.0, -1.0] {
                let mut vertex = x0.to_vec();
                vertex[i] += sign * edge;
                if constraint.test(&vertex) {
                    return Ok(vertex);
                }
            }
            edge *= 0.5;
        }
        Err(MathError::NoFeasibleStep {
            attempts: MAX_EDGE_HALVINGS,
        })
    }
}

/// Evaluates the cost, treating infeasible points and NaN as +inf.
fn evaluate(problem: &Problem<'_>, x: &[f64]) -> MathResult<f64> {
    if !problem.constraint().test(x) {
        trace!("simplex trial point {x:?} infeasible");
        return Ok(f64::INFINITY);
    }
    let value = problem.value(x)?;
    Ok(if value.is_nan() { f64::INFINITY } else { value })
}

/// Mean distance of the vertices from their centroid.
fn simplex_size(vertices: &[Vec<f64>]) -> f64 {
    let n = vertices[0].len();
    let count = vertices.len() as f64;
    let center: Vec<f64> = (0..n)
        .map(|j| vertices.iter().map(|v| v[j]).sum::<f64>() / count)
        .collect();
    vertices
        .iter()
        .map(|v| {
            let diff: Vec<f64> = v.iter().zip(&center).map(|(a, c)| a - c).collect();
            norm(&diff)
        })
        .sum::<f64>()
        / count
}

/// `from + coeff * (to - from)`.
fn towards(from: &[f64], to: &[f64], coeff: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(f, t)| f + coeff * (t - f)).collect()
}

impl OptimizationMethod for Simplex {
    fn name(&self) -> &'static str {
        "Simplex"
    }

    fn minimize(
        &self,
        problem: &Problem<'_>,
        end_criteria: &EndCriteria,
    ) -> MathResult<OptimizationResult> {
        problem.check_initial()?;
        let x0 = problem.initial().to_vec();
        let n = x0.len();

        if n == 0 {
            let value = problem.value(&x0)?;
            return Ok(OptimizationResult {
                parameters: x0,
                objective_value: value,
                iterations: 0,
                function_evaluations: problem.function_evaluations(),
                end_criteria: EndCriteriaType::StationaryPoint,
            });
        }

        let mut vertices = vec![x0.clone()];
        for i in 0..n {
            vertices.push(self.vertex(problem.constraint(), &x0, i)?);
        }
        let mut values = vertices
            .iter()
            .map(|v| evaluate(problem, v))
            .collect::<MathResult<Vec<f64>>>()?;

        let mut iterations = 0;
        let end_criteria_type = loop {
            // Order vertices best first.
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            vertices = order.iter().map(|&i| vertices[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            if simplex_size(&vertices) < end_criteria.root_epsilon {
                break EndCriteriaType::StationaryPoint;
            }
            if let Some(reason) = end_criteria.check_max_iterations(iterations) {
                break reason;
            }
            iterations += 1;

            let worst = n;
            let centroid: Vec<f64> = (0..n)
                .map(|j| vertices[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
                .collect();

            let reflected = towards(&centroid, &vertices[worst], -REFLECTION);
            let f_reflected = evaluate(problem, &reflected)?;

            if f_reflected < values[0] {
                let expanded = towards(&centroid, &vertices[worst], -EXPANSION);
                let f_expanded = evaluate(problem, &expanded)?;
                if f_expanded < f_reflected {
                    vertices[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    vertices[worst] = reflected;
                    values[worst] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                vertices[worst] = reflected;
                values[worst] = f_reflected;
                continue;
            }

            let (contracted, bound) = if f_reflected < values[worst] {
                (towards(&centroid, &reflected, CONTRACTION), f_reflected)
            } else {
                (towards(&centroid, &vertices[worst], CONTRACTION), values[worst])
            };
            let f_contracted = evaluate(problem, &contracted)?;
            if f_contracted < bound {
                vertices[worst] = contracted;
                values[worst] = f_contracted;
                continue;
            }

            for i in 1..=n {
                vertices[i] = towards(&vertices[0], &vertices[i], SHRINK);
                values[i] = evaluate(problem, &vertices[i])?;
            }
        };

        debug!(
            "simplex stopped after {iterations} iterations ({end_criteria_type}), f = {:.3e}",
            values[0]
        );

        Ok(OptimizationResult {
            parameters: vertices.swap_remove(0),
            objective_value: values[0],
            iterations,
            function_evaluations: problem.function_evaluations(),
            end_criteria: end_criteria_type,
        })
    }
}
