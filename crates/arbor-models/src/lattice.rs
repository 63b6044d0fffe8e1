//! Time grids and short-rate trees.
//!
//! Provides a recombining binomial tree of short rates whose drift is
//! fitted, step by step, so that the tree reprices a given discount curve
//! at every grid time. Values are priced by backward induction.

use tracing::debug;

use crate::error::{ModelError, ModelResult};

/// Relative tolerance used to merge coincident times.
const TIME_TOLERANCE: f64 = 1e-12;

/// An increasing set of times starting at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    mandatory: Vec<f64>,
}

impl TimeGrid {
    /// Creates a uniform grid of `steps` steps from zero to `end`.
    ///
    /// # Errors
    ///
    /// Fails unless `end` is positive and finite and `steps > 0`.
    pub fn new(end: f64, steps: usize) -> ModelResult<Self> {
        if !end.is_finite() || end <= 0.0 {
            return Err(ModelError::invalid_input(format!(
                "grid end must be positive, got {end}"
            )));
        }
        if steps == 0 {
            return Err(ModelError::invalid_input("grid needs at least one step"));
        }
        let dt = end / steps as f64;
        let mut times: Vec<f64> = (0..steps).map(|i| i as f64 * dt).collect();
        times.push(end);
        Ok(Self {
            times,
            mandatory: vec![end],
        })
    }

    /// Creates a grid that contains every time in `mandatory`.
    ///
    /// The grid ends at the largest mandatory time. Each interval between
    /// consecutive mandatory times is split evenly, into as many steps as
    /// bring the step size closest to `end / steps` (at least one).
    ///
    /// # Errors
    ///
    /// Fails on an empty list, negative or non-finite times, a largest
    /// time of zero, or `steps == 0`.
    pub fn from_times(mandatory: &[f64], steps: usize) -> ModelResult<Self> {
        if steps == 0 {
            return Err(ModelError::invalid_input("grid needs at least one step"));
        }
        if let Some(bad) = mandatory.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(ModelError::invalid_input(format!(
                "grid times must be finite and non-negative, got {bad}"
            )));
        }

        let mut sorted = mandatory.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup_by(|b, a| close(*a, *b));
        let end = match sorted.last() {
            Some(&end) if end > 0.0 => end,
            _ => {
                return Err(ModelError::invalid_input(
                    "grid needs a positive mandatory time",
                ))
            }
        };

        let dt_max = end / steps as f64;
        let mut times = vec![0.0];
        let mut previous = 0.0;
        for &t in sorted.iter().filter(|&&t| !close(t, 0.0)) {
            let n = (((t - previous) / dt_max).round() as usize).max(1);
            let dt = (t - previous) / n as f64;
            times.extend((1..n).map(|k| previous + k as f64 * dt));
            times.push(t);
            previous = t;
        }

        Ok(Self {
            times,
            mandatory: sorted,
        })
    }

    /// Returns the grid times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Returns the mandatory times the grid was built from.
    pub fn mandatory_times(&self) -> &[f64] {
        &self.mandatory
    }

    /// Returns the number of steps.
    pub fn steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Returns the time at step `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i > steps()`.
    pub fn time(&self, i: usize) -> f64 {
        self.times[i]
    }

    /// Returns the length of step `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= steps()`.
    pub fn dt(&self, i: usize) -> f64 {
        self.times[i + 1] - self.times[i]
    }

    /// Returns the last time.
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Returns the step at which `t` sits on the grid, if it does.
    pub fn index(&self, t: f64) -> Option<usize> {
        let i = self.closest_index(t);
        close(self.times[i], t).then_some(i)
    }

    /// Returns the step whose time is closest to `t`.
    pub fn closest_index(&self, t: f64) -> usize {
        let i = self.times.partition_point(|&s| s < t);
        if i == 0 {
            0
        } else if i == self.times.len() {
            i - 1
        } else if t - self.times[i - 1] <= self.times[i] - t {
            i - 1
        } else {
            i
        }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// A recombining binomial tree of short rates.
///
/// # Structure
///
/// At step `i` there are `i + 1` nodes. From node `(i, j)` the rate moves
/// up to `(i + 1, j + 1)` or down to `(i + 1, j)`.
///
/// ```text
///                    [0,0]
///                   /     \
///              [1,1]       [1,0]
///             /    \      /    \
///         [2,2]   [2,1]  [2,1]  [2,0]
/// ```
///
/// The short rate at a node is `alpha(i) + x(i, j)`, where `x` is a
/// symmetric lattice with spacing `sigma * sqrt(dt)` and `alpha(i)` is the
/// fitted drift. Mean reversion enters through the branching
/// probabilities, which pull `x` towards zero at speed `a` and are clamped
/// to `[0, 1]` far from the centre.
#[derive(Debug, Clone)]
pub struct ShortRateTree {
    grid: TimeGrid,
    /// `rates[i][j]`: short rate at node `(i, j)` for `i < steps`.
    rates: Vec<Vec<f64>>,
    /// `probabilities[i][j]`: (up, down) from node `(i, j)`.
    probabilities: Vec<Vec<(f64, f64)>>,
    /// `state_prices[i][j]`: value today of 1 paid at node `(i, j)`.
    state_prices: Vec<Vec<f64>>,
}

impl ShortRateTree {
    /// Builds a tree on `grid` fitted to the discount function `discount`.
    ///
    /// # Arguments
    ///
    /// * `a` - Mean reversion speed (non-negative)
    /// * `sigma` - Short rate volatility (non-negative)
    /// * `discount` - Discount factor as a function of time
    ///
    /// # Errors
    ///
    /// Fails on invalid `a` or `sigma`, when `discount` fails, or when it
    /// returns a non-positive value.
    pub fn fitted(
        grid: TimeGrid,
        a: f64,
        sigma: f64,
        discount: impl Fn(f64) -> ModelResult<f64>,
    ) -> ModelResult<Self> {
        if !a.is_finite() || a < 0.0 || !sigma.is_finite() || sigma < 0.0 {
            return Err(ModelError::invalid_input(format!(
                "tree needs non-negative mean reversion and volatility, got a = {a}, sigma = {sigma}"
            )));
        }

        let steps = grid.steps();
        let x = |i: usize, j: usize| -> f64 {
            if i == 0 {
                0.0
            } else {
                (2.0 * j as f64 - i as f64) * sigma * grid.dt(i - 1).sqrt()
            }
        };

        let mut rates = Vec::with_capacity(steps);
        let mut probabilities = Vec::with_capacity(steps);
        let mut state_prices = Vec::with_capacity(steps + 1);
        state_prices.push(vec![1.0]);

        for i in 0..steps {
            let dt = grid.dt(i);
            let target = discount(grid.time(i + 1))?;
            if target.is_nan() || target <= 0.0 {
                return Err(ModelError::pricing(format!(
                    "discount factor at t = {} is {target}",
                    grid.time(i + 1)
                )));
            }

            let prices = &state_prices[i];
            let unshifted: f64 = (0..=i).map(|j| prices[j] * (-x(i, j) * dt).exp()).sum();
            let alpha = (unshifted / target).ln() / dt;

            let level_rates: Vec<f64> = (0..=i).map(|j| alpha + x(i, j)).collect();
            let level_probabilities: Vec<(f64, f64)> = (0..=i)
                .map(|j| {
                    let down = x(i + 1, j);
                    let up = x(i + 1, j + 1);
                    let p = if up > down {
                        ((x(i, j) * (-a * dt).exp() - down) / (up - down)).clamp(0.0, 1.0)
                    } else {
                        0.5
                    };
                    (p, 1.0 - p)
                })
                .collect();

            let mut next = vec![0.0; i + 2];
            for j in 0..=i {
                let carried = prices[j] * (-level_rates[j] * dt).exp();
                let (p_up, p_down) = level_probabilities[j];
                next[j + 1] += carried * p_up;
                next[j] += carried * p_down;
            }

            rates.push(level_rates);
            probabilities.push(level_probabilities);
            state_prices.push(next);
        }

        debug!(steps, end = grid.end(), a, sigma, "fitted short-rate tree");
        Ok(Self {
            grid,
            rates,
            probabilities,
            state_prices,
        })
    }

    /// Returns the time grid.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Returns the number of steps.
    pub fn steps(&self) -> usize {
        self.grid.steps()
    }

    /// Returns the number of nodes at step `i`.
    pub fn states_at(&self, i: usize) -> usize {
        i + 1
    }

    /// Returns the short rate at node `(i, j)`, for `i < steps()`.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn rate_at(&self, i: usize, j: usize) -> f64 {
        self.rates[i][j]
    }

    /// Returns the probability of an up move from node `(i, j)`.
    pub fn prob_up(&self, i: usize, j: usize) -> f64 {
        self.probabilities[i][j].0
    }

    /// Returns the probability of a down move from node `(i, j)`.
    pub fn prob_down(&self, i: usize, j: usize) -> f64 {
        self.probabilities[i][j].1
    }

    /// Returns the one-step discount factor at node `(i, j)`.
    ///
    /// DF = exp(-r(i, j) * dt(i))
    pub fn discount_factor(&self, i: usize, j: usize) -> f64 {
        (-self.rates[i][j] * self.grid.dt(i)).exp()
    }

    /// Returns the value today of 1 paid at node `(i, j)`.
    pub fn state_price(&self, i: usize, j: usize) -> f64 {
        self.state_prices[i][j]
    }

    /// Returns the time in years at step `i`.
    pub fn time_at_step(&self, i: usize) -> f64 {
        self.grid.time(i)
    }

    /// Rolls `values`, given at the nodes of step `from`, back to step `to`.
    ///
    /// # Errors
    ///
    /// Fails unless `to <= from <= steps()` and `values` has one entry per
    /// node of step `from`.
    pub fn rollback(&self, values: &[f64], from: usize, to: usize) -> ModelResult<Vec<f64>> {
        if to > from || from > self.steps() {
            return Err(ModelError::invalid_input(format!(
                "cannot roll back from step {from} to step {to} on a {}-step tree",
                self.steps()
            )));
        }
        if values.len() != self.states_at(from) {
            return Err(ModelError::invalid_input(format!(
                "step {from} has {} nodes, got {} values",
                self.states_at(from),
                values.len()
            )));
        }

        let mut values = values.to_vec();
        for i in (to..from).rev() {
            values = (0..=i)
                .map(|j| {
                    let expected = self.prob_up(i, j) * values[j + 1]
                        + self.prob_down(i, j) * values[j];
                    self.discount_factor(i, j) * expected
                })
                .collect();
        }
        Ok(values)
    }

    /// Performs backward induction of `terminal_values`, given at the last
    /// step, and returns the value at the root.
    pub fn backward_induction(&self, terminal_values: &[f64]) -> ModelResult<f64> {
        let values = self.rollback(terminal_values, self.steps(), 0)?;
        Ok(values[0])
    }

    /// Returns the tree price of a zero-coupon bond paying 1 at step `i`.
    pub fn discount_bond(&self, i: usize) -> ModelResult<f64> {
        let values = self.rollback(&vec![1.0; self.states_at(i)], i, 0)?;
        Ok(values[0])
    }
}
