//! Calibration configuration.
//!
//! A [`CalibrationConfig`] selects the optimizer, its settings, the end
//! criteria and optional helper weights. It loads from TOML or JSON:
//!
//! ```toml
//! weights = [1.0, 1.0, 2.0]
//!
//! [method]
//! type = "simplex"
//! lambda = 0.05
//!
//! [end_criteria]
//! max_iterations = 2000
//! function_epsilon = 1e-12
//! ```

use arbor_math::optimization::{
    EndCriteria, LevenbergMarquardt, OptimizationMethod, Simplex, SteepestDescent,
    DEFAULT_GRADIENT_STEP,
};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

// =============================================================================
// OPTIMIZER SELECTION
// =============================================================================

/// Optimizer choice with its settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MethodConfig {
    /// Levenberg-Marquardt on the helper residuals.
    LevenbergMarquardt {
        /// Initial damping.
        #[serde(default = "default_initial_lambda")]
        initial_lambda: f64,
        /// Relative finite difference step for the Jacobian.
        #[serde(default = "default_jacobian_step")]
        jacobian_step: f64,
    },
    /// Nelder-Mead simplex.
    Simplex {
        /// Edge length of the initial simplex.
        #[serde(default = "default_simplex_lambda")]
        lambda: f64,
    },
    /// Steepest descent with Armijo backtracking.
    SteepestDescent {
        /// Relative step for numerical gradients.
        #[serde(default = "default_gradient_step")]
        gradient_step: f64,
        /// Armijo sufficient-decrease parameter, in `(0, 1)`.
        #[serde(default = "default_armijo")]
        armijo: f64,
    },
}

fn default_initial_lambda() -> f64 {
    LevenbergMarquardt::default().initial_lambda
}

fn default_jacobian_step() -> f64 {
    LevenbergMarquardt::default().jacobian_step
}

fn default_simplex_lambda() -> f64 {
    0.1
}

fn default_gradient_step() -> f64 {
    DEFAULT_GRADIENT_STEP
}

fn default_armijo() -> f64 {
    SteepestDescent::default().armijo
}

impl Default for MethodConfig {
    fn default() -> Self {
        MethodConfig::LevenbergMarquardt {
            initial_lambda: default_initial_lambda(),
            jacobian_step: default_jacobian_step(),
        }
    }
}

impl MethodConfig {
    fn issues(&self) -> Vec<String> {
        let positive = |name: &str, value: f64| {
            (!value.is_finite() || value <= 0.0)
                .then(|| format!("method.{name} must be positive, got {value}"))
        };
        match *self {
            MethodConfig::LevenbergMarquardt {
                initial_lambda,
                jacobian_step,
            } => [
                positive("initial_lambda", initial_lambda),
                positive("jacobian_step", jacobian_step),
            ]
            .into_iter()
            .flatten()
            .collect(),
            MethodConfig::Simplex { lambda } => positive("lambda", lambda).into_iter().collect(),
            MethodConfig::SteepestDescent {
                gradient_step,
                armijo,
            } => {
                let mut issues: Vec<String> =
                    positive("gradient_step", gradient_step).into_iter().collect();
                if armijo.is_nan() || armijo <= 0.0 || armijo >= 1.0 {
                    issues.push(format!("method.armijo must lie in (0, 1), got {armijo}"));
                }
                issues
            }
        }
    }
}

// =============================================================================
// CALIBRATION CONFIGURATION
// =============================================================================

/// Settings for a calibration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Optimizer. Defaults to Levenberg-Marquardt.
    #[serde(default)]
    pub method: MethodConfig,

    /// Termination limits.
    #[serde(default)]
    pub end_criteria: EndCriteria,

    /// Helper weights. Absent means every helper weighs 1.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl CalibrationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> ModelResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ModelError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(source: &str) -> ModelResult<Self> {
        let config: Self =
            serde_json::from_str(source).map_err(|e| ModelError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_string(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::config(e.to_string()))
    }

    /// Checks every setting, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Config` listing each invalid setting.
    pub fn validate(&self) -> ModelResult<()> {
        let mut issues = self.method.issues();

        let criteria = &self.end_criteria;
        if criteria.max_iterations == 0 {
            issues.push("end_criteria.max_iterations must be at least 1".to_string());
        }
        for (name, value) in [
            ("root_epsilon", criteria.root_epsilon),
            ("function_epsilon", criteria.function_epsilon),
            ("gradient_norm_epsilon", criteria.gradient_norm_epsilon),
        ] {
            if value.is_nan() || value < 0.0 || value.is_infinite() {
                issues.push(format!(
                    "end_criteria.{name} must be finite and non-negative, got {value}"
                ));
            }
        }

        if let Some(weights) = &self.weights {
            for (i, w) in weights.iter().enumerate() {
                if w.is_nan() || *w < 0.0 || w.is_infinite() {
                    issues.push(format!(
                        "weights[{i}] must be finite and non-negative, got {w}"
                    ));
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ModelError::config(issues.join("; ")))
        }
    }

    /// Returns the weights to pass to calibration; empty means unit weights.
    pub fn weights(&self) -> &[f64] {
        self.weights.as_deref().unwrap_or(&[])
    }

    /// Builds the configured optimizer.
    pub fn build_method(&self) -> ModelResult<Box<dyn OptimizationMethod>> {
        self.validate()?;
        let method: Box<dyn OptimizationMethod> = match self.method {
            MethodConfig::LevenbergMarquardt {
                initial_lambda,
                jacobian_step,
            } => Box::new(
                LevenbergMarquardt::new()
                    .with_initial_lambda(initial_lambda)
                    .with_jacobian_step(jacobian_step),
            ),
            MethodConfig::Simplex { lambda } => Box::new(Simplex::new(lambda)?),
            MethodConfig::SteepestDescent {
                gradient_step,
                armijo,
            } => Box::new(SteepestDescent {
                gradient_step,
                armijo,
                ..SteepestDescent::default()
            }),
        };
        Ok(method)
    }
}
