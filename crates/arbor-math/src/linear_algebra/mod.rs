//! Linear algebra utilities.
//!
//! Thin wrappers over `nalgebra` decompositions used by the least-squares
//! optimizer.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Solves a square linear system `A x = b` by LU decomposition with partial
/// pivoting.
///
/// # Errors
///
/// Returns `MathError::InvalidInput` for a non-square matrix,
/// `MathError::DimensionMismatch` if `b` has the wrong length, and
/// `MathError::SingularMatrix` if `A` cannot be inverted.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if n != b.len() {
        return Err(MathError::dimension_mismatch(n, b.len()));
    }

    a.clone().lu().solve(b).ok_or(MathError::SingularMatrix)
}

/// Solves the damped normal equations `(JᵀJ + λI) δ = -Jᵀr`.
///
/// This is the Levenberg-Marquardt step for residuals `r` with Jacobian `J`.
/// The system is symmetric positive definite for `λ > 0`, so Cholesky is
/// tried first, with LU as the fallback.
pub fn solve_damped_normal_equations(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    lambda: f64,
) -> MathResult<DVector<f64>> {
    if jacobian.nrows() != residuals.len() {
        return Err(MathError::dimension_mismatch(jacobian.nrows(), residuals.len()));
    }

    let n = jacobian.ncols();
    let jt = jacobian.transpose();
    let mut normal = &jt * jacobian;
    for i in 0..n {
        normal[(i, i)] += lambda;
    }
    let rhs = -(&jt * residuals);

    match normal.clone().cholesky() {
        Some(cholesky) => Ok(cholesky.solve(&rhs)),
        None => solve_linear_system(&normal, &rhs),
    }
}
