//! Summary of a direct solve.

use crate::error::Status;

#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    /// ‖b − A·x‖₁ / (‖A‖₁·‖x‖₁).
    pub final_residual: T,
    pub anorm: T,
    pub xnorm: T,
    /// Reciprocal condition estimate of the factors used.
    pub rcond: T,
    pub status: Status,
}

impl<T: Copy + num_traits::Float> SolveStats<T> {
    /// Did the solve land within `tol` (relative residual)?
    pub fn converged(&self, tol: T) -> bool {
        self.status == Status::Success && self.final_residual <= tol
    }
}
