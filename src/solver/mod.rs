//! Triangular solves with the frontal factors.

use crate::utils::stats::SolveStats;

/// Common interface for a solver that can be handed a matrix and a right-hand side.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Solve A·x = b, writing the result into `x`.
    fn solve(
        &mut self,
        a: &M,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<<Self as LinearSolver<M, V>>::Scalar>, Self::Error>;
}

pub mod solve;
pub use solve::{Rhs, SolveSystem};

pub mod triangular;
