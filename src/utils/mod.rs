//! Helpers around the factors: permutations, residuals and solve statistics.

pub mod permute;
pub use permute::{inv_perm, perm};
pub mod residual;
pub use residual::{Residual, residual};
pub mod stats;
pub use stats::SolveStats;
