//! parlu: parallel multifrontal sparse LU over Faer
//!
//! This crate factorizes square sparse matrices as P·S⁻¹A·Q = L·U using a
//! tree of dense frontal matrices. Independent subtrees and large dense
//! kernels run on an explicit worker pool; the factors are then reused for
//! any number of solves with A, L or U.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod numeric;
pub mod solver;
pub mod symbolic;
pub mod utils;

// Re-exports for convenience
pub use config::{Control, Ordering, PivotFallback, Strategy};
pub use context::LuContext;
pub use crate::core::{MatVec, Norm1};
pub use error::{LuError, Status};
pub use matrix::{CscMatrix, DenseBlock};
pub use numeric::{FactorStats, FrontFactors, FrontFlags, FrontStatus, Numeric, factorize};
pub use parallel::{KernelCounts, KernelPolicy, Scheduler};
pub use solver::{LinearSolver, Rhs, SolveSystem};
pub use symbolic::{EliminationTree, FrontSpec, Symbolic, analyze};
pub use utils::{Residual, SolveStats, inv_perm, perm, residual};
