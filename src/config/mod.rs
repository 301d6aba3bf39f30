//! Configuration of the analysis, factorization and solve phases.

pub mod options;
pub use options::{Control, Ordering, PivotFallback, Strategy};
