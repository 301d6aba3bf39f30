//! Core traits shared by the sparse container, the dense blocks and the residual check.

pub mod traits;
pub use traits::{MatVec, Norm1};
