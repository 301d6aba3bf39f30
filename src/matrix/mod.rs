//! Matrix module: the sparse input container and dense column-major blocks.

pub mod dense;
pub use dense::DenseBlock;
pub mod sparse;
pub use sparse::CscMatrix;
