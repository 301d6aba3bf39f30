//! Stateful front end that caches the phases of a direct solve.
//!
//! Modules:
//! - [`lu_context`]: `LuContext`, which keeps the analysis and factors of
//!   the last matrix and reuses the analysis for matrices of the same shape.
//!
//! # Example
//! ```rust,ignore
//! use parlu::context::LuContext;
//! let mut ctx = LuContext::new(Control::default())?;
//! ```

pub mod lu_context;
pub use lu_context::LuContext;
