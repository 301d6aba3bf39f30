use thiserror::Error;

// Unified error type for parlu

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    #[error("out of memory: {0}")]
    OutOfMemory(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("matrix is numerically singular ({deficiency} missing pivots)")]
    Singular { deficiency: usize },
    #[error("problem too large for the dense kernels: {0}")]
    TooLarge(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    /// Raised by sibling tasks once the shared failure flag is set; the
    /// original fatal error is what reaches the caller.
    #[error("factorization cancelled after a fatal error in another task")]
    Cancelled,
}

impl LuError {
    /// Classic integer status code: 0 success, -1 out of memory, -2 invalid,
    /// -3 singular, -4 too large.
    pub fn info_code(&self) -> i32 {
        match self {
            LuError::OutOfMemory(_) => -1,
            LuError::Invalid(_) | LuError::ThreadPool(_) | LuError::Cancelled => -2,
            LuError::Singular { .. } => -3,
            LuError::TooLarge(_) => -4,
        }
    }
}

/// Outcome of a numeric factorization that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// At least one column found no acceptable pivot. Factors can be inspected
    /// but not used for solving.
    Singular,
}

impl Status {
    pub fn info_code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Singular => -3,
        }
    }
}

/// Allocate a zeroed `f64` buffer, reporting allocation failure instead of aborting.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<f64>, LuError> {
    let mut v: Vec<f64> = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| LuError::OutOfMemory(format!("cannot allocate {len} entries")))?;
    v.resize(len, 0.0);
    Ok(v)
}
