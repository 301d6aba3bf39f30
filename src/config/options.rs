//! Control options for analysis, factorization and solve.
//!
//! `Control` gathers every tunable the numeric engine consumes (pivot
//! tolerances, blocking, dense-kernel dispatch thresholds, scaling, thread
//! cap) together with the few knobs used by the built-in symbolic analysis.
//! Defaults match the values the frontal solver was tuned with.

use crate::error::LuError;

/// Pivoting strategy of the symbolic phase.
///
/// `Symmetric` makes the numeric phase prefer diagonal pivots; `Unsymmetric`
/// always picks among the column entries that clear `piv_toler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Let the analysis decide from the pattern symmetry and the diagonal.
    #[default]
    Auto,
    Unsymmetric,
    Symmetric,
}

/// Column ordering handed to the built-in analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Ordering {
    /// Columns in their original order.
    #[default]
    Natural,
    /// Caller-provided fill-reducing ordering: `q[k]` is the column placed at position `k`.
    Given(Vec<usize>),
}

/// What to do with a column whose entries are all at or below `zero_pivot_tol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotFallback {
    /// Leave the column without a pivot; it is moved behind the accepted
    /// pivots of its front and to the end of Q.
    #[default]
    Defer,
    /// Take the largest remaining entry as pivot regardless of tolerance,
    /// even when it is zero.
    Force,
}

/// Solver control parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// Tolerance for accepting sparse (off-diagonal) pivots, relative to the column max.
    pub piv_toler: f64,
    /// Tolerance for accepting the diagonal pivot under the symmetric strategy.
    pub diag_toler: f64,
    /// Column width of a panel in the blocked dense factorization.
    pub panel_width: usize,
    /// Kernel calls with every dimension below this run as plain loops.
    pub trivial: usize,
    /// Multiplies with a dimension at least this large are split into tasks.
    pub worthwhile_dgemm: usize,
    /// Triangular solves with at least this many right-hand columns are split into tasks.
    pub worthwhile_trsm: usize,
    /// Scale each row by its max absolute value before factorizing.
    pub prescale: bool,
    /// Largest number of pivot columns the analysis merges along a tree chain.
    pub relaxed_amalgamation: usize,
    pub strategy: Strategy,
    pub ordering: Ordering,
    /// Worker-thread cap; 0 means the hardware parallelism.
    pub max_threads: usize,
    /// A column whose largest candidate is at or below this is rank deficient.
    pub zero_pivot_tol: f64,
    pub pivot_fallback: PivotFallback,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            piv_toler: 0.1,
            diag_toler: 0.001,
            panel_width: 32,
            trivial: 4,
            worthwhile_dgemm: 512,
            worthwhile_trsm: 4096,
            prescale: true,
            relaxed_amalgamation: 32,
            strategy: Strategy::Auto,
            ordering: Ordering::Natural,
            max_threads: 0,
            zero_pivot_tol: 0.0,
            pivot_fallback: PivotFallback::Defer,
        }
    }
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of worker threads (0 = all hardware threads).
    pub fn with_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_panel_width(mut self, panel_width: usize) -> Self {
        self.panel_width = panel_width;
        self
    }

    pub fn with_prescale(mut self, prescale: bool) -> Self {
        self.prescale = prescale;
        self
    }

    pub fn with_pivot_fallback(mut self, fallback: PivotFallback) -> Self {
        self.pivot_fallback = fallback;
        self
    }

    /// Reject out-of-range values before any work starts.
    pub fn validate(&self) -> Result<(), LuError> {
        if !(self.piv_toler > 0.0 && self.piv_toler <= 1.0) {
            return Err(LuError::Invalid(format!(
                "piv_toler must lie in (0, 1], got {}",
                self.piv_toler
            )));
        }
        if !(self.diag_toler >= 0.0 && self.diag_toler <= 1.0) {
            return Err(LuError::Invalid(format!(
                "diag_toler must lie in [0, 1], got {}",
                self.diag_toler
            )));
        }
        if self.panel_width == 0 {
            return Err(LuError::Invalid("panel_width must be positive".into()));
        }
        if self.worthwhile_dgemm < 2 || self.worthwhile_trsm < 2 {
            return Err(LuError::Invalid(
                "worthwhile_dgemm and worthwhile_trsm must be at least 2".into(),
            ));
        }
        if !(self.zero_pivot_tol >= 0.0) {
            return Err(LuError::Invalid(format!(
                "zero_pivot_tol must be non-negative, got {}",
                self.zero_pivot_tol
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = Control::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.panel_width, 32);
        assert_eq!(c.strategy, Strategy::Auto);
    }

    #[test]
    fn rejects_bad_tolerances() {
        let mut c = Control::default();
        c.piv_toler = 0.0;
        assert!(matches!(c.validate(), Err(LuError::Invalid(_))));
        let mut c = Control::default();
        c.diag_toler = f64::NAN;
        assert!(matches!(c.validate(), Err(LuError::Invalid(_))));
        let c = Control::default().with_panel_width(0);
        assert!(c.validate().is_err());
    }
}
