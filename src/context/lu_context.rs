//! Analyze / factorize / solve pipeline with cached phases.
//!
//! `LuContext` owns the control parameters, the worker pool and the most
//! recent symbolic and numeric objects. The symbolic object is reused for
//! every new matrix with the same dimension and entry count; the numeric
//! object is replaced on each `factorize`.
//!
//! # Example
//! ```rust,ignore
//! let mut ctx = LuContext::new(Control::default())?;
//! ctx.factorize(&a)?;
//! ctx.solve_into(&b, &mut x, 1)?;
//! ```

use crate::config::Control;
use crate::error::{LuError, Status};
use crate::matrix::CscMatrix;
use crate::numeric::{Numeric, factorize};
use crate::parallel::Scheduler;
use crate::solver::{LinearSolver, Rhs, SolveSystem};
use crate::symbolic::{Symbolic, analyze};
use crate::utils::residual::residual;
use crate::utils::stats::SolveStats;

#[derive(Debug)]
pub struct LuContext {
    control: Control,
    scheduler: Scheduler,
    symbolic: Option<Symbolic>,
    numeric: Option<Numeric>,
}

impl LuContext {
    pub fn new(control: Control) -> Result<Self, LuError> {
        control.validate()?;
        let scheduler = Scheduler::from_control(&control)?;
        Ok(Self {
            control,
            scheduler,
            symbolic: None,
            numeric: None,
        })
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run the symbolic analysis of `a`, replacing any cached factors.
    pub fn analyze(&mut self, a: &CscMatrix) -> Result<&Symbolic, LuError> {
        self.numeric = None;
        self.symbolic = None;
        Ok(self.symbolic.insert(analyze(a, &self.control)?))
    }

    /// Factorize `a`, analyzing first unless the cached analysis fits.
    pub fn factorize(&mut self, a: &CscMatrix) -> Result<&Numeric, LuError> {
        self.free_numeric();
        if !self.symbolic.as_ref().is_some_and(|s| s.fits(a)) {
            self.analyze(a)?;
        }
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or_else(|| LuError::Invalid("no symbolic analysis available".into()))?;
        let numeric = factorize(a, symbolic, &self.control, &self.scheduler)?;
        Ok(self.numeric.insert(numeric))
    }

    pub fn symbolic(&self) -> Option<&Symbolic> {
        self.symbolic.as_ref()
    }

    pub fn numeric(&self) -> Option<&Numeric> {
        self.numeric.as_ref()
    }

    /// Drop the cached numeric factors, keeping the analysis.
    pub fn free_numeric(&mut self) {
        if let Some(numeric) = self.numeric.take() {
            numeric.free();
        }
    }

    fn factors(&self) -> Result<&Numeric, LuError> {
        self.numeric
            .as_ref()
            .ok_or_else(|| LuError::Invalid("factorize a matrix before solving".into()))
    }

    /// Solve `system` with the cached factors.
    pub fn solve(&self, system: SolveSystem, nrhs: usize, rhs: Rhs<'_>) -> Result<(), LuError> {
        self.factors()?.solve(&self.scheduler, system, nrhs, rhs)
    }

    pub fn solve_in_place(&self, x: &mut [f64], nrhs: usize) -> Result<(), LuError> {
        self.factors()?.solve_in_place(&self.scheduler, x, nrhs)
    }

    pub fn solve_into(&self, b: &[f64], x: &mut [f64], nrhs: usize) -> Result<(), LuError> {
        self.factors()?.solve_into(&self.scheduler, b, x, nrhs)
    }
}

impl LinearSolver<CscMatrix, Vec<f64>> for LuContext {
    type Error = LuError;
    type Scalar = f64;

    /// Factorize `a` and solve A·x = b; `x` is resized to the dimension of `a`.
    fn solve(&mut self, a: &CscMatrix, b: &Vec<f64>, x: &mut Vec<f64>) -> Result<SolveStats<f64>, LuError> {
        let rcond = self.factorize(a)?.rcond();
        x.resize(a.ncols(), 0.0);
        self.solve_into(b, x, 1)?;
        let r = residual(a, x, b, 1)?;
        Ok(SolveStats {
            final_residual: r.resid,
            anorm: r.anorm,
            xnorm: r.xnorm,
            rcond,
            status: Status::Success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laplacian(n: usize) -> CscMatrix {
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 2.0));
            if i > 0 {
                t.push((i, i - 1, -1.0));
                t.push((i - 1, i, -1.0));
            }
        }
        CscMatrix::from_triplets(n, n, &t).unwrap()
    }

    #[test]
    fn linear_solver_interface() {
        let a = laplacian(8);
        let b = vec![1.0; 8];
        let mut x = Vec::new();
        let mut ctx = LuContext::new(Control::default().with_threads(2)).unwrap();
        let stats = LinearSolver::solve(&mut ctx, &a, &b, &mut x).unwrap();
        assert!(stats.converged(1e-12));
        assert_eq!(x.len(), 8);
    }

    #[test]
    fn analysis_is_reused_for_same_pattern() {
        let mut ctx = LuContext::new(Control::default().with_threads(1)).unwrap();
        ctx.factorize(&laplacian(5)).unwrap();
        let before = ctx.symbolic().map(|s| s.qfill().to_vec());
        ctx.factorize(&laplacian(5)).unwrap();
        assert_eq!(ctx.symbolic().map(|s| s.qfill().to_vec()), before);
        ctx.factorize(&laplacian(6)).unwrap();
        assert_eq!(ctx.symbolic().map(|s| s.n()), Some(6));
    }

    #[test]
    fn new_pattern_is_reanalyzed() {
        let diag_plus = |i: usize, j: usize| {
            CscMatrix::from_triplets(3, 3, &[(0, 0, 2.0), (1, 1, 2.0), (2, 2, 2.0), (i, j, 1.0)])
                .unwrap()
        };
        let mut ctx = LuContext::new(Control::default().with_threads(1)).unwrap();
        let b = vec![1.0, 2.0, 3.0];
        let mut x = Vec::new();
        for a in [diag_plus(0, 1), diag_plus(0, 2)] {
            let stats = LinearSolver::solve(&mut ctx, &a, &b, &mut x).unwrap();
            assert!(stats.converged(1e-12));
            assert!(ctx.symbolic().is_some_and(|s| s.fits(&a)));
        }
    }

    #[test]
    fn solving_without_factors_is_invalid() {
        let ctx = LuContext::new(Control::default().with_threads(1)).unwrap();
        let mut x = vec![1.0; 3];
        assert!(matches!(ctx.solve_in_place(&mut x, 1), Err(LuError::Invalid(_))));
    }
}
