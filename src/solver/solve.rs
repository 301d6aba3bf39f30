//! One solve entry point for every system, RHS count and output placement.

use super::triangular::{lsolve, usolve};
use crate::error::{LuError, Status, try_zeroed};
use crate::numeric::Numeric;
use crate::parallel::Scheduler;
use crate::parallel::kernels::KernelCounters;
use crate::utils::permute::{inv_perm, perm};

/// Which system to solve with the factors of P·S⁻¹A·Q = L·U.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveSystem {
    /// A·x = b, with permutations and row scaling applied.
    #[default]
    A,
    /// L·x = b in the permuted space.
    L,
    /// U·x = b in the permuted space.
    U,
}

/// Where the right-hand sides come from and where the solution goes.
#[derive(Debug)]
pub enum Rhs<'a> {
    /// Overwrite the right-hand sides with the solution.
    InPlace(&'a mut [f64]),
    /// Read `b`, write `x`.
    Separate { b: &'a [f64], x: &'a mut [f64] },
}

impl Numeric {
    /// Solve `system` for `nrhs` column-major right-hand sides of length n.
    pub fn solve(
        &self,
        scheduler: &Scheduler,
        system: SolveSystem,
        nrhs: usize,
        rhs: Rhs<'_>,
    ) -> Result<(), LuError> {
        if self.status() == Status::Singular {
            return Err(LuError::Singular {
                deficiency: self.deficiency(),
            });
        }
        let n = self.n();
        let len = n
            .checked_mul(nrhs)
            .ok_or_else(|| LuError::TooLarge(format!("{n} x {nrhs} right-hand side")))?;
        let (b, x) = match rhs {
            Rhs::InPlace(x) => (None, x),
            Rhs::Separate { b, x } => (Some(b), x),
        };
        if x.len() != len || b.is_some_and(|b| b.len() != len) {
            return Err(LuError::Invalid(format!(
                "right-hand side must hold {len} entries ({n} rows, {nrhs} columns)"
            )));
        }

        let counters = KernelCounters::default();
        scheduler.install(|| match system {
            SolveSystem::A => {
                let mut work = try_zeroed(len)?;
                perm(self.p(), Some(self.row_scale()), b.unwrap_or(&*x), &mut work, nrhs)?;
                lsolve(self, &counters, &mut work, nrhs)?;
                usolve(self, &counters, &mut work, nrhs)?;
                inv_perm(self.q(), None, &work, x, nrhs)
            }
            SolveSystem::L => {
                if let Some(b) = b {
                    x.copy_from_slice(b);
                }
                lsolve(self, &counters, x, nrhs)
            }
            SolveSystem::U => {
                if let Some(b) = b {
                    x.copy_from_slice(b);
                }
                usolve(self, &counters, x, nrhs)
            }
        })?;
        log::debug!("{system:?} solve with {nrhs} rhs: {:?}", counters.snapshot());
        Ok(())
    }

    /// Solve A·X = B, overwriting B with X.
    pub fn solve_in_place(&self, scheduler: &Scheduler, x: &mut [f64], nrhs: usize) -> Result<(), LuError> {
        self.solve(scheduler, SolveSystem::A, nrhs, Rhs::InPlace(x))
    }

    /// Solve A·X = B into a separate buffer.
    pub fn solve_into(
        &self,
        scheduler: &Scheduler,
        b: &[f64],
        x: &mut [f64],
        nrhs: usize,
    ) -> Result<(), LuError> {
        self.solve(scheduler, SolveSystem::A, nrhs, Rhs::Separate { b, x })
    }
}
