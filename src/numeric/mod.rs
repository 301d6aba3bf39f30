//! Numeric phase: frontal assembly, dense factorization and the factor object.
//!
//! [`factorize`] turns a matrix and its [`Symbolic`] object into a
//! [`Numeric`] object: per-front L and U blocks in post-order, the global row
//! and column permutations, the row scale and a set of diagnostics. The
//! `Numeric` object is immutable; dropping it (or calling
//! [`Numeric::free`]) releases every factor block.

pub mod assemble;
pub mod factorize;
pub mod front;
pub mod panel;
pub mod pivot;

pub use factorize::factorize;
pub use front::{FrontFactors, FrontFlags, FrontStatus};

use crate::error::{LuError, Status};
use crate::parallel::kernels::{KernelCounts, KernelPolicy};
use crate::symbolic::{Symbolic, front_flops};
use crate::utils::permute::{check_permutation, invert};

/// Summary numbers of a numeric factorization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorStats {
    /// Entries of L, unit diagonal included.
    pub lnz: usize,
    /// Entries of U, diagonal included.
    pub unz: usize,
    pub flops: f64,
    pub min_udiag: f64,
    pub max_udiag: f64,
    /// `min_udiag / max_udiag`, a cheap reciprocal condition estimate.
    pub rcond: f64,
    pub off_diagonal_pivots: usize,
    /// Pivotal columns without an acceptable pivot, forced pivots included.
    pub deficiency: usize,
    /// Entries moved from children into parents.
    pub extend_add_entries: usize,
    pub kernel_calls: KernelCounts,
}

/// LU factors of P · S⁻¹ A · Q, where S scales the rows.
#[derive(Debug)]
pub struct Numeric {
    n: usize,
    status: Status,
    fronts: Vec<FrontFactors>,
    front_status: Vec<FrontStatus>,
    p: Vec<usize>,
    q: Vec<usize>,
    row_scale: Vec<f64>,
    row_pos: Vec<usize>,
    col_pos: Vec<usize>,
    pivot_start: Vec<usize>,
    stats: FactorStats,
    policy: KernelPolicy,
}

impl Numeric {
    pub(crate) fn from_fronts(
        symbolic: &Symbolic,
        fronts: Vec<FrontFactors>,
        front_status: Vec<FrontStatus>,
        row_scale: Vec<f64>,
        policy: KernelPolicy,
        kernel_calls: KernelCounts,
        extend_add_entries: usize,
    ) -> Result<Self, LuError> {
        let n = symbolic.n();
        let qfill = symbolic.qfill();
        let tree = symbolic.tree();

        // P: pivot rows in front order, then rows left at the roots, then empty rows
        let mut p = Vec::with_capacity(n);
        let mut pivot_start = Vec::with_capacity(fronts.len());
        for fr in &fronts {
            pivot_start.push(p.len());
            p.extend_from_slice(&fr.rows[..fr.pivots()]);
        }
        for &r in tree.roots() {
            let fr = &fronts[r];
            p.extend_from_slice(&fr.rows[fr.pivots()..]);
        }
        let mut placed = vec![false; n];
        for &r in &p {
            if let Some(slot) = placed.get_mut(r) {
                *slot = true;
            }
        }
        p.extend((0..n).filter(|&r| !placed[r]));
        check_permutation(&p, n, "row permutation")?;

        // Q: pivoted columns in front order, then every deferred column
        let mut q = Vec::with_capacity(n);
        let mut col_pos = vec![0usize; n];
        let pivoted = fronts.iter().map(|fr| &fr.cols[..fr.pivots()]);
        let deferred = fronts.iter().map(|fr| &fr.cols[fr.pivots()..fr.npiv]);
        for &c in pivoted.chain(deferred).flatten() {
            col_pos[c] = q.len();
            q.push(qfill[c]);
        }
        check_permutation(&q, n, "column permutation")?;
        let row_pos = invert(&p);

        let mut stats = FactorStats {
            extend_add_entries,
            kernel_calls,
            ..FactorStats::default()
        };
        let (mut umin, mut umax) = (f64::INFINITY, 0.0f64);
        for fr in &fronts {
            let k = fr.pivots();
            stats.lnz += fr.lnz();
            stats.unz += fr.unz();
            stats.flops += front_flops(fr.rows.len(), fr.cols.len(), k);
            stats.off_diagonal_pivots += fr.off_diagonal;
            stats.deficiency += fr.npiv - k + fr.forced;
            for d in fr.udiag() {
                umin = umin.min(d.abs());
                umax = umax.max(d.abs());
            }
        }
        if stats.deficiency > 0 || !umin.is_finite() {
            umin = 0.0;
        }
        stats.min_udiag = umin;
        stats.max_udiag = umax;
        stats.rcond = if n == 0 {
            1.0
        } else if umax > 0.0 {
            umin / umax
        } else {
            0.0
        };

        let status = if stats.deficiency > 0 {
            log::warn!(
                "matrix is singular: {} of {n} pivots missing or forced",
                stats.deficiency
            );
            Status::Singular
        } else {
            Status::Success
        };
        log::info!(
            "factorization: n = {n}, nnz(L) = {}, nnz(U) = {}, {:.3e} flops, rcond {:.3e}, {} off-diagonal pivots",
            stats.lnz,
            stats.unz,
            stats.flops,
            stats.rcond,
            stats.off_diagonal_pivots
        );

        Ok(Self {
            n,
            status,
            fronts,
            front_status,
            p,
            q,
            row_scale,
            row_pos,
            col_pos,
            pivot_start,
            stats,
            policy,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Row permutation: row `p[k]` of A is the k-th pivot row.
    pub fn p(&self) -> &[usize] {
        &self.p
    }

    /// Column permutation: column `q[k]` of A is the k-th pivot column.
    pub fn q(&self) -> &[usize] {
        &self.q
    }

    /// Row scale factors (all ones when scaling is off).
    pub fn row_scale(&self) -> &[f64] {
        &self.row_scale
    }

    pub fn stats(&self) -> &FactorStats {
        &self.stats
    }

    pub fn lnz(&self) -> usize {
        self.stats.lnz
    }

    pub fn unz(&self) -> usize {
        self.stats.unz
    }

    pub fn flop_count(&self) -> f64 {
        self.stats.flops
    }

    pub fn min_udiag(&self) -> f64 {
        self.stats.min_udiag
    }

    pub fn max_udiag(&self) -> f64 {
        self.stats.max_udiag
    }

    pub fn rcond(&self) -> f64 {
        self.stats.rcond
    }

    pub fn off_diagonal_pivots(&self) -> usize {
        self.stats.off_diagonal_pivots
    }

    pub fn deficiency(&self) -> usize {
        self.stats.deficiency
    }

    pub fn extend_add_entries(&self) -> usize {
        self.stats.extend_add_entries
    }

    pub fn kernel_calls(&self) -> KernelCounts {
        self.stats.kernel_calls
    }

    pub fn nfronts(&self) -> usize {
        self.fronts.len()
    }

    pub fn front(&self, f: usize) -> &FrontFactors {
        &self.fronts[f]
    }

    pub fn front_status(&self, f: usize) -> FrontStatus {
        self.front_status[f]
    }

    /// Pivots found in front `f`.
    pub fn front_pivots(&self, f: usize) -> usize {
        self.fronts[f].pivots()
    }

    /// Release all factors.
    pub fn free(self) {
        log::debug!("releasing {} fronts", self.fronts.len());
    }

    pub(crate) fn fronts(&self) -> &[FrontFactors] {
        &self.fronts
    }

    /// Position of original row `r` in P.
    pub(crate) fn row_pos(&self) -> &[usize] {
        &self.row_pos
    }

    /// Position in Q of ordering position `c`.
    pub(crate) fn col_pos(&self) -> &[usize] {
        &self.col_pos
    }

    /// First position in P (and Q) of each front's pivots.
    pub(crate) fn pivot_start(&self) -> &[usize] {
        &self.pivot_start
    }

    pub(crate) fn policy(&self) -> &KernelPolicy {
        &self.policy
    }
}
