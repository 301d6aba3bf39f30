//! Forward and backward substitution over the frontal factors.
//!
//! Both sweeps work on an `n × nrhs` column-major block. `lsolve` expects it
//! in pivot-row order (the order of P) and walks the fronts in post-order;
//! `usolve` leaves the result in pivot-column order (the order of Q) and walks
//! them in reverse. Each front touches the rows of its own pivots plus, through
//! L21 and U12, rows belonging to its ancestors.

use crate::error::LuError;
use crate::matrix::DenseBlock;
use crate::numeric::Numeric;
use crate::parallel::kernels::{KernelCounters, gemm, trsm_unit_lower, trsm_upper};
use faer::MatMut;

/// Solve L·y = x in place.
pub(crate) fn lsolve(
    numeric: &Numeric,
    counters: &KernelCounters,
    x: &mut [f64],
    nrhs: usize,
) -> Result<(), LuError> {
    let n = numeric.n();
    let policy = numeric.policy();
    let row_pos = numeric.row_pos();
    for (fr, &g0) in numeric.fronts().iter().zip(numeric.pivot_start()) {
        let k = fr.pivots();
        if k == 0 {
            continue;
        }
        let below = fr.l21().nrows();
        let mut update = DenseBlock::try_zeros(below, nrhs)?;
        {
            let mut xm = MatMut::from_column_major_slice_mut(&mut *x, n, nrhs);
            trsm_unit_lower(
                policy,
                counters,
                fr.pivot_block().as_ref(),
                xm.as_mut().submatrix_mut(g0, 0, k, nrhs),
            );
            let x1 = xm.as_ref().submatrix(g0, 0, k, nrhs);
            gemm(policy, counters, update.as_mut(), fr.l21().as_ref(), x1, 1.0);
        }
        for c in 0..nrhs {
            let xc = &mut x[c * n..(c + 1) * n];
            for (&r, &u) in fr.rows()[k..].iter().zip(update.col(c)) {
                xc[row_pos[r]] -= u;
            }
        }
    }
    Ok(())
}

/// Solve U·z = x in place.
pub(crate) fn usolve(
    numeric: &Numeric,
    counters: &KernelCounters,
    x: &mut [f64],
    nrhs: usize,
) -> Result<(), LuError> {
    let n = numeric.n();
    let policy = numeric.policy();
    let col_pos = numeric.col_pos();
    for (fr, &g0) in numeric.fronts().iter().zip(numeric.pivot_start()).rev() {
        let k = fr.pivots();
        if k == 0 {
            continue;
        }
        let right = &fr.cols()[k..];
        let mut known = DenseBlock::try_zeros(right.len(), nrhs)?;
        for c in 0..nrhs {
            let xc = &x[c * n..(c + 1) * n];
            for (dst, &col) in known.col_mut(c).iter_mut().zip(right) {
                *dst = xc[col_pos[col]];
            }
        }
        let mut xm = MatMut::from_column_major_slice_mut(&mut *x, n, nrhs);
        let mut x1 = xm.as_mut().submatrix_mut(g0, 0, k, nrhs);
        gemm(policy, counters, x1.as_mut(), fr.u12().as_ref(), known.as_ref(), -1.0);
        trsm_upper(policy, counters, fr.pivot_block().as_ref(), x1);
    }
    Ok(())
}
