//! Blocked partial LU of a dense front.
//!
//! Pivotal columns are processed in panels of `panel_width` candidates. Inside
//! a panel each accepted pivot is eliminated right-looking against the rest of
//! the panel (and against deferred columns, which always sit between the
//! accepted pivots and the next candidate). After the panel the columns to its
//! right receive the delayed update: a unit-lower triangular solve for the
//! panel's U rows, then one multiply for everything below them.

use super::pivot::{Choice, PivotRule};
use crate::matrix::DenseBlock;
use crate::parallel::kernels::{KernelCounters, KernelPolicy, gemm, trsm_unit_lower};

/// What happened while factorizing one front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PanelOutcome {
    /// Pivots found.
    pub(crate) pivots: usize,
    pub(crate) deferred: usize,
    pub(crate) forced: usize,
    pub(crate) off_diagonal: usize,
}

/// Factorize the first `npiv` columns of `w` in place.
///
/// On return rows `0..pivots` of `w`/`rows` are the pivot rows and columns
/// `0..pivots` of `w`/`cols` the pivoted columns, followed by the deferred
/// ones up to `npiv`. `w[pivots.., npiv..]` holds the Schur complement.
#[allow(clippy::too_many_arguments)]
pub(crate) fn factorize_front(
    w: &mut DenseBlock,
    rows: &mut [usize],
    cols: &mut [usize],
    npiv: usize,
    panel_width: usize,
    rule: &PivotRule<'_>,
    policy: &KernelPolicy,
    counters: &KernelCounters,
) -> PanelOutcome {
    let (m, nc) = (w.nrows(), w.ncols());
    let mut out = PanelOutcome::default();
    let mut k = 0;
    let mut c0 = 0;
    while c0 < npiv {
        let c1 = (c0 + panel_width.max(1)).min(npiv);
        let k0 = k;
        for j in c0..c1 {
            match rule.choose(w, rows, cols, k, j) {
                Choice::Accept { row, forced } => {
                    w.swap_rows(k, row);
                    rows.swap(k, row);
                    // the column at k is the oldest deferred one, if any
                    w.swap_cols(k, j);
                    cols.swap(k, j);
                    if forced {
                        out.forced += 1;
                    }
                    if rows[k] != rule.qfill[cols[k]] {
                        out.off_diagonal += 1;
                    }
                    eliminate(w, k, c1);
                    k += 1;
                }
                Choice::Defer => {
                    out.deferred += 1;
                    log::warn!(
                        "no acceptable pivot for column {} (front column {j})",
                        rule.qfill[cols[j]]
                    );
                }
            }
        }

        let (k1, kp) = (k, k - k0);
        if kp > 0 && c1 < nc {
            let (top_left, top_right, bottom_left, bottom_right) = w.as_mut().split_at_mut(k1, c1);
            let l11 = top_left.as_ref().submatrix(k0, k0, kp, kp);
            let mut u12 = top_right.submatrix_mut(k0, 0, kp, nc - c1);
            trsm_unit_lower(policy, counters, l11, u12.as_mut());
            if k1 < m {
                let l21 = bottom_left.as_ref().submatrix(0, k0, m - k1, kp);
                gemm(policy, counters, bottom_right, l21, u12.as_ref(), -1.0);
            }
        }
        c0 = c1;
    }
    out.pivots = k;
    out
}

/// Scale column `k` below the pivot and update columns `k+1..c1` in rows `k+1..`.
fn eliminate(w: &mut DenseBlock, k: usize, c1: usize) {
    let m = w.nrows();
    let pivot = w.get(k, k);
    {
        let lcol = &mut w.col_mut(k)[k + 1..];
        if pivot == 0.0 {
            // forced zero pivot: leave the L column empty
            lcol.iter_mut().for_each(|v| *v = 0.0);
        } else {
            lcol.iter_mut().for_each(|v| *v /= pivot);
        }
    }
    if k + 1 >= m {
        return;
    }
    let (left, right) = w.as_mut_slice().split_at_mut((k + 1) * m);
    let lcol = &left[k * m + k + 1..(k + 1) * m];
    for (c, col) in right.chunks_exact_mut(m).enumerate() {
        if k + 1 + c >= c1 {
            break;
        }
        let u = col[k];
        if u == 0.0 {
            continue;
        }
        for (dst, &l) in col[k + 1..].iter_mut().zip(lcol) {
            *dst -= l * u;
        }
    }
}
