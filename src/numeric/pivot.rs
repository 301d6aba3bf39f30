//! Pivot row selection for one column of a front.

use crate::config::PivotFallback;
use crate::matrix::DenseBlock;

/// Tolerances and strategy consulted for every pivot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PivotRule<'a> {
    pub(crate) piv_toler: f64,
    pub(crate) diag_toler: f64,
    pub(crate) zero_tol: f64,
    pub(crate) fallback: PivotFallback,
    pub(crate) prefer_diagonal: bool,
    /// Original column at each ordering position.
    pub(crate) qfill: &'a [usize],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Choice {
    /// Use front row `row`; `forced` when it does not clear the tolerance.
    Accept { row: usize, forced: bool },
    /// No usable pivot in this column.
    Defer,
}

impl PivotRule<'_> {
    /// Choose a pivot for front column `j` among rows `k..`.
    pub(crate) fn choose(&self, w: &DenseBlock, rows: &[usize], cols: &[usize], k: usize, j: usize) -> Choice {
        let m = w.nrows();
        if k >= m {
            return Choice::Defer;
        }
        let col = w.col(j);
        let (imax, colmax) = (k..m).fold((k, 0.0f64), |(bi, bv), i| {
            let v = col[i].abs();
            if v > bv { (i, v) } else { (bi, bv) }
        });
        if colmax <= self.zero_tol {
            return match self.fallback {
                PivotFallback::Defer => Choice::Defer,
                PivotFallback::Force => Choice::Accept {
                    row: imax,
                    forced: true,
                },
            };
        }

        if self.prefer_diagonal {
            let target = self.qfill[cols[j]];
            if let Some(i) = (k..m).find(|&i| rows[i] == target) {
                let d = col[i].abs();
                if d > self.zero_tol && d >= self.diag_toler * colmax {
                    return Choice::Accept { row: i, forced: false };
                }
            }
        }

        // sparsest eligible row; larger magnitude, then lower position break ties
        let threshold = self.piv_toler * colmax;
        let mut best: Option<(usize, usize, f64)> = None;
        for i in k..m {
            let v = col[i].abs();
            if v < threshold || v <= self.zero_tol {
                continue;
            }
            let nnz = (j + 1..w.ncols()).filter(|&c| w.get(i, c) != 0.0).count();
            let better = match best {
                None => true,
                Some((_, bn, bv)) => nnz < bn || (nnz == bn && v > bv),
            };
            if better {
                best = Some((i, nnz, v));
            }
        }
        match best {
            Some((row, _, _)) => Choice::Accept { row, forced: false },
            None => Choice::Accept { row: imax, forced: false },
        }
    }
}
