//! Dense kernel dispatch: multiply and triangular solve.
//!
//! Every call is classified by size. Calls whose dimensions are all below
//! `trivial` run as plain loops without touching the kernel library; calls
//! above the `worthwhile_*` thresholds are split recursively into
//! independently schedulable halves (joined on the current pool), each leaf
//! calling Faer sequentially; everything in between is a single sequential
//! Faer call. The split points depend only on the shapes, so results do not
//! depend on the number of worker threads.

use crate::config::Control;
use crate::parallel::join;
use faer::linalg::matmul::matmul;
use faer::linalg::triangular_solve::{
    solve_unit_lower_triangular_in_place, solve_upper_triangular_in_place,
};
use faer::{Accum, MatMut, MatRef, Par};
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a dense kernel call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Inline,
    Single,
    Tasked,
}

/// Size thresholds steering the dispatch of dense kernel calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelPolicy {
    pub trivial: usize,
    pub worthwhile_dgemm: usize,
    pub worthwhile_trsm: usize,
}

impl KernelPolicy {
    pub fn from_control(control: &Control) -> Self {
        Self {
            trivial: control.trivial,
            worthwhile_dgemm: control.worthwhile_dgemm.max(2),
            worthwhile_trsm: control.worthwhile_trsm.max(2),
        }
    }

    /// Dispatch class of C(m×n) += A(m×k)·B(k×n).
    pub fn classify_gemm(&self, m: usize, n: usize, k: usize) -> Dispatch {
        if m < self.trivial && n < self.trivial && k < self.trivial {
            Dispatch::Inline
        } else if m >= self.worthwhile_dgemm || n >= self.worthwhile_dgemm {
            Dispatch::Tasked
        } else {
            Dispatch::Single
        }
    }

    /// Dispatch class of a k×k triangular solve against `nrhs` columns.
    pub fn classify_trsm(&self, k: usize, nrhs: usize) -> Dispatch {
        if k < self.trivial && nrhs < self.trivial {
            Dispatch::Inline
        } else if nrhs >= self.worthwhile_trsm {
            Dispatch::Tasked
        } else {
            Dispatch::Single
        }
    }
}

/// Snapshot of how many kernel calls ran in each dispatch class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelCounts {
    pub inline: usize,
    pub single: usize,
    pub tasked: usize,
}

#[derive(Debug, Default)]
pub(crate) struct KernelCounters {
    inline: AtomicUsize,
    single: AtomicUsize,
    tasked: AtomicUsize,
}

impl KernelCounters {
    fn record(&self, d: Dispatch) {
        let slot = match d {
            Dispatch::Inline => &self.inline,
            Dispatch::Single => &self.single,
            Dispatch::Tasked => &self.tasked,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> KernelCounts {
        KernelCounts {
            inline: self.inline.load(Ordering::Relaxed),
            single: self.single.load(Ordering::Relaxed),
            tasked: self.tasked.load(Ordering::Relaxed),
        }
    }
}

/// C ← C + alpha·A·B.
pub(crate) fn gemm(
    policy: &KernelPolicy,
    counters: &KernelCounters,
    c: MatMut<'_, f64>,
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    alpha: f64,
) {
    let (m, n, k) = (c.nrows(), c.ncols(), a.ncols());
    debug_assert_eq!(a.nrows(), m);
    debug_assert_eq!(b.nrows(), k);
    debug_assert_eq!(b.ncols(), n);
    if m == 0 || n == 0 || k == 0 {
        return;
    }
    let d = policy.classify_gemm(m, n, k);
    counters.record(d);
    match d {
        Dispatch::Inline => gemm_inline(c, a, b, alpha),
        Dispatch::Single => matmul(c, Accum::Add, a, b, alpha, Par::Seq),
        Dispatch::Tasked => gemm_split(policy.worthwhile_dgemm, c, a, b, alpha),
    }
}

fn gemm_inline(mut c: MatMut<'_, f64>, a: MatRef<'_, f64>, b: MatRef<'_, f64>, alpha: f64) {
    for j in 0..c.ncols() {
        for p in 0..a.ncols() {
            let bpj = alpha * b[(p, j)];
            if bpj == 0.0 {
                continue;
            }
            for i in 0..c.nrows() {
                c[(i, j)] += a[(i, p)] * bpj;
            }
        }
    }
}

fn gemm_split(block: usize, c: MatMut<'_, f64>, a: MatRef<'_, f64>, b: MatRef<'_, f64>, alpha: f64) {
    let (m, n) = (c.nrows(), c.ncols());
    if m < block && n < block {
        matmul(c, Accum::Add, a, b, alpha, Par::Seq);
        return;
    }
    if n >= m {
        let mid = n / 2;
        let (c0, c1) = c.split_at_col_mut(mid);
        let (b0, b1) = b.split_at_col(mid);
        join(
            || gemm_split(block, c0, a, b0, alpha),
            || gemm_split(block, c1, a, b1, alpha),
        );
    } else {
        let mid = m / 2;
        let (c0, c1) = c.split_at_row_mut(mid);
        let (a0, a1) = a.split_at_row(mid);
        join(
            || gemm_split(block, c0, a0, b, alpha),
            || gemm_split(block, c1, a1, b, alpha),
        );
    }
}

#[derive(Clone, Copy)]
enum Tri {
    UnitLower,
    Upper,
}

/// B ← L⁻¹·B with L unit lower triangular (its diagonal is not read).
pub(crate) fn trsm_unit_lower(
    policy: &KernelPolicy,
    counters: &KernelCounters,
    l: MatRef<'_, f64>,
    b: MatMut<'_, f64>,
) {
    trsm(policy, counters, Tri::UnitLower, l, b);
}

/// B ← U⁻¹·B with U upper triangular.
pub(crate) fn trsm_upper(
    policy: &KernelPolicy,
    counters: &KernelCounters,
    u: MatRef<'_, f64>,
    b: MatMut<'_, f64>,
) {
    trsm(policy, counters, Tri::Upper, u, b);
}

fn trsm(
    policy: &KernelPolicy,
    counters: &KernelCounters,
    tri: Tri,
    t: MatRef<'_, f64>,
    b: MatMut<'_, f64>,
) {
    let (k, nrhs) = (b.nrows(), b.ncols());
    debug_assert_eq!(t.nrows(), k);
    debug_assert_eq!(t.ncols(), k);
    if k == 0 || nrhs == 0 {
        return;
    }
    let d = policy.classify_trsm(k, nrhs);
    counters.record(d);
    match d {
        Dispatch::Inline => trsm_inline(tri, t, b),
        Dispatch::Single => trsm_seq(tri, t, b),
        Dispatch::Tasked => trsm_split(policy.worthwhile_trsm, tri, t, b),
    }
}

fn trsm_inline(tri: Tri, t: MatRef<'_, f64>, mut b: MatMut<'_, f64>) {
    let k = t.nrows();
    for c in 0..b.ncols() {
        match tri {
            Tri::UnitLower => {
                for j in 0..k {
                    let xj = b[(j, c)];
                    for i in j + 1..k {
                        b[(i, c)] -= t[(i, j)] * xj;
                    }
                }
            }
            Tri::Upper => {
                for j in (0..k).rev() {
                    let xj = b[(j, c)] / t[(j, j)];
                    b[(j, c)] = xj;
                    for i in 0..j {
                        b[(i, c)] -= t[(i, j)] * xj;
                    }
                }
            }
        }
    }
}

fn trsm_seq(tri: Tri, t: MatRef<'_, f64>, b: MatMut<'_, f64>) {
    match tri {
        Tri::UnitLower => solve_unit_lower_triangular_in_place(t, b, Par::Seq),
        Tri::Upper => solve_upper_triangular_in_place(t, b, Par::Seq),
    }
}

fn trsm_split(block: usize, tri: Tri, t: MatRef<'_, f64>, b: MatMut<'_, f64>) {
    let n = b.ncols();
    if n < block {
        trsm_seq(tri, t, b);
        return;
    }
    let mid = n / 2;
    let (b0, b1) = b.split_at_col_mut(mid);
    join(
        || trsm_split(block, tri, t, b0),
        || trsm_split(block, tri, t, b1),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DenseBlock;
    use approx::assert_abs_diff_eq;

    fn block(m: usize, n: usize, seed: u64) -> DenseBlock {
        let data = (0..m * n)
            .map(|i| (((i as u64 * 2654435761 + seed) % 1000) as f64) / 500.0 - 1.0)
            .collect();
        DenseBlock::from_raw(m, n, data).unwrap()
    }

    fn reference_gemm(c: &DenseBlock, a: &DenseBlock, b: &DenseBlock, alpha: f64) -> Vec<f64> {
        let mut out = c.as_slice().to_vec();
        for j in 0..c.ncols() {
            for i in 0..c.nrows() {
                let s: f64 = (0..a.ncols()).map(|p| a.get(i, p) * b.get(p, j)).sum();
                out[i + j * c.nrows()] += alpha * s;
            }
        }
        out
    }

    #[test]
    fn classification_follows_thresholds() {
        let p = KernelPolicy { trivial: 4, worthwhile_dgemm: 8, worthwhile_trsm: 16 };
        assert_eq!(p.classify_gemm(3, 3, 3), Dispatch::Inline);
        assert_eq!(p.classify_gemm(3, 3, 4), Dispatch::Single);
        assert_eq!(p.classify_gemm(8, 2, 2), Dispatch::Tasked);
        assert_eq!(p.classify_trsm(2, 2), Dispatch::Inline);
        assert_eq!(p.classify_trsm(5, 15), Dispatch::Single);
        assert_eq!(p.classify_trsm(5, 16), Dispatch::Tasked);
    }

    #[test]
    fn gemm_agrees_across_dispatch_classes() {
        let p = KernelPolicy { trivial: 4, worthwhile_dgemm: 6, worthwhile_trsm: 4 };
        let counters = KernelCounters::default();
        for &(m, n, k) in &[(2, 3, 2), (5, 4, 5), (13, 11, 7)] {
            let a = block(m, k, 1);
            let b = block(k, n, 2);
            let mut c = block(m, n, 3);
            let expected = reference_gemm(&c, &a, &b, -1.0);
            gemm(&p, &counters, c.as_mut(), a.as_ref(), b.as_ref(), -1.0);
            for (x, y) in c.as_slice().iter().zip(&expected) {
                assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
            }
        }
        let counts = counters.snapshot();
        assert_eq!(counts, KernelCounts { inline: 1, single: 1, tasked: 1 });
    }

    #[test]
    fn triangular_solves_invert_products() {
        let p = KernelPolicy { trivial: 4, worthwhile_dgemm: 64, worthwhile_trsm: 3 };
        let counters = KernelCounters::default();
        let k = 6;
        let mut t = block(k, k, 7);
        for i in 0..k {
            t.as_mut()[(i, i)] = 4.0 + i as f64;
        }
        let x = block(k, 5, 9);
        for tri in [Tri::UnitLower, Tri::Upper] {
            // b = T x using only the relevant triangle
            let mut b = DenseBlock::try_zeros(k, 5).unwrap();
            for c in 0..5 {
                for i in 0..k {
                    let mut s = 0.0;
                    for j in 0..k {
                        let tij = match tri {
                            Tri::UnitLower if i == j => 1.0,
                            Tri::UnitLower if j < i => t.get(i, j),
                            Tri::Upper if j >= i => t.get(i, j),
                            _ => 0.0,
                        };
                        s += tij * x.get(j, c);
                    }
                    b.as_mut()[(i, c)] = s;
                }
            }
            trsm(&p, &counters, tri, t.as_ref(), b.as_mut());
            for (got, want) in b.as_slice().iter().zip(x.as_slice()) {
                assert_abs_diff_eq!(*got, *want, epsilon = 1e-10);
            }
        }
        assert_eq!(counters.snapshot().tasked, 2);
    }
}
