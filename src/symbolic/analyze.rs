//! Built-in symbolic analysis.
//!
//! Produces the frontal tree from the pattern of A and a column ordering:
//! column elimination tree, post-order, chain amalgamation into fronts, and a
//! row-merge simulation giving each front its contribution columns and an
//! estimate of its contribution rows.

use super::etree::{column_etree, post_order};
use super::tree::FrontSpec;
use super::{Pattern, Symbolic};
use crate::config::{Control, Ordering, Strategy};
use crate::error::LuError;
use crate::matrix::CscMatrix;
use crate::utils::permute::{check_permutation, invert};

/// Analyze the pattern of the square matrix `a`.
pub fn analyze(a: &CscMatrix, control: &Control) -> Result<Symbolic, LuError> {
    control.validate()?;
    let n = a.ncols();
    if a.nrows() != n {
        return Err(LuError::Invalid(format!(
            "matrix is {}x{n}, expected square",
            a.nrows()
        )));
    }

    let strategy = match control.strategy {
        Strategy::Auto => resolve_strategy(a),
        s => s,
    };
    let q: Vec<usize> = match &control.ordering {
        Ordering::Natural => (0..n).collect(),
        Ordering::Given(q) => {
            check_permutation(q, n, "column ordering")?;
            q.clone()
        }
    };

    let parent = column_etree(n, &q, |j| a.col(j).0);
    let post = post_order(&parent);
    let inv_post = invert(&post);
    let qfill: Vec<usize> = post.iter().map(|&v| q[v]).collect();
    let parent: Vec<Option<usize>> = post
        .iter()
        .map(|&v| parent[v].map(|p| inv_post[p]))
        .collect();

    let fronts = build_fronts(a, &qfill, &parent, control.relaxed_amalgamation.max(1));
    let symbolic = Symbolic::new(n, Some(Pattern::of(a)), qfill, strategy, fronts)?;
    log::info!(
        "analysis: n = {n}, nnz = {}, {} fronts, {strategy:?} strategy, L/U bound {}/{}, {:.3e} flops",
        a.nnz(),
        symbolic.nfronts(),
        symbolic.lnz_bound(),
        symbolic.unz_bound(),
        symbolic.flop_bound()
    );
    Ok(symbolic)
}

/// Symmetric when the pattern is mostly symmetric and the diagonal mostly present.
fn resolve_strategy(a: &CscMatrix) -> Strategy {
    let n = a.ncols();
    let (mut offdiag, mut matched, mut diag) = (0usize, 0usize, 0usize);
    for j in 0..n {
        for &i in a.col(j).0 {
            if i == j {
                diag += 1;
                continue;
            }
            offdiag += 1;
            if a.col(i).0.binary_search(&j).is_ok() {
                matched += 1;
            }
        }
    }
    let symmetry = if offdiag == 0 {
        1.0
    } else {
        matched as f64 / offdiag as f64
    };
    log::debug!("pattern symmetry {symmetry:.3}, {diag} of {n} diagonal entries present");
    if symmetry >= 0.5 && diag as f64 >= 0.9 * n as f64 {
        Strategy::Symmetric
    } else {
        Strategy::Unsymmetric
    }
}

/// Merge chains into fronts and simulate the row-merge assembly.
fn build_fronts(
    a: &CscMatrix,
    qfill: &[usize],
    parent: &[Option<usize>],
    relax: usize,
) -> Vec<FrontSpec> {
    let n = qfill.len();
    let mut nchild = vec![0usize; n];
    for &p in parent.iter().flatten() {
        nchild[p] += 1;
    }

    // a column joins the previous front when it is that front's only parent
    let mut starts: Vec<usize> = Vec::new();
    let mut col_front = vec![0usize; n];
    for j in 0..n {
        let merge = match starts.last() {
            Some(&s) => parent[j - 1] == Some(j) && nchild[j] == 1 && j - s < relax,
            None => false,
        };
        if !merge {
            starts.push(j);
        }
        col_front[j] = starts.len() - 1;
    }
    let nf = starts.len();
    let end = |f: usize| starts.get(f + 1).copied().unwrap_or(n);
    let front_parent: Vec<Option<usize>> = (0..nf)
        .map(|f| parent[end(f) - 1].map(|p| col_front[p]))
        .collect();

    let col_pos = invert(qfill);
    let mut row_cols: Vec<Vec<usize>> = vec![Vec::new(); a.nrows()];
    for (j, &pos) in col_pos.iter().enumerate() {
        for &i in a.col(j).0 {
            row_cols[i].push(pos);
        }
    }
    let mut owned: Vec<Vec<usize>> = vec![Vec::new(); nf];
    for (i, cols) in row_cols.iter().enumerate() {
        if let Some(&lead) = cols.iter().min() {
            owned[col_front[lead]].push(i);
        }
    }
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nf];
    for (f, p) in front_parent.iter().enumerate() {
        if let Some(p) = *p {
            children[p].push(f);
        }
    }

    let mut mark = vec![usize::MAX; n];
    let mut fronts: Vec<FrontSpec> = Vec::with_capacity(nf);
    for f in 0..nf {
        let (first, last) = (starts[f], end(f));
        let mut cols = Vec::new();
        let mut rows = owned[f].len();
        let owned_cols = owned[f].iter().flat_map(|&i| row_cols[i].iter().copied());
        let child_cols = children[f]
            .iter()
            .flat_map(|&c| fronts[c].cb_cols.iter().copied());
        for c in owned_cols.chain(child_cols) {
            if c >= last && mark[c] != f {
                mark[c] = f;
                cols.push(c);
            }
        }
        rows += children[f].iter().map(|&c| fronts[c].cb_rows).sum::<usize>();
        cols.sort_unstable();
        let npiv = last - first;
        fronts.push(FrontSpec {
            parent: front_parent[f],
            first_col: first,
            npiv,
            cb_rows: rows.saturating_sub(npiv),
            cb_cols: cols,
        });
    }
    fronts
}
