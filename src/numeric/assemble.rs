//! Front assembly: scaled original rows plus extend-add of child blocks.

use super::front::Contribution;
use crate::error::LuError;
use crate::matrix::{CscMatrix, DenseBlock};
use crate::parallel::for_each_column;
use crate::symbolic::{FrontSpec, Symbolic};

/// Fronts with at least this many entries extend-add in parallel over columns.
const PARALLEL_ASSEMBLY: usize = 1 << 16;

/// Row-scaled copy of A stored by rows, columns given as ordering positions.
#[derive(Debug)]
pub(crate) struct ScaledRows {
    row_ptr: Vec<usize>,
    col_pos: Vec<usize>,
    vals: Vec<f64>,
    pub(crate) scale: Vec<f64>,
    /// Rows owned by each front, ascending.
    pub(crate) owned: Vec<Vec<usize>>,
}

impl ScaledRows {
    pub(crate) fn build(a: &CscMatrix, symbolic: &Symbolic, prescale: bool) -> Result<Self, LuError> {
        let n = symbolic.n();
        let mut scale = vec![0.0f64; n];
        let mut count = vec![0usize; n + 1];
        for (&i, &v) in a.row_idx().iter().zip(a.values()) {
            scale[i] = scale[i].max(v.abs());
            count[i + 1] += 1;
        }
        for s in scale.iter_mut() {
            if !prescale || *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }
        for i in 0..n {
            count[i + 1] += count[i];
        }
        let row_ptr = count.clone();
        let mut next = count;
        let nnz = a.nnz();
        let mut col_pos = vec![0usize; nnz];
        let mut vals = crate::error::try_zeroed(nnz)?;
        // positions ascend within each row since columns are visited in order
        for (k, &j) in symbolic.qfill().iter().enumerate() {
            let (rows, v) = a.col(j);
            for (&i, &aij) in rows.iter().zip(v) {
                let dst = next[i];
                col_pos[dst] = k;
                vals[dst] = aij / scale[i];
                next[i] += 1;
            }
        }

        let tree = symbolic.tree();
        let mut owned = vec![Vec::new(); tree.len()];
        for i in 0..n {
            if row_ptr[i] < row_ptr[i + 1] {
                owned[tree.front_of_col(col_pos[row_ptr[i]])].push(i);
            }
        }
        Ok(Self {
            row_ptr,
            col_pos,
            vals,
            scale,
            owned,
        })
    }

    /// Column positions and scaled values of row `i`.
    fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let r = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_pos[r.clone()], &self.vals[r])
    }
}

/// Dense front ready for factorization.
pub(crate) struct AssembledFront {
    pub(crate) w: DenseBlock,
    pub(crate) rows: Vec<usize>,
    pub(crate) cols: Vec<usize>,
    pub(crate) extend_add_entries: usize,
}

/// Assemble front `f` from its owned rows and its children's contributions
/// (given in child order). Consumed contributions are dropped on return.
pub(crate) fn assemble_front(
    f: usize,
    spec: &FrontSpec,
    scaled: &ScaledRows,
    qfill: &[usize],
    contribs: Vec<Contribution>,
    parallel: bool,
) -> Result<AssembledFront, LuError> {
    let mut cols: Vec<usize> = spec.pivot_range().collect();
    cols.extend_from_slice(&spec.cb_cols);
    let owned = &scaled.owned[f];
    let mut rows = owned.clone();
    for c in &contribs {
        rows.extend_from_slice(&c.rows);
    }
    let (m, nc) = (rows.len(), cols.len());
    let mut w = DenseBlock::try_zeros(m, nc)?;

    for (li, &i) in owned.iter().enumerate() {
        let (pos, vals) = scaled.row(i);
        for (&c, &v) in pos.iter().zip(vals) {
            let lj = cols.binary_search(&c).map_err(|_| {
                LuError::Invalid(format!(
                    "entry ({i}, {}) lies outside the structure of front {f}",
                    qfill[c]
                ))
            })?;
            w.col_mut(lj)[li] += v;
        }
    }

    // destination column of every child column; child rows are stacked after the owned rows
    let mut maps = Vec::with_capacity(contribs.len());
    let mut offset = owned.len();
    for c in &contribs {
        let map = c
            .cols
            .iter()
            .map(|col| {
                cols.binary_search(col).map_err(|_| {
                    LuError::Invalid(format!(
                        "contribution column {} is not part of front {f}",
                        qfill[*col]
                    ))
                })
            })
            .collect::<Result<Vec<usize>, LuError>>()?;
        maps.push((offset, map));
        offset += c.rows.len();
    }
    let extend_add_entries = contribs.iter().map(|c| c.block.len()).sum();

    if parallel && m * nc >= PARALLEL_ASSEMBLY && contribs.len() > 1 {
        let mut sources: Vec<Vec<Option<usize>>> = vec![vec![None; nc]; contribs.len()];
        for (src, (_, map)) in sources.iter_mut().zip(&maps) {
            for (jc, &jd) in map.iter().enumerate() {
                src[jd] = Some(jc);
            }
        }
        for_each_column(w.as_mut_slice(), m, |jd, dst| {
            for ((c, (off, _)), src) in contribs.iter().zip(&maps).zip(&sources) {
                if let Some(jc) = src[jd] {
                    add_into(&mut dst[*off..*off + c.rows.len()], c.block.col(jc));
                }
            }
        });
    } else {
        for (c, (off, map)) in contribs.iter().zip(&maps) {
            for (jc, &jd) in map.iter().enumerate() {
                add_into(&mut w.col_mut(jd)[*off..*off + c.rows.len()], c.block.col(jc));
            }
        }
    }

    Ok(AssembledFront {
        w,
        rows,
        cols,
        extend_add_entries,
    })
}

#[inline]
fn add_into(dst: &mut [f64], src: &[f64]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += *s;
    }
}
