//! Compressed-column sparse matrix on top of Faer.
//!
//! `CscMatrix` is the input container consumed by the analysis and the
//! numeric factorization. It wraps an owning `faer::sparse::SparseColMat`
//! and exposes the raw column pointers, row indices and values the frontal
//! engine reads column by column.

use crate::core::traits::{MatVec, Norm1};
use crate::error::LuError;
use faer::sparse::{SparseColMat, SymbolicSparseColMat, Triplet};

#[derive(Debug, Clone)]
pub struct CscMatrix {
    inner: SparseColMat<usize, f64>,
}

impl CscMatrix {
    /// Build a CSC from raw col-ptr, row-idx, and values.
    ///
    /// Row indices within a column must be strictly increasing.
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, LuError> {
        if col_ptr.len() != ncols + 1 {
            return Err(LuError::Invalid(format!(
                "col_ptr has length {}, expected {}",
                col_ptr.len(),
                ncols + 1
            )));
        }
        if col_ptr[0] != 0 || col_ptr[ncols] != row_idx.len() || row_idx.len() != values.len() {
            return Err(LuError::Invalid(
                "col_ptr, row_idx and values are inconsistent".into(),
            ));
        }
        for j in 0..ncols {
            if col_ptr[j] > col_ptr[j + 1] {
                return Err(LuError::Invalid(format!("col_ptr decreases at column {j}")));
            }
            let rows = &row_idx[col_ptr[j]..col_ptr[j + 1]];
            if rows.iter().any(|&i| i >= nrows) {
                return Err(LuError::Invalid(format!("row index out of range in column {j}")));
            }
            if rows.windows(2).any(|w| w[0] >= w[1]) {
                return Err(LuError::Invalid(format!(
                    "row indices of column {j} are not strictly increasing"
                )));
            }
        }
        // Build symbolic structure; `None` means "no separate col_nnz"
        let symbolic = SymbolicSparseColMat::new_checked(nrows, ncols, col_ptr, None, row_idx);
        let inner = SparseColMat::new(symbolic, values);
        Ok(Self { inner })
    }

    /// Build from `(row, col, value)` triplets; duplicate entries are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        entries: &[(usize, usize, f64)],
    ) -> Result<Self, LuError> {
        if let Some(&(i, j, _)) = entries.iter().find(|&&(i, j, _)| i >= nrows || j >= ncols) {
            return Err(LuError::Invalid(format!(
                "triplet ({i}, {j}) outside a {nrows}x{ncols} matrix"
            )));
        }
        let triplets: Vec<Triplet<usize, usize, f64>> = entries
            .iter()
            .map(|&(i, j, v)| Triplet::new(i, j, v))
            .collect();
        let inner = SparseColMat::<usize, f64>::try_new_from_triplets(nrows, ncols, &triplets)
            .map_err(|e| LuError::Invalid(format!("sparse matrix build failed: {e:?}")))?;
        Ok(Self { inner })
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    pub fn nnz(&self) -> usize {
        self.row_idx().len()
    }

    pub fn col_ptr(&self) -> &[usize] {
        self.inner.symbolic().col_ptr()
    }

    pub fn row_idx(&self) -> &[usize] {
        self.inner.symbolic().row_idx()
    }

    pub fn values(&self) -> &[f64] {
        self.inner.val()
    }

    /// Row indices and values of column `j`.
    pub fn col(&self, j: usize) -> (&[usize], &[f64]) {
        let cp = self.col_ptr();
        let range = cp[j]..cp[j + 1];
        (&self.row_idx()[range.clone()], &self.values()[range])
    }

    /// Y = A · X for `nrhs` column-major right-hand columns.
    pub fn matvec_multi(&self, x: &[f64], y: &mut [f64], nrhs: usize) {
        let (m, n) = (self.nrows(), self.ncols());
        assert_eq!(x.len(), n * nrhs, "Input block X has incorrect length");
        assert_eq!(y.len(), m * nrhs, "Output block Y has incorrect length");
        y.iter_mut().for_each(|yi| *yi = 0.0);
        for c in 0..nrhs {
            let xc = &x[c * n..(c + 1) * n];
            let yc = &mut y[c * m..(c + 1) * m];
            for j in 0..n {
                let xj = xc[j];
                if xj == 0.0 {
                    continue;
                }
                let (rows, vals) = self.col(j);
                for (&i, &v) in rows.iter().zip(vals) {
                    yc[i] += v * xj;
                }
            }
        }
    }
}

impl MatVec<[f64]> for CscMatrix {
    fn matvec(&self, x: &[f64], y: &mut [f64]) {
        self.matvec_multi(x, y, 1);
    }
}

impl MatVec<Vec<f64>> for CscMatrix {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.matvec_multi(x, y, 1);
    }
}

impl Norm1 for CscMatrix {
    fn norm1(&self) -> f64 {
        (0..self.ncols())
            .map(|j| self.col(j).1.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }
}
