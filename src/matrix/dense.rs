//! Column-major dense blocks backed by a plain `Vec<f64>`.
//!
//! Front buffers, stored factors and contribution blocks are all
//! `DenseBlock`s. Storage is allocated fallibly so that running out of
//! memory surfaces as `LuError::OutOfMemory`; views into the storage are
//! regular Faer `MatRef`/`MatMut` so they can be handed to the dense kernels.

use crate::error::{LuError, try_zeroed};
use faer::{MatMut, MatRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseBlock {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
}

/// Refuse shapes the dense kernels cannot address.
pub(crate) fn check_dims(nrows: usize, ncols: usize) -> Result<usize, LuError> {
    let limit = i32::MAX as usize;
    if nrows > limit || ncols > limit {
        return Err(LuError::TooLarge(format!(
            "dense block {nrows}x{ncols} exceeds the kernel index range"
        )));
    }
    nrows
        .checked_mul(ncols)
        .filter(|&len| len <= isize::MAX as usize / std::mem::size_of::<f64>())
        .ok_or_else(|| LuError::TooLarge(format!("dense block {nrows}x{ncols} overflows")))
}

impl DenseBlock {
    /// Zero-filled `nrows × ncols` block.
    pub fn try_zeros(nrows: usize, ncols: usize) -> Result<Self, LuError> {
        let len = check_dims(nrows, ncols)?;
        Ok(Self {
            nrows,
            ncols,
            data: try_zeroed(len)?,
        })
    }

    /// Construct from raw column-major storage.
    pub fn from_raw(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self, LuError> {
        if data.len() != check_dims(nrows, ncols)? {
            return Err(LuError::Invalid(format!(
                "{} values cannot fill a {nrows}x{ncols} block",
                data.len()
            )));
        }
        Ok(Self { nrows, ncols, data })
    }

    /// Owned copy of a (possibly strided) view.
    pub fn copy_of(view: MatRef<'_, f64>) -> Result<Self, LuError> {
        let mut out = Self::try_zeros(view.nrows(), view.ncols())?;
        for j in 0..view.ncols() {
            let col = &mut out.data[j * view.nrows()..(j + 1) * view.nrows()];
            for (i, dst) in col.iter_mut().enumerate() {
                *dst = view[(i, j)];
            }
        }
        Ok(out)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i + j * self.nrows]
    }

    /// Column `j` as a contiguous slice.
    pub fn col(&self, j: usize) -> &[f64] {
        &self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    pub fn col_mut(&mut self, j: usize) -> &mut [f64] {
        &mut self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    /// Swap two whole rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in self.data.chunks_exact_mut(self.nrows) {
            col.swap(a, b);
        }
    }

    /// Swap two whole columns.
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let m = self.nrows;
        let (left, right) = self.data.split_at_mut(hi * m);
        left[lo * m..(lo + 1) * m].swap_with_slice(&mut right[..m]);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn as_ref(&self) -> MatRef<'_, f64> {
        MatRef::from_column_major_slice(&self.data, self.nrows, self.ncols)
    }

    pub fn as_mut(&mut self) -> MatMut<'_, f64> {
        MatMut::from_column_major_slice_mut(&mut self.data, self.nrows, self.ncols)
    }
}
