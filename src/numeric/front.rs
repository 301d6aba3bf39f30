//! Per-front factor storage and the blocks passed from child to parent.

use crate::matrix::DenseBlock;
use bitflags::bitflags;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a front during the numeric phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrontStatus {
    Pending = 0,
    Assembling = 1,
    Factorizing = 2,
    Done = 3,
    /// Factorized with fewer pivots than pivotal columns.
    SingularTruncated = 4,
}

impl FrontStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => FrontStatus::Assembling,
            2 => FrontStatus::Factorizing,
            3 => FrontStatus::Done,
            4 => FrontStatus::SingularTruncated,
            _ => FrontStatus::Pending,
        }
    }
}

/// Status cell shared between the task that owns a front and observers.
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(FrontStatus::Pending as u8))
    }

    pub(crate) fn set(&self, s: FrontStatus) {
        self.0.store(s as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> FrontStatus {
        FrontStatus::from_u8(self.0.load(Ordering::Acquire))
    }
}

bitflags! {
    /// Notable events while factorizing a front.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrontFlags: u8 {
        /// Fewer pivots than pivotal columns were found.
        const TRUNCATED = 1;
        /// At least one pivot came from off the diagonal.
        const OFF_DIAGONAL = 1 << 1;
        /// At least one pivot was forced below the tolerance.
        const FORCED = 1 << 2;
        /// Child subtrees were factorized concurrently.
        const PARALLEL_CHILDREN = 1 << 3;
    }
}

/// Factors of one front.
///
/// With `k` pivots, an `m × nc` front is stored as the packed `k × k` pivot
/// block (unit-lower L11 below the diagonal, U11 on and above it), the
/// `(m − k) × k` block L21 and the `k × (nc − k)` block U12. `rows` lists the
/// original row ids (pivot rows first), `cols` the column positions (pivoted
/// columns first, then deferred pivotal columns, then contribution columns).
#[derive(Debug, Clone)]
pub struct FrontFactors {
    pub(crate) rows: Vec<usize>,
    pub(crate) cols: Vec<usize>,
    pub(crate) npiv: usize,
    pub(crate) pivot_block: DenseBlock,
    pub(crate) l21: DenseBlock,
    pub(crate) u12: DenseBlock,
    pub(crate) flags: FrontFlags,
    pub(crate) status: FrontStatus,
    pub(crate) off_diagonal: usize,
    pub(crate) forced: usize,
}

impl FrontFactors {
    /// Original row ids of the front; the first `pivots()` are pivot rows.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Column positions of the front; the first `pivots()` are pivot columns.
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Declared pivotal columns.
    pub fn npiv(&self) -> usize {
        self.npiv
    }

    /// Pivots actually found.
    pub fn pivots(&self) -> usize {
        self.pivot_block.nrows()
    }

    pub fn pivot_block(&self) -> &DenseBlock {
        &self.pivot_block
    }

    pub fn l21(&self) -> &DenseBlock {
        &self.l21
    }

    pub fn u12(&self) -> &DenseBlock {
        &self.u12
    }

    pub fn flags(&self) -> FrontFlags {
        self.flags
    }

    pub fn status(&self) -> FrontStatus {
        self.status
    }

    /// Diagonal of U11.
    pub fn udiag(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.pivots()).map(|i| self.pivot_block.get(i, i))
    }

    /// Stored entries of L, unit diagonal included.
    pub fn lnz(&self) -> usize {
        let k = self.pivots();
        k * (k + 1) / 2 + self.l21.len()
    }

    /// Stored entries of U, diagonal included.
    pub fn unz(&self) -> usize {
        let k = self.pivots();
        k * (k + 1) / 2 + self.u12.len()
    }
}

/// Schur complement of a front, handed to its parent exactly once.
#[derive(Debug)]
pub(crate) struct Contribution {
    /// Original row ids.
    pub(crate) rows: Vec<usize>,
    /// Column positions, ascending.
    pub(crate) cols: Vec<usize>,
    pub(crate) block: DenseBlock,
}
