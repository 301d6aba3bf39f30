//! Symbolic phase: the column ordering and the frontal elimination tree.
//!
//! A [`Symbolic`] object is created once per sparsity pattern, either by the
//! built-in [`analyze`] or from an externally computed tree with
//! [`Symbolic::from_tree`], and can be reused for any number of numeric
//! factorizations of matrices sharing that pattern. It is read-only.

pub mod analyze;
pub mod etree;
pub mod tree;

pub use analyze::analyze;
pub use tree::{EliminationTree, FrontSpec, front_flops};

use crate::config::Strategy;
use crate::error::LuError;
use crate::matrix::CscMatrix;
use crate::utils::permute::check_permutation;

/// Column pointers and row indices of the analyzed matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
}

impl Pattern {
    pub(crate) fn of(a: &CscMatrix) -> Self {
        Self {
            col_ptr: a.col_ptr().to_vec(),
            row_idx: a.row_idx().to_vec(),
        }
    }

    fn matches(&self, a: &CscMatrix) -> bool {
        self.col_ptr == a.col_ptr() && self.row_idx == a.row_idx()
    }
}

#[derive(Debug, Clone)]
pub struct Symbolic {
    n: usize,
    pattern: Option<Pattern>,
    qfill: Vec<usize>,
    strategy: Strategy,
    tree: EliminationTree,
}

impl Symbolic {
    /// Accept an ordering and frontal tree computed elsewhere.
    ///
    /// `qfill[k]` is the original column at pivot position `k`; the fronts use
    /// positions. `strategy` must be `Symmetric` or `Unsymmetric`.
    pub fn from_tree(
        n: usize,
        qfill: Vec<usize>,
        strategy: Strategy,
        fronts: Vec<FrontSpec>,
    ) -> Result<Self, LuError> {
        Self::new(n, None, qfill, strategy, fronts)
    }

    pub(crate) fn new(
        n: usize,
        pattern: Option<Pattern>,
        qfill: Vec<usize>,
        strategy: Strategy,
        fronts: Vec<FrontSpec>,
    ) -> Result<Self, LuError> {
        if strategy == Strategy::Auto {
            return Err(LuError::Invalid(
                "a symbolic object needs a resolved strategy".into(),
            ));
        }
        check_permutation(&qfill, n, "fill-reducing ordering")?;
        let tree = EliminationTree::new(n, fronts)?;
        Ok(Self {
            n,
            pattern,
            qfill,
            strategy,
            tree,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Entries of the analyzed matrix; `None` when the tree came from outside.
    pub fn nnz(&self) -> Option<usize> {
        self.pattern.as_ref().map(|p| p.row_idx.len())
    }

    /// Can `a` be factorized with this analysis? A tree from outside only
    /// checks the dimension; an analyzed one also needs the same pattern.
    pub fn fits(&self, a: &CscMatrix) -> bool {
        a.nrows() == self.n
            && a.ncols() == self.n
            && self.pattern.as_ref().is_none_or(|p| p.matches(a))
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn qfill(&self) -> &[usize] {
        &self.qfill
    }

    pub fn tree(&self) -> &EliminationTree {
        &self.tree
    }

    pub fn nfronts(&self) -> usize {
        self.tree.len()
    }

    /// Entries of L the tree allows for, diagonal included.
    pub fn lnz_bound(&self) -> usize {
        self.tree
            .fronts()
            .iter()
            .map(|f| f.npiv * (f.npiv + 1) / 2 + f.npiv * f.cb_rows)
            .sum()
    }

    /// Entries of U the tree allows for, diagonal included.
    pub fn unz_bound(&self) -> usize {
        self.tree
            .fronts()
            .iter()
            .map(|f| f.npiv * (f.npiv + 1) / 2 + f.npiv * f.cb_cols.len())
            .sum()
    }

    /// Flops of the factorization when every front finds all its pivots.
    pub fn flop_bound(&self) -> f64 {
        self.tree.fronts().iter().map(FrontSpec::work).sum()
    }

    /// Whether sibling subtrees can be factorized concurrently.
    pub fn front_tree_tasking(&self) -> bool {
        self.tree.has_sibling_parallelism()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tree_validates_ordering_and_strategy() {
        let fronts = vec![FrontSpec {
            parent: None,
            first_col: 0,
            npiv: 2,
            cb_cols: vec![],
            cb_rows: 0,
        }];
        let s = Symbolic::from_tree(2, vec![1, 0], Strategy::Unsymmetric, fronts.clone()).unwrap();
        assert_eq!(s.nfronts(), 1);
        assert_eq!(s.lnz_bound(), 3);
        assert_eq!(s.nnz(), None);
        assert!(Symbolic::from_tree(2, vec![1, 1], Strategy::Unsymmetric, fronts.clone()).is_err());
        assert!(Symbolic::from_tree(2, vec![0, 1], Strategy::Auto, fronts).is_err());
    }

    #[test]
    fn analyzed_pattern_must_match() {
        let diag = [(0, 0, 2.0), (1, 1, 2.0), (2, 2, 2.0)];
        let with = |extra: (usize, usize, f64)| {
            let mut t = diag.to_vec();
            t.push(extra);
            CscMatrix::from_triplets(3, 3, &t).unwrap()
        };
        let a = with((0, 1, 1.0));
        let s = analyze(&a, &crate::config::Control::default()).unwrap();
        assert!(s.fits(&a));
        assert!(s.fits(&with((0, 1, -7.0))));
        assert!(!s.fits(&with((0, 2, 1.0))));
        assert!(!s.fits(&CscMatrix::from_triplets(2, 2, &diag[..2]).unwrap()));
    }
}
