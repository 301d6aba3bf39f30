//! Frontal elimination tree.
//!
//! Fronts are numbered in post-order: every child has a smaller id than its
//! parent, so iterating `0..len()` visits children before parents. Column
//! indices are positions in the fill-reducing ordering (position `k` stands
//! for original column `qfill[k]`); each front owns a contiguous range of
//! pivot positions and the ranges of all fronts tile `0..n` in front order.

use crate::error::LuError;

/// Structural description of one front, as produced by an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontSpec {
    /// Parent front, `None` for a root.
    pub parent: Option<usize>,
    /// First pivot position owned by this front.
    pub first_col: usize,
    /// Number of pivotal columns.
    pub npiv: usize,
    /// Contribution column positions, strictly increasing, all past the pivot range.
    pub cb_cols: Vec<usize>,
    /// Expected number of contribution rows.
    pub cb_rows: usize,
}

impl FrontSpec {
    pub fn pivot_range(&self) -> std::ops::Range<usize> {
        self.first_col..self.first_col + self.npiv
    }

    /// Pivotal plus contribution columns.
    pub fn ncols(&self) -> usize {
        self.npiv + self.cb_cols.len()
    }

    /// Expected number of rows of the assembled front.
    pub fn nrows(&self) -> usize {
        self.npiv + self.cb_rows
    }

    /// Dense work of factorizing the front, in flops.
    pub fn work(&self) -> f64 {
        front_flops(self.nrows(), self.ncols(), self.npiv)
    }

    /// Does `col` belong to this front's column structure?
    pub fn contains_col(&self, col: usize) -> bool {
        self.pivot_range().contains(&col) || self.cb_cols.binary_search(&col).is_ok()
    }
}

/// Flops of eliminating `k` pivots from an `m × n` dense front.
pub fn front_flops(m: usize, n: usize, k: usize) -> f64 {
    let (m, n) = (m as f64, n as f64);
    (0..k)
        .map(|i| {
            let i = i as f64;
            let (mr, nr) = ((m - i - 1.0).max(0.0), (n - i - 1.0).max(0.0));
            mr + 2.0 * mr * nr
        })
        .sum()
}

/// Validated tree of fronts with derived child lists and work estimates.
#[derive(Debug, Clone)]
pub struct EliminationTree {
    n: usize,
    fronts: Vec<FrontSpec>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    col_front: Vec<usize>,
    subtree_work: Vec<f64>,
}

impl EliminationTree {
    /// Validate `fronts` against an `n`-column ordering and build the tree.
    pub fn new(n: usize, fronts: Vec<FrontSpec>) -> Result<Self, LuError> {
        let nf = fronts.len();
        if n > 0 && nf == 0 {
            return Err(LuError::Invalid("no fronts for a nonempty matrix".into()));
        }
        let mut col_front = Vec::with_capacity(n);
        let mut next = 0usize;
        for (f, front) in fronts.iter().enumerate() {
            if front.npiv == 0 {
                return Err(LuError::Invalid(format!("front {f} has no pivot columns")));
            }
            if front.first_col != next {
                return Err(LuError::Invalid(format!(
                    "front {f} starts at column {}, expected {next}",
                    front.first_col
                )));
            }
            next = next
                .checked_add(front.npiv)
                .filter(|&e| e <= n)
                .ok_or_else(|| LuError::Invalid(format!("front {f} pivots run past column {n}")))?;
            col_front.extend(std::iter::repeat_n(f, front.npiv));

            if let Some(p) = front.parent {
                if p <= f || p >= nf {
                    return Err(LuError::Invalid(format!(
                        "front {f} has parent {p}; fronts must be in post-order"
                    )));
                }
            } else if !front.cb_cols.is_empty() {
                return Err(LuError::Invalid(format!(
                    "root front {f} has contribution columns"
                )));
            }
            let end = front.first_col + front.npiv;
            if front.cb_cols.first().is_some_and(|&c| c < end)
                || front.cb_cols.last().is_some_and(|&c| c >= n)
                || front.cb_cols.windows(2).any(|w| w[0] >= w[1])
            {
                return Err(LuError::Invalid(format!(
                    "front {f} contribution columns are unsorted or out of range"
                )));
            }
        }
        if next != n {
            return Err(LuError::Invalid(format!(
                "fronts cover {next} pivot columns, matrix has {n}"
            )));
        }

        let mut children = vec![Vec::new(); nf];
        let mut roots = Vec::new();
        for (f, front) in fronts.iter().enumerate() {
            match front.parent {
                Some(p) => {
                    let parent = &fronts[p];
                    if let Some(&c) = front.cb_cols.iter().find(|&&c| !parent.contains_col(c)) {
                        return Err(LuError::Invalid(format!(
                            "column {c} of front {f} is missing from parent front {p}"
                        )));
                    }
                    children[p].push(f);
                }
                None => roots.push(f),
            }
        }

        let mut subtree_work: Vec<f64> = fronts.iter().map(FrontSpec::work).collect();
        for f in 0..nf {
            if let Some(p) = fronts[f].parent {
                subtree_work[p] += subtree_work[f];
            }
        }

        Ok(Self {
            n,
            fronts,
            children,
            roots,
            col_front,
            subtree_work,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.fronts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fronts.is_empty()
    }

    pub fn front(&self, f: usize) -> &FrontSpec {
        &self.fronts[f]
    }

    pub fn fronts(&self) -> &[FrontSpec] {
        &self.fronts
    }

    pub fn parent(&self, f: usize) -> Option<usize> {
        self.fronts[f].parent
    }

    /// Children of `f` in ascending (post-order) order.
    pub fn children(&self, f: usize) -> &[usize] {
        &self.children[f]
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Front ids with every child before its parent.
    pub fn post_order(&self) -> std::ops::Range<usize> {
        0..self.fronts.len()
    }

    /// Front owning pivot position `col`.
    pub fn front_of_col(&self, col: usize) -> usize {
        self.col_front[col]
    }

    /// Estimated flops of the subtree rooted at `f`.
    pub fn subtree_work(&self, f: usize) -> f64 {
        self.subtree_work[f]
    }

    /// Whether any two subtrees can be factorized concurrently.
    pub fn has_sibling_parallelism(&self) -> bool {
        self.roots.len() > 1 || self.children.iter().any(|c| c.len() > 1)
    }
}
