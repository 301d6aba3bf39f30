//! Column elimination tree and its post-order.
//!
//! The column elimination tree of A is the elimination tree of AᵀA; it bounds
//! the structure of both L and U under any row interchanges, so the frontal
//! tree built on it stays valid whatever pivots the numeric phase picks.
//! AᵀA is never formed: each row links the columns it touches through the
//! last column seen in that row.

const NONE: usize = usize::MAX;

/// Column elimination tree of `A(:, q)`.
///
/// `parent[k]` is the parent of position `k`, or `None` for a root. Columns
/// are read through `col(j) -> row indices`.
pub fn column_etree<'a, F>(nrows: usize, q: &[usize], col: F) -> Vec<Option<usize>>
where
    F: Fn(usize) -> &'a [usize],
{
    let n = q.len();
    let mut parent = vec![NONE; n];
    let mut ancestor = vec![NONE; n];
    let mut prev = vec![NONE; nrows];

    for (k, &j) in q.iter().enumerate() {
        for &row in col(j) {
            let mut i = prev[row];
            // walk from the last column of this row up to k, compressing the path
            while i != NONE && i < k {
                let next = ancestor[i];
                ancestor[i] = k;
                if next == NONE {
                    parent[i] = k;
                }
                i = next;
            }
            prev[row] = k;
        }
    }

    parent
        .into_iter()
        .map(|p| if p == NONE { None } else { Some(p) })
        .collect()
}

/// Post-order of a forest: `post[k]` is the node visited k-th, children
/// (in ascending order) before their parent.
pub fn post_order(parent: &[Option<usize>]) -> Vec<usize> {
    let n = parent.len();
    let mut first_child = vec![NONE; n];
    let mut next_sibling = vec![NONE; n];
    for j in (0..n).rev() {
        if let Some(p) = parent[j] {
            next_sibling[j] = first_child[p];
            first_child[p] = j;
        }
    }

    let mut post = Vec::with_capacity(n);
    let mut stack: Vec<(usize, bool)> = Vec::with_capacity(n);
    for root in (0..n).filter(|&j| parent[j].is_none()) {
        stack.push((root, false));
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                post.push(node);
                continue;
            }
            stack.push((node, true));
            let mut kids = Vec::new();
            let mut c = first_child[node];
            while c != NONE {
                kids.push(c);
                c = next_sibling[c];
            }
            stack.extend(kids.into_iter().rev().map(|c| (c, false)));
        }
    }
    post
}
