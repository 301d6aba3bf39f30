//! Tests for user-supplied frontal trees and the permutation helpers.
//!
//! A caller can skip the built-in analysis and hand over its own ordering
//! and front tree; these tests check that malformed trees are rejected and
//! that a valid one factorizes and solves.

use approx::assert_abs_diff_eq;
use parlu::utils::permute::check_permutation;
use parlu::{
    Control, CscMatrix, FrontSpec, LuError, Scheduler, Status, Strategy, Symbolic, factorize,
    inv_perm, perm,
};

fn spec(parent: Option<usize>, first_col: usize, npiv: usize, cb_cols: Vec<usize>) -> FrontSpec {
    FrontSpec {
        parent,
        first_col,
        npiv,
        cb_rows: cb_cols.len(),
        cb_cols,
    }
}

/// Two leaves, each passing one row and columns 2..4 to a two-column root.
///
/// ```text
/// [4 . 1 .]
/// [. 4 . 1]
/// [1 . 4 1]
/// [. 1 1 4]
/// ```
fn two_leaves() -> CscMatrix {
    CscMatrix::from_triplets(
        4,
        4,
        &[
            (0, 0, 4.0),
            (2, 0, 1.0),
            (1, 1, 4.0),
            (3, 1, 1.0),
            (0, 2, 1.0),
            (2, 2, 4.0),
            (3, 2, 1.0),
            (1, 3, 1.0),
            (2, 3, 1.0),
            (3, 3, 4.0),
        ],
    )
    .unwrap()
}

fn two_leaf_tree() -> Vec<FrontSpec> {
    vec![
        spec(Some(2), 0, 1, vec![2, 3]),
        spec(Some(2), 1, 1, vec![2, 3]),
        spec(None, 2, 2, vec![]),
    ]
}

#[test]
fn user_tree_factorizes_and_solves() {
    let a = two_leaves();
    let symbolic =
        Symbolic::from_tree(4, vec![0, 1, 2, 3], Strategy::Symmetric, two_leaf_tree()).unwrap();
    assert_eq!(symbolic.nfronts(), 3);
    assert_eq!(symbolic.tree().children(2), &[0, 1]);
    assert_eq!(symbolic.tree().roots(), &[2]);
    assert_eq!(symbolic.nnz(), None);
    assert!(symbolic.front_tree_tasking());

    let control = Control::default().with_threads(2);
    let scheduler = Scheduler::from_control(&control).unwrap();
    let num = factorize(&a, &symbolic, &control, &scheduler).unwrap();
    assert_eq!(num.status(), Status::Success);
    assert_eq!(num.off_diagonal_pivots(), 0);
    // each leaf hands a 1x2 block to the root
    assert_eq!(num.extend_add_entries(), 4);
    assert_eq!(num.p(), &[0, 1, 2, 3]);
    // the leaves own two rows each, fewer than the tree allows for
    assert!(num.flop_count() < symbolic.flop_bound());

    let x_true = [1.0, -2.0, 3.0, 0.5];
    let mut b = vec![0.0; 4];
    a.matvec_multi(&x_true, &mut b, 1);
    let mut x = vec![0.0; 4];
    num.solve_into(&scheduler, &b, &mut x, 1).unwrap();
    for (xi, ti) in x.iter().zip(&x_true) {
        assert_abs_diff_eq!(xi, ti, epsilon = 1e-12);
    }
}

#[test]
fn malformed_trees_are_rejected() {
    let q = || vec![0, 1, 2, 3];
    let invalid = |r: Result<Symbolic, LuError>| matches!(r, Err(LuError::Invalid(_)));

    // parent before child
    let mut t = two_leaf_tree();
    t[1].parent = Some(0);
    assert!(invalid(Symbolic::from_tree(4, q(), Strategy::Symmetric, t)));

    // gap in the pivot columns
    let mut t = two_leaf_tree();
    t[1].first_col = 2;
    assert!(invalid(Symbolic::from_tree(4, q(), Strategy::Symmetric, t)));

    // contribution column missing from the parent
    let t = vec![
        spec(Some(2), 0, 1, vec![2]),
        spec(Some(2), 1, 1, vec![3]),
        spec(None, 2, 2, vec![]),
    ];
    assert!(Symbolic::from_tree(4, q(), Strategy::Unsymmetric, t).is_ok());
    let t = vec![
        spec(Some(1), 0, 2, vec![3]),
        spec(None, 2, 1, vec![]),
        spec(None, 3, 1, vec![]),
    ];
    assert!(invalid(Symbolic::from_tree(4, q(), Strategy::Unsymmetric, t)));

    // root with contribution columns
    let mut t = two_leaf_tree();
    t[2].cb_cols = vec![0];
    assert!(invalid(Symbolic::from_tree(4, q(), Strategy::Symmetric, t)));

    // not a permutation
    assert!(invalid(Symbolic::from_tree(4, vec![0, 1, 1, 3], Strategy::Symmetric, two_leaf_tree())));

    // strategy must be resolved
    assert!(invalid(Symbolic::from_tree(4, q(), Strategy::Auto, two_leaf_tree())));
}

#[test]
fn permutation_round_trip_with_scaling() {
    let p = [2, 0, 3, 1];
    let s = [2.0, 4.0, 0.5, 1.0];
    let b = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    let mut x = [0.0; 8];
    perm(&p, Some(&s[..]), &b, &mut x, 2).unwrap();
    assert_eq!(x[..4], [6.0, 0.5, 4.0, 0.5]);

    let mut back = [0.0; 8];
    inv_perm(&p, Some(&s[..]), &x, &mut back, 2).unwrap();
    assert_eq!(back, b);

    assert!(check_permutation(&p, 4, "p").is_ok());
    assert!(check_permutation(&[0, 0, 1, 2], 4, "p").is_err());
    assert!(perm(&p, None, &b[..3], &mut x, 1).is_err());
}
