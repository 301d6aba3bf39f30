//! Tests for solving with the multifrontal factors.
//!
//! Solutions of random sparse systems are compared against a known
//! solution, the L and U solves are checked to compose to a full solve, and
//! malformed right-hand sides are rejected.

use approx::assert_abs_diff_eq;
use parlu::{
    Control, CscMatrix, LinearSolver, LuContext, LuError, Numeric, Ordering, Rhs, Scheduler,
    SolveSystem, analyze, factorize, perm, residual,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random sparse matrix whose diagonal is smaller than some off-diagonal
/// entries, so the factorization has to pivot.
fn random_unsymmetric(n: usize, seed: u64) -> CscMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t = Vec::new();
    for j in 0..n {
        t.push((j, j, rng.gen_range(0.5..1.0)));
        for _ in 0..3 {
            t.push((rng.gen_range(0..n), j, rng.gen_range(-4.0..4.0)));
        }
        if j + 1 < n {
            t.push((j + 1, j, 5.0));
        }
    }
    CscMatrix::from_triplets(n, n, &t).unwrap()
}

/// Five-point Laplacian on a `k × k` grid.
fn grid_laplacian(k: usize) -> CscMatrix {
    let idx = |i: usize, j: usize| i * k + j;
    let mut t = Vec::new();
    for i in 0..k {
        for j in 0..k {
            t.push((idx(i, j), idx(i, j), 4.0));
            if i > 0 {
                t.push((idx(i - 1, j), idx(i, j), -1.0));
            }
            if i + 1 < k {
                t.push((idx(i + 1, j), idx(i, j), -1.0));
            }
            if j > 0 {
                t.push((idx(i, j - 1), idx(i, j), -1.0));
            }
            if j + 1 < k {
                t.push((idx(i, j + 1), idx(i, j), -1.0));
            }
        }
    }
    CscMatrix::from_triplets(k * k, k * k, &t).unwrap()
}

fn factor(a: &CscMatrix, control: &Control) -> (Scheduler, Numeric) {
    let scheduler = Scheduler::from_control(control).unwrap();
    let symbolic = analyze(a, control).unwrap();
    let numeric = factorize(a, &symbolic, control, &scheduler).unwrap();
    (scheduler, numeric)
}

/// Right-hand sides `A · x_true` for `nrhs` random solutions.
fn rhs_for(a: &CscMatrix, nrhs: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = a.ncols();
    let x: Vec<f64> = (0..n * nrhs).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut b = vec![0.0; n * nrhs];
    a.matvec_multi(&x, &mut b, nrhs);
    (x, b)
}

/// A random unsymmetric system is solved to near machine precision.
#[test]
fn solves_random_unsymmetric_system() {
    let a = random_unsymmetric(200, 5);
    let (scheduler, num) = factor(&a, &Control::default().with_threads(2));
    let (x_true, b) = rhs_for(&a, 1, 9);
    let mut x = vec![0.0; 200];
    num.solve_into(&scheduler, &b, &mut x, 1).unwrap();
    let r = residual(&a, &x, &b, 1).unwrap();
    assert!(r.resid < 1e-12, "residual {}", r.resid);
    for (xi, ti) in x.iter().zip(&x_true) {
        assert_abs_diff_eq!(xi, ti, epsilon = 1e-6);
    }
}

/// Several right-hand sides are solved at once, with tasked triangular solves.
#[test]
fn solves_multiple_right_hand_sides() {
    let a = grid_laplacian(12);
    let n = a.ncols();
    let control = Control {
        worthwhile_trsm: 2,
        worthwhile_dgemm: 8,
        ..Control::default().with_threads(4)
    };
    let (scheduler, num) = factor(&a, &control);
    let nrhs = 5;
    let (x_true, b) = rhs_for(&a, nrhs, 2);
    let mut x = b.clone();
    num.solve_in_place(&scheduler, &mut x, nrhs).unwrap();
    let r = residual(&a, &x, &b, nrhs).unwrap();
    assert!(r.resid < 1e-13, "residual {}", r.resid);
    for (xi, ti) in x.iter().zip(&x_true) {
        assert_abs_diff_eq!(xi, ti, epsilon = 1e-10);
    }

    // each column on its own gives the same answer
    for c in 0..nrhs {
        let mut xc = b[c * n..(c + 1) * n].to_vec();
        num.solve_in_place(&scheduler, &mut xc, 1).unwrap();
        for (u, v) in xc.iter().zip(&x[c * n..(c + 1) * n]) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
    }
}

/// Applying the L solve then the U solve to the permuted, scaled right-hand
/// side reproduces the full solve.
#[test]
fn lower_then_upper_matches_full_solve() {
    let a = random_unsymmetric(60, 17);
    let (scheduler, num) = factor(&a, &Control::default().with_threads(2));
    let (_, b) = rhs_for(&a, 1, 4);

    let mut full = vec![0.0; 60];
    num.solve_into(&scheduler, &b, &mut full, 1).unwrap();

    let mut work = vec![0.0; 60];
    perm(num.p(), Some(num.row_scale()), &b, &mut work, 1).unwrap();
    let mut y = vec![0.0; 60];
    num.solve(&scheduler, SolveSystem::L, 1, Rhs::Separate { b: &work, x: &mut y })
        .unwrap();
    num.solve(&scheduler, SolveSystem::U, 1, Rhs::InPlace(&mut y))
        .unwrap();
    for (k, &col) in num.q().iter().enumerate() {
        assert_abs_diff_eq!(y[k], full[col], epsilon = 1e-12);
    }
}

/// In-place and separate-buffer solves agree exactly.
#[test]
fn in_place_matches_separate() {
    let a = grid_laplacian(6);
    let (scheduler, num) = factor(&a, &Control::default().with_threads(1));
    let (_, b) = rhs_for(&a, 2, 8);
    let mut sep = vec![0.0; b.len()];
    num.solve(&scheduler, SolveSystem::A, 2, Rhs::Separate { b: &b, x: &mut sep })
        .unwrap();
    let mut inplace = b.clone();
    num.solve(&scheduler, SolveSystem::A, 2, Rhs::InPlace(&mut inplace))
        .unwrap();
    assert_eq!(sep, inplace);
}

/// A caller-supplied column ordering still yields an accurate solve.
#[test]
fn given_ordering_is_honored() {
    let a = grid_laplacian(7);
    let n = a.ncols();
    let q: Vec<usize> = (0..n).rev().collect();
    let control = Control::default()
        .with_threads(2)
        .with_ordering(Ordering::Given(q));
    let (scheduler, num) = factor(&a, &control);
    let (x_true, b) = rhs_for(&a, 1, 3);
    let mut x = vec![0.0; n];
    num.solve_into(&scheduler, &b, &mut x, 1).unwrap();
    for (xi, ti) in x.iter().zip(&x_true) {
        assert_abs_diff_eq!(xi, ti, epsilon = 1e-10);
    }
}

/// Right-hand sides of the wrong length are rejected.
#[test]
fn wrong_lengths_are_rejected() {
    let a = grid_laplacian(3);
    let (scheduler, num) = factor(&a, &Control::default().with_threads(1));
    let mut short = vec![0.0; 8];
    assert!(matches!(
        num.solve_in_place(&scheduler, &mut short, 1),
        Err(LuError::Invalid(_))
    ));
    let b = vec![1.0; 9];
    let mut x = vec![0.0; 18];
    assert!(matches!(
        num.solve_into(&scheduler, &b, &mut x, 2),
        Err(LuError::Invalid(_))
    ));
    let mut none: Vec<f64> = Vec::new();
    assert!(num.solve_in_place(&scheduler, &mut none, 0).is_ok());
}

/// An empty matrix factorizes and solves trivially.
#[test]
fn empty_matrix() {
    let a = CscMatrix::from_triplets(0, 0, &[]).unwrap();
    let (scheduler, num) = factor(&a, &Control::default().with_threads(1));
    assert_eq!(num.n(), 0);
    assert_eq!(num.rcond(), 1.0);
    let mut x: Vec<f64> = Vec::new();
    num.solve_in_place(&scheduler, &mut x, 1).unwrap();
}

/// The context reuses its analysis and solves through the `LinearSolver` trait.
#[test]
fn context_solves_sequence_of_matrices() {
    let mut ctx = LuContext::new(Control::default().with_threads(2)).unwrap();
    let a = grid_laplacian(5);
    let (x_true, b) = rhs_for(&a, 1, 12);
    let mut x = Vec::new();
    let stats = LinearSolver::solve(&mut ctx, &a, &b, &mut x).unwrap();
    assert!(stats.converged(1e-12));
    for (xi, ti) in x.iter().zip(&x_true) {
        assert_abs_diff_eq!(xi, ti, epsilon = 1e-10);
    }

    // same pattern, new values
    let mut t = Vec::new();
    for j in 0..a.ncols() {
        let (rows, vals) = a.col(j);
        for (&i, &v) in rows.iter().zip(vals) {
            t.push((i, j, if i == j { 2.0 * v } else { v }));
        }
    }
    let a2 = CscMatrix::from_triplets(a.nrows(), a.ncols(), &t).unwrap();
    let stats = LinearSolver::solve(&mut ctx, &a2, &b, &mut x).unwrap();
    assert!(stats.final_residual < 1e-12);
    assert_eq!(ctx.symbolic().map(|s| s.nnz()), Some(Some(a.nnz())));
    ctx.free_numeric();
    assert!(ctx.numeric().is_none());
}
