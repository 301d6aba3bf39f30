//! Permutation and row-scaling of column-major vectors and blocks.
//!
//! `perm` gathers through a permutation (`x[k] = b[p[k]] / s[p[k]]`),
//! `inv_perm` scatters through it (`x[p[k]] = b[k] · s[p[k]]`). With the same
//! `p` and a nonzero `s` the two undo each other. Both act column by column
//! on `nrhs` columns of length `p.len()`; the output is a separate buffer.

use crate::error::LuError;
use num_traits::Float;

/// Check that `p` is a permutation of `0..n`.
pub fn check_permutation(p: &[usize], n: usize, what: &str) -> Result<(), LuError> {
    if p.len() != n {
        return Err(LuError::Invalid(format!(
            "{what} has length {}, expected {n}",
            p.len()
        )));
    }
    let mut seen = vec![false; n];
    for &v in p {
        if v >= n || std::mem::replace(&mut seen[v], true) {
            return Err(LuError::Invalid(format!("{what} is not a permutation of 0..{n}")));
        }
    }
    Ok(())
}

fn check_shapes<T>(p: &[usize], s: Option<&[T]>, b: &[T], x: &[T], nrhs: usize) -> Result<(), LuError> {
    let n = p.len();
    let len = n
        .checked_mul(nrhs)
        .ok_or_else(|| LuError::TooLarge(format!("{n} rows times {nrhs} columns")))?;
    if b.len() != len || x.len() != len {
        return Err(LuError::Invalid(format!(
            "expected {len} entries ({n} rows, {nrhs} columns), got input {} and output {}",
            b.len(),
            x.len()
        )));
    }
    if let Some(s) = s {
        if s.len() != n {
            return Err(LuError::Invalid(format!(
                "scale vector has length {}, expected {n}",
                s.len()
            )));
        }
    }
    check_permutation(p, n, "permutation")
}

/// `x[k, c] = b[p[k], c] / s[p[k]]` for every column `c`.
pub fn perm<T: Float>(
    p: &[usize],
    s: Option<&[T]>,
    b: &[T],
    x: &mut [T],
    nrhs: usize,
) -> Result<(), LuError> {
    check_shapes(p, s, b, x, nrhs)?;
    let n = p.len();
    if n == 0 {
        return Ok(());
    }
    for (bc, xc) in b.chunks_exact(n).zip(x.chunks_exact_mut(n)) {
        match s {
            Some(s) => {
                for (xk, &pk) in xc.iter_mut().zip(p) {
                    *xk = bc[pk] / s[pk];
                }
            }
            None => {
                for (xk, &pk) in xc.iter_mut().zip(p) {
                    *xk = bc[pk];
                }
            }
        }
    }
    Ok(())
}

/// `x[p[k], c] = b[k, c] · s[p[k]]` for every column `c`.
pub fn inv_perm<T: Float>(
    p: &[usize],
    s: Option<&[T]>,
    b: &[T],
    x: &mut [T],
    nrhs: usize,
) -> Result<(), LuError> {
    check_shapes(p, s, b, x, nrhs)?;
    let n = p.len();
    if n == 0 {
        return Ok(());
    }
    for (bc, xc) in b.chunks_exact(n).zip(x.chunks_exact_mut(n)) {
        match s {
            Some(s) => {
                for (&bk, &pk) in bc.iter().zip(p) {
                    xc[pk] = bk * s[pk];
                }
            }
            None => {
                for (&bk, &pk) in bc.iter().zip(p) {
                    xc[pk] = bk;
                }
            }
        }
    }
    Ok(())
}

/// Single-vector form of [`perm`].
pub fn perm_vec<T: Float>(p: &[usize], s: Option<&[T]>, b: &[T], x: &mut [T]) -> Result<(), LuError> {
    perm(p, s, b, x, 1)
}

/// Single-vector form of [`inv_perm`].
pub fn inv_perm_vec<T: Float>(p: &[usize], s: Option<&[T]>, b: &[T], x: &mut [T]) -> Result<(), LuError> {
    inv_perm(p, s, b, x, 1)
}

/// Inverse of a permutation: `inv[p[k]] = k`.
pub fn invert(p: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; p.len()];
    for (k, &v) in p.iter().enumerate() {
        inv[v] = k;
    }
    inv
}
