//! Scaled residual of a computed solution.

use crate::core::traits::Norm1;
use crate::error::LuError;
use crate::matrix::CscMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    /// ‖B − A·X‖₁ / (‖A‖₁·‖X‖₁), or the bare ‖B − A·X‖₁ when the denominator is zero.
    pub resid: f64,
    pub anorm: f64,
    pub xnorm: f64,
}

/// Largest column sum of absolute values of an `nrows × nrhs` block.
fn block_norm1(data: &[f64], nrows: usize) -> f64 {
    if nrows == 0 {
        return 0.0;
    }
    data.chunks_exact(nrows)
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Residual of `nrhs` column-major solutions `x` against right-hand sides `b`.
pub fn residual(a: &CscMatrix, x: &[f64], b: &[f64], nrhs: usize) -> Result<Residual, LuError> {
    let (m, n) = (a.nrows(), a.ncols());
    if x.len() != n * nrhs || b.len() != m * nrhs {
        return Err(LuError::Invalid(format!(
            "residual of a {m}x{n} matrix needs x of length {} and b of length {}",
            n * nrhs,
            m * nrhs
        )));
    }
    let mut r = vec![0.0; m * nrhs];
    a.matvec_multi(x, &mut r, nrhs);
    for (ri, bi) in r.iter_mut().zip(b) {
        *ri = bi - *ri;
    }
    let rnorm = block_norm1(&r, m);
    let anorm = a.norm1();
    let xnorm = block_norm1(x, n);
    let denom = anorm * xnorm;
    let resid = if denom > 0.0 { rnorm / denom } else { rnorm };
    Ok(Residual { resid, anorm, xnorm })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exact_solution_has_zero_residual() {
        let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0), (0, 1, 1.0)]).unwrap();
        let x = [1.0, 1.0];
        let b = [3.0, 4.0];
        let r = residual(&a, &x, &b, 1).unwrap();
        assert_eq!(r.resid, 0.0);
        assert_eq!(r.anorm, 5.0);
        assert_eq!(r.xnorm, 2.0);
    }

    #[test]
    fn residual_is_scaled_and_takes_worst_column() {
        let a = CscMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap();
        let x = [1.0, 1.0, 2.0, 0.0];
        let b = [1.0, 1.0, 2.0, 0.5];
        let r = residual(&a, &x, &b, 2).unwrap();
        assert_relative_eq!(r.resid, 0.5 / (1.0 * 2.0));
        assert!(residual(&a, &x, &b[..2], 2).is_err());
    }
}
