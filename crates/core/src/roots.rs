//! Scalar root finding.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootError {
    #[error("root is not bracketed: f({lo}) and f({hi}) share a sign")]
    NotBracketed { lo: f64, hi: f64 },
    #[error("bisection did not converge within {iterations} iterations (last |f| = {residual})")]
    NoConvergence { iterations: usize, residual: f64 },
}

/// Solve `f(x) = 0` on `[lo, hi]` by bisection.
///
/// Terminates when `|f(mid)| <= tol` or the bracket shrinks below `tol` relative
/// to its midpoint. The endpoints must bracket a sign change.
pub fn bisect<F>(mut f: F, lo: f64, hi: f64, tol: f64, max_iter: usize) -> Result<f64, RootError>
where
    F: FnMut(f64) -> f64,
{
    let (mut lo, mut hi) = (lo.min(hi), lo.max(hi));
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(RootError::NotBracketed { lo, hi });
    }

    let mut residual = f64::INFINITY;
    for _ in 0..max_iter {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        residual = f_mid.abs();
        if residual <= tol || (hi - lo) <= tol * mid.abs().max(1.0) {
            return Ok(mid);
        }
        if f_lo.signum() == f_mid.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(RootError::NoConvergence {
        iterations: max_iter,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_square_root_of_two() {
        let root = bisect(|x| x * x - 2.0, 0.0, 2.0, 1e-13, 200).unwrap();
        assert!((root - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rejects_unbracketed_interval() {
        let err = bisect(|x| x * x + 1.0, -1.0, 1.0, 1e-12, 50).unwrap_err();
        assert!(matches!(err, RootError::NotBracketed { .. }));
    }

    #[test]
    fn reports_exhausted_iterations() {
        let err = bisect(|x| x - 0.123_456_789, 0.0, 1.0, 1e-15, 3).unwrap_err();
        assert!(matches!(err, RootError::NoConvergence { iterations: 3, .. }));
    }
}
