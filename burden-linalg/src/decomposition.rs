//! Matrix decompositions and rank detection.
//!
//! Cholesky and QR factorizations used by the regression engine, plus
//! the greedy column-independence scan behind multicollinearity repair.

use crate::dense::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinalgError {
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("Singular matrix encountered")]
    SingularMatrix,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result of a Cholesky decomposition.
pub struct CholeskyDecomp {
    /// Lower triangular factor L such that A = L * L'.
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    /// Compute the Cholesky decomposition of a symmetric positive definite matrix.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let diag = a.get(j, j) - sum;
            if diag <= 0.0 || !diag.is_finite() {
                return Err(LinalgError::NotPositiveDefinite);
            }
            l.set(j, j, diag.sqrt());

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Solve L * L' * x = b.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.nrows();
        assert_eq!(b.len(), n);

        // Forward substitution: L * y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for (j, &yj) in y.iter().enumerate().take(i) {
                sum += self.l.get(i, j) * yj;
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }

        // Backward substitution: L' * x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }

        x
    }

    /// Compute the inverse of the original matrix: A^{-1} = (L L')^{-1}.
    pub fn inverse(&self) -> DenseMatrix {
        let n = self.l.nrows();
        let mut inv = DenseMatrix::zeros(n, n);
        for j in 0..n {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            let col = self.solve(&e);
            inv.set_col(j, &col);
        }
        inv
    }
}

/// Result of a thin QR decomposition: A = Q * R.
pub struct QrDecomp {
    pub q: DenseMatrix,
    pub r: DenseMatrix,
}

impl QrDecomp {
    /// Compute the thin QR decomposition of an m x n matrix (m >= n)
    /// using modified Gram-Schmidt.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let m = a.nrows();
        let n = a.ncols();
        if m < n {
            return Err(LinalgError::DimensionMismatch { expected: n, got: m });
        }

        let mut q = DenseMatrix::zeros(m, n);
        let mut r = DenseMatrix::zeros(n, n);
        let mut cols: Vec<Vec<f64>> = (0..n).map(|j| a.col(j)).collect();

        for j in 0..n {
            for i in 0..j {
                let q_col = q.col(i);
                let rij = DenseMatrix::dot(&q_col, &cols[j]);
                r.set(i, j, rij);
                for (k, qk) in q_col.iter().enumerate() {
                    cols[j][k] -= rij * qk;
                }
            }

            let norm = DenseMatrix::dot(&cols[j], &cols[j]).sqrt();
            if norm < 1e-14 {
                return Err(LinalgError::SingularMatrix);
            }
            r.set(j, j, norm);
            for (k, ck) in cols[j].iter().enumerate() {
                q.set(k, j, ck / norm);
            }
        }

        Ok(QrDecomp { q, r })
    }

    /// Solve R * x = Q' * b (least squares).
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.r.nrows();
        let qtb = self.q.xtv(b);

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.r.get(i, j) * x[j];
            }
            x[i] = (qtb[i] - sum) / self.r.get(i, i);
        }
        x
    }
}

/// Solve a symmetric positive definite system A*x = b using Cholesky.
pub fn solve_spd(a: &DenseMatrix, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
    let chol = CholeskyDecomp::new(a)?;
    Ok(chol.solve(b))
}

/// Compute the inverse of a symmetric positive definite matrix.
pub fn inverse_spd(a: &DenseMatrix) -> Result<DenseMatrix, LinalgError> {
    let chol = CholeskyDecomp::new(a)?;
    Ok(chol.inverse())
}

/// Find a maximal linearly independent subset of columns, preferring the
/// earliest-listed columns when ties exist.
///
/// Greedy modified Gram-Schmidt scan: a column is kept when its residual
/// after projection onto the span of previously kept columns exceeds
/// `rel_tol` times its own norm. Zero columns are always dropped. The
/// returned indices are strictly increasing, so the selection is
/// deterministic for a given input.
pub fn independent_columns(a: &DenseMatrix, rel_tol: f64) -> Vec<usize> {
    let m = a.nrows();
    let n = a.ncols();
    let mut kept: Vec<usize> = Vec::new();
    let mut basis: Vec<Vec<f64>> = Vec::new();

    for j in 0..n {
        let mut v = a.col(j);
        let orig_norm = DenseMatrix::dot(&v, &v).sqrt();
        if orig_norm < 1e-14 {
            continue;
        }
        for q in &basis {
            let proj = DenseMatrix::dot(q, &v);
            for (k, qk) in q.iter().enumerate().take(m) {
                v[k] -= proj * qk;
            }
        }
        let res_norm = DenseMatrix::dot(&v, &v).sqrt();
        if res_norm > rel_tol * orig_norm {
            for vk in v.iter_mut() {
                *vk /= res_norm;
            }
            basis.push(v);
            kept.push(j);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesky() {
        let a = DenseMatrix::from_row_major(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let chol = CholeskyDecomp::new(&a).unwrap();
        assert!((chol.l.get(0, 0) - 2.0).abs() < 1e-12);
        assert!((chol.l.get(1, 0) - 1.0).abs() < 1e-12);
        assert!((chol.l.get(1, 1) - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_solve() {
        let a = DenseMatrix::from_row_major(3, 3, &[4.0, 2.0, 1.0, 2.0, 5.0, 3.0, 1.0, 3.0, 6.0]);
        let b = vec![1.0, 2.0, 3.0];
        let x = solve_spd(&a, &b).unwrap();
        let ax = a.mat_vec(&x);
        for i in 0..3 {
            assert!((ax[i] - b[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_cholesky_not_pd() {
        let a = DenseMatrix::from_row_major(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        assert!(CholeskyDecomp::new(&a).is_err());
    }

    #[test]
    fn test_inverse_spd() {
        let a = DenseMatrix::from_row_major(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let inv = inverse_spd(&a).unwrap();
        let prod = a.mat_mul(&inv);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((prod.get(i, j) - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_qr_orthogonal() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let qr = QrDecomp::new(&a).unwrap();
        let qtq = qr.q.transpose().mat_mul(&qr.q);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((qtq.get(i, j) - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_qr_least_squares() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = vec![1.0, 2.0, 2.0];
        let qr = QrDecomp::new(&a).unwrap();
        let x = qr.solve(&b);
        // Normal equations: A'Ax = A'b
        let ata = a.transpose().mat_mul(&a);
        let atb = a.xtv(&b);
        let atax = ata.mat_vec(&x);
        for i in 0..2 {
            assert!((atax[i] - atb[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_independent_columns_full_rank() {
        let a = DenseMatrix::from_columns(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        assert_eq!(independent_columns(&a, 1e-8), vec![0, 1, 2]);
    }

    #[test]
    fn test_independent_columns_duplicate() {
        let a = DenseMatrix::from_columns(&[
            vec![1.0, 2.0, 3.0],
            vec![1.0, 2.0, 3.0],
            vec![0.0, 1.0, 0.0],
        ]);
        // Earliest duplicate wins.
        assert_eq!(independent_columns(&a, 1e-8), vec![0, 2]);
    }

    #[test]
    fn test_independent_columns_linear_combo() {
        // col2 = col0 + col1
        let a = DenseMatrix::from_columns(&[
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 1.0, 2.0],
        ]);
        assert_eq!(independent_columns(&a, 1e-8), vec![0, 1]);
    }

    #[test]
    fn test_independent_columns_zero_col() {
        let a = DenseMatrix::from_columns(&[vec![0.0, 0.0], vec![1.0, 2.0]]);
        assert_eq!(independent_columns(&a, 1e-8), vec![1]);
    }
}
