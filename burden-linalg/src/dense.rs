//! Dense matrix operations backed by faer.
//!
//! A thin column-major wrapper around `faer::Mat<f64>` exposing the
//! handful of operations the regression engine uses: matrix-vector
//! products, weighted cross-products, and column manipulation.

use faer::Mat;

/// A dense matrix wrapper around faer's `Mat<f64>`.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from a flat vec (column-major order).
    pub fn from_col_major(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i]);
        Self { inner }
    }

    /// Create a dense matrix from a flat slice (row-major input).
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Self { inner }
    }

    /// Assemble a matrix from column vectors. All columns must share a length.
    pub fn from_columns(cols: &[Vec<f64>]) -> Self {
        let ncols = cols.len();
        let nrows = cols.first().map_or(0, |c| c.len());
        for c in cols {
            assert_eq!(c.len(), nrows);
        }
        let inner = Mat::from_fn(nrows, ncols, |i, j| cols[j][i]);
        Self { inner }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Extract column as a `Vec<f64>`.
    pub fn col(&self, j: usize) -> Vec<f64> {
        let n = self.nrows();
        let mut v = Vec::with_capacity(n);
        for i in 0..n {
            v.push(self.inner.read(i, j));
        }
        v
    }

    /// Set an entire column from a slice.
    pub fn set_col(&mut self, j: usize, data: &[f64]) {
        assert_eq!(data.len(), self.nrows());
        for (i, &v) in data.iter().enumerate() {
            self.inner.write(i, j, v);
        }
    }

    /// A copy of this matrix with one extra column appended on the right.
    pub fn with_appended_col(&self, data: &[f64]) -> DenseMatrix {
        assert_eq!(data.len(), self.nrows());
        let (n, p) = (self.nrows(), self.ncols());
        let inner = Mat::from_fn(n, p + 1, |i, j| {
            if j < p {
                self.inner.read(i, j)
            } else {
                data[i]
            }
        });
        DenseMatrix { inner }
    }

    /// A copy keeping only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> DenseMatrix {
        let p = self.ncols();
        let inner = Mat::from_fn(rows.len(), p, |i, j| self.inner.read(rows[i], j));
        DenseMatrix { inner }
    }

    /// A copy keeping only the given columns, in the given order.
    pub fn select_cols(&self, cols: &[usize]) -> DenseMatrix {
        let n = self.nrows();
        let inner = Mat::from_fn(n, cols.len(), |i, j| self.inner.read(i, cols[j]));
        DenseMatrix { inner }
    }

    /// Matrix-vector product: self * v.
    pub fn mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.ncols(), v.len());
        let n = self.nrows();
        let mut result = vec![0.0; n];
        for (j, &vj) in v.iter().enumerate() {
            for (i, r) in result.iter_mut().enumerate() {
                *r += self.inner.read(i, j) * vj;
            }
        }
        result
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.ncols(), other.nrows());
        DenseMatrix {
            inner: &self.inner * &other.inner,
        }
    }

    /// Transpose.
    pub fn transpose(&self) -> DenseMatrix {
        DenseMatrix {
            inner: self.inner.transpose().to_owned(),
        }
    }

    /// Dot product of two equally sized slices.
    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    /// Compute X' * diag(w) * X. Returns a p x p matrix, p = ncols.
    pub fn xtwx(&self, w: &[f64]) -> DenseMatrix {
        let n = self.nrows();
        let p = self.ncols();
        assert_eq!(w.len(), n);
        let mut result = DenseMatrix::zeros(p, p);
        for j in 0..p {
            for k in j..p {
                let mut s = 0.0;
                for (i, &wi) in w.iter().enumerate().take(n) {
                    s += self.inner.read(i, j) * wi * self.inner.read(i, k);
                }
                result.set(j, k, s);
                if j != k {
                    result.set(k, j, s);
                }
            }
        }
        result
    }

    /// Compute X' * v. Returns a vector of length p = ncols.
    pub fn xtv(&self, v: &[f64]) -> Vec<f64> {
        let n = self.nrows();
        let p = self.ncols();
        assert_eq!(v.len(), n);
        let mut result = vec![0.0; p];
        for (j, r) in result.iter_mut().enumerate() {
            let mut s = 0.0;
            for (i, &vi) in v.iter().enumerate().take(n) {
                s += self.inner.read(i, j) * vi;
            }
            *r = s;
        }
        result
    }
}
