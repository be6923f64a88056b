//! burden-linalg: Linear algebra support for burden-rs
//!
//! Wraps faer's dense matrices and provides the decompositions the
//! regression engine and covariate sanitizer need: Cholesky, QR, and
//! greedy rank detection for collinearity repair.

pub mod decomposition;
pub mod dense;

pub use decomposition::{CholeskyDecomp, LinalgError, QrDecomp};
pub use dense::DenseMatrix;
