//! Ordinary least squares with a Gaussian log-likelihood.
//!
//! Solved through the thin QR factorization of the design matrix. The
//! log-likelihood uses the maximum-likelihood variance `RSS / n` so it
//! nests correctly in the likelihood-ratio test; standard errors use
//! the unbiased `RSS / (n - p)`.

use anyhow::{bail, Context, Result};

use burden_linalg::decomposition::{inverse_spd, QrDecomp};
use burden_linalg::DenseMatrix;

use super::RegressionFit;

/// Fit `y ~ x` by least squares.
///
/// `x` is the full design matrix including the intercept.
pub fn fit_linear(y: &[f64], x: &DenseMatrix) -> Result<RegressionFit> {
    let n = y.len();
    let p = x.ncols();
    assert_eq!(x.nrows(), n);
    if n <= p {
        bail!("{} observations cannot identify {} coefficients", n, p);
    }

    let qr = QrDecomp::new(x).context("design matrix is rank-deficient")?;
    let beta = qr.solve(y);

    let fitted = x.mat_vec(&beta);
    let rss: f64 = y
        .iter()
        .zip(fitted.iter())
        .map(|(&yi, &fi)| (yi - fi) * (yi - fi))
        .sum();

    let sigma2_mle = (rss / n as f64).max(1e-300);
    let log_lik =
        -0.5 * n as f64 * ((2.0 * std::f64::consts::PI * sigma2_mle).ln() + 1.0);

    let sigma2 = rss / (n - p) as f64;
    let xtx = x.transpose().mat_mul(x);
    let se = match inverse_spd(&xtx) {
        Ok(inv) => (0..p)
            .map(|j| (sigma2 * inv.get(j, j)).max(0.0).sqrt())
            .collect(),
        Err(_) => vec![f64::NAN; p],
    };

    Ok(RegressionFit {
        beta,
        se,
        log_lik,
        converged: true,
        iterations: 1,
    })
}
