//! Logistic regression via iteratively reweighted least squares.
//!
//! Newton-Raphson on the binomial log-likelihood: at each step solve
//! `(X'WX) delta = X'(y - mu)` with `W = diag(mu (1 - mu))`, retrying
//! once with a ridge on the information matrix when it is numerically
//! indefinite.

use anyhow::{Context, Result};

use burden_linalg::decomposition::CholeskyDecomp;
use burden_linalg::DenseMatrix;

use super::RegressionFit;

/// Convergence controls for the IRLS loop.
#[derive(Debug, Clone)]
pub struct LogisticConfig {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 25,
            tol: 1e-6,
        }
    }
}

/// Fit `y ~ x` by maximum likelihood.
///
/// `y` must be 0/1; `x` is the full design matrix including the
/// intercept. A fit that exhausts `max_iter` is returned with
/// `converged = false` rather than as an error, so callers can decide
/// how to report it. Errors indicate a design matrix the solver cannot
/// factor at all.
pub fn fit_logistic(y: &[f64], x: &DenseMatrix, config: &LogisticConfig) -> Result<RegressionFit> {
    let n = y.len();
    let p = x.ncols();
    assert_eq!(x.nrows(), n);

    let mut beta = vec![0.0; p];
    let mut converged = false;
    let mut iterations = config.max_iter;

    for iter in 0..config.max_iter {
        let eta = x.mat_vec(&beta);
        let mu: Vec<f64> = eta.iter().map(|&e| sigmoid(e)).collect();
        let w: Vec<f64> = mu.iter().map(|&m| (m * (1.0 - m)).max(1e-10)).collect();

        let residuals: Vec<f64> = (0..n).map(|i| y[i] - mu[i]).collect();
        let score = x.xtv(&residuals);
        let info = x.xtwx(&w);

        let delta = match CholeskyDecomp::new(&info) {
            Ok(chol) => chol.solve(&score),
            Err(_) => {
                let mut ridged = info;
                for j in 0..p {
                    ridged.set(j, j, ridged.get(j, j) + 1e-6);
                }
                CholeskyDecomp::new(&ridged)
                    .context("information matrix is singular")?
                    .solve(&score)
            }
        };

        let mut max_change = 0.0_f64;
        for j in 0..p {
            beta[j] += delta[j];
            max_change = max_change.max(delta[j].abs());
        }

        if max_change < config.tol {
            converged = true;
            iterations = iter + 1;
            break;
        }
    }

    let eta = x.mat_vec(&beta);
    let mu: Vec<f64> = eta.iter().map(|&e| sigmoid(e)).collect();
    let log_lik = binomial_log_lik(y, &mu);

    let se = if converged {
        let w: Vec<f64> = mu.iter().map(|&m| (m * (1.0 - m)).max(1e-10)).collect();
        match CholeskyDecomp::new(&x.xtwx(&w)) {
            Ok(chol) => {
                let inv = chol.inverse();
                (0..p).map(|j| inv.get(j, j).max(0.0).sqrt()).collect()
            }
            Err(_) => vec![f64::NAN; p],
        }
    } else {
        vec![f64::NAN; p]
    };

    Ok(RegressionFit {
        beta,
        se,
        log_lik,
        converged,
        iterations,
    })
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn binomial_log_lik(y: &[f64], mu: &[f64]) -> f64 {
    y.iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let m = mi.clamp(1e-10, 1.0 - 1e-10);
            yi * m.ln() + (1.0 - yi) * (1.0 - m).ln()
        })
        .sum()
}
