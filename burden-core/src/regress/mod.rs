//! Likelihood-based regression engine.
//!
//! Fits the null and alternative models behind each gene's
//! likelihood-ratio test: iteratively reweighted logistic regression
//! for binary phenotypes and ordinary least squares for quantitative
//! ones. Both report a log-likelihood on the same scale so the
//! one-degree-of-freedom LRT applies uniformly.

pub mod linear;
pub mod logistic;

pub use linear::fit_linear;
pub use logistic::{fit_logistic, LogisticConfig};

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// A fitted regression model.
#[derive(Debug, Clone)]
pub struct RegressionFit {
    /// Coefficients, in design-matrix column order.
    pub beta: Vec<f64>,
    /// Standard errors, same order.
    pub se: Vec<f64>,
    /// Maximized log-likelihood.
    pub log_lik: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// One-degree-of-freedom likelihood-ratio p-value.
///
/// The statistic is clamped at zero: a nested alternative can only
/// trail the null through numerical noise.
pub fn lrt_pvalue(log_lik_null: f64, log_lik_alt: f64) -> f64 {
    let stat = (2.0 * (log_lik_alt - log_lik_null)).max(0.0);
    let chi2 = ChiSquared::new(1.0).unwrap();
    1.0 - chi2.cdf(stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lrt_null_stat_is_one() {
        assert!((lrt_pvalue(-10.0, -10.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lrt_known_value() {
        // stat = 3.841459 is the chi2(1) 95th percentile.
        let p = lrt_pvalue(0.0, 3.841459 / 2.0);
        assert!((p - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_lrt_clamps_negative_stat() {
        assert!((lrt_pvalue(-5.0, -5.1) - 1.0).abs() < 1e-12);
    }
}
