//! Per-gene association testing.
//!
//! For each gene, compares a covariate-only null model against two
//! alternatives that add the gene's dominant or recessive score, and
//! reports a one-degree-of-freedom likelihood-ratio p-value per
//! inheritance model. The phenotype family is detected once per run:
//! strictly 0/1 values dispatch to logistic regression, anything else
//! to linear regression.
//!
//! A gene whose null model cannot be fit is a failed gene. A failed
//! alternative fit only blanks that inheritance model's columns.

use anyhow::{bail, Result};

use burden_linalg::DenseMatrix;

use crate::regress::{fit_linear, fit_logistic, lrt_pvalue, LogisticConfig, RegressionFit};
use crate::sanitize::is_binary_vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitType {
    Binary,
    Quantitative,
}

/// Classify the phenotype vector. Exactly 0/1 values mean a binary
/// trait; any other value makes the trait quantitative.
pub fn detect_trait_type(phenotype: &[f64]) -> TraitType {
    if is_binary_vector(phenotype) {
        TraitType::Binary
    } else {
        TraitType::Quantitative
    }
}

/// Effect estimate and LRT p-value for one inheritance model.
#[derive(Debug, Clone, Copy)]
pub struct ArmStats {
    pub beta: f64,
    pub se: f64,
    pub p: f64,
}

/// Association result for one gene.
#[derive(Debug, Clone)]
pub struct GeneAssocResult {
    /// Samples entering the test after cohort/score alignment.
    pub n: usize,
    pub dominant: Option<ArmStats>,
    pub recessive: Option<ArmStats>,
}

impl GeneAssocResult {
    /// Serialize as `n,beta_dom,se_dom,p_dom,beta_rec,se_rec,p_rec`,
    /// with `NA` for an inheritance model that could not be fit.
    pub fn to_csv_row(&self) -> String {
        fn arm(a: &Option<ArmStats>) -> String {
            match a {
                Some(s) => format!("{},{},{}", s.beta, s.se, s.p),
                None => "NA,NA,NA".to_string(),
            }
        }
        format!("{},{},{}", self.n, arm(&self.dominant), arm(&self.recessive))
    }
}

/// Test one gene against the phenotype.
///
/// `covariates` is the sanitized n x k matrix without intercept;
/// `dominant` and `recessive` are the gene's aligned score vectors.
pub fn test_gene(
    phenotype: &[f64],
    covariates: &DenseMatrix,
    dominant: &[f64],
    recessive: &[f64],
    trait_type: TraitType,
) -> Result<GeneAssocResult> {
    let n = phenotype.len();
    assert_eq!(dominant.len(), n);
    assert_eq!(recessive.len(), n);
    if covariates.ncols() > 0 {
        assert_eq!(covariates.nrows(), n);
    }

    let mut base_cols: Vec<Vec<f64>> = vec![vec![1.0; n]];
    for j in 0..covariates.ncols() {
        base_cols.push(covariates.col(j));
    }
    let x_null = DenseMatrix::from_columns(&base_cols);

    let null_fit = match fit_model(phenotype, &x_null, trait_type) {
        Ok(fit) if fit.converged => fit,
        Ok(_) => bail!("null model did not converge in {} samples", n),
        Err(e) => bail!("null model fit failed: {e}"),
    };

    let dominant_arm = fit_arm(phenotype, &base_cols, dominant, trait_type, &null_fit);
    let recessive_arm = fit_arm(phenotype, &base_cols, recessive, trait_type, &null_fit);

    Ok(GeneAssocResult {
        n,
        dominant: dominant_arm,
        recessive: recessive_arm,
    })
}

/// Fit null + score and reduce to an LRT arm. Degenerate or failed
/// alternative fits yield `None`.
fn fit_arm(
    phenotype: &[f64],
    base_cols: &[Vec<f64>],
    scores: &[f64],
    trait_type: TraitType,
    null_fit: &RegressionFit,
) -> Option<ArmStats> {
    // A constant score column carries no signal and breaks the design.
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max - min).is_finite() || max - min < 1e-12 {
        return None;
    }

    let mut cols = base_cols.to_vec();
    cols.push(scores.to_vec());
    let x_alt = DenseMatrix::from_columns(&cols);

    let alt_fit = match fit_model(phenotype, &x_alt, trait_type) {
        Ok(fit) if fit.converged => fit,
        _ => return None,
    };

    let j = x_alt.ncols() - 1;
    Some(ArmStats {
        beta: alt_fit.beta[j],
        se: alt_fit.se[j],
        p: lrt_pvalue(null_fit.log_lik, alt_fit.log_lik),
    })
}

fn fit_model(y: &[f64], x: &DenseMatrix, trait_type: TraitType) -> Result<RegressionFit> {
    match trait_type {
        TraitType::Binary => fit_logistic(y, x, &LogisticConfig::default()),
        TraitType::Quantitative => fit_linear(y, x),
    }
}
