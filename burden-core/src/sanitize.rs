//! Covariate sanitization.
//!
//! Runs once per process, before any gene is dispatched, and repairs
//! the two covariate pathologies that break downstream regression:
//!
//! 1. **Rank repair**: keep a maximal linearly independent subset of
//!    covariate columns (checked jointly with the intercept),
//!    preferring the earliest-listed columns.
//! 2. **Separation repair** (binary phenotype only): remove binary
//!    covariate columns that quasi-completely separate the phenotype,
//!    together with the samples of the separating level.
//!
//! Both repairs change the scientific model being fit, so each must be
//! explicitly authorized by the caller; otherwise the run aborts. A
//! final advisory check warns when too few phenotype-minority
//! observations remain per retained covariate. The input arrays are
//! never mutated.

use anyhow::{bail, Result};
use tracing::{info, warn};

use burden_linalg::decomposition::independent_columns;
use burden_linalg::DenseMatrix;

/// Relative tolerance for the column-independence scan.
const RANK_TOL: f64 = 1e-8;

/// Caller authorization and thresholds for sanitization.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Permit dropping linearly dependent covariate columns.
    pub allow_rank_repair: bool,
    /// Permit removing separating covariate columns and their samples.
    pub allow_separation_repair: bool,
    /// A covariate level quasi-separates when at most this many of its
    /// samples deviate from the level's majority phenotype.
    pub max_level_exceptions: usize,
    /// Advisory minimum phenotype-minority observations per covariate.
    pub min_obs_per_covariate: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            allow_rank_repair: false,
            allow_separation_repair: false,
            max_level_exceptions: 1,
            min_obs_per_covariate: 10,
        }
    }
}

/// What sanitization changed.
#[derive(Debug, Clone, Default)]
pub struct SanitizeReport {
    pub n_covariates_in: usize,
    pub dropped_collinear: Vec<String>,
    pub dropped_separating: Vec<String>,
    pub n_samples_removed: usize,
    pub low_power_warning: bool,
}

impl std::fmt::Display for SanitizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "covariates: {} in, {} dropped collinear, {} dropped separating; {} samples removed",
            self.n_covariates_in,
            self.dropped_collinear.len(),
            self.dropped_separating.len(),
            self.n_samples_removed
        )
    }
}

/// Sanitized cohort view: full-rank covariates, separation-free for
/// binary phenotypes, frozen for the rest of the run.
#[derive(Debug, Clone)]
pub struct SanitizedCohort {
    pub sample_ids: Vec<String>,
    pub phenotype: Vec<f64>,
    /// n x k covariate matrix, without intercept.
    pub covariates: DenseMatrix,
    pub covariate_names: Vec<String>,
    pub report: SanitizeReport,
}

/// True when every value is exactly 0 or 1.
pub fn is_binary_vector(values: &[f64]) -> bool {
    values.iter().all(|&v| v == 0.0 || v == 1.0)
}

/// Sanitize phenotype and covariates for the whole cohort.
///
/// `covariates[j]` is the j-th covariate column, each of length
/// `sample_ids.len()`.
pub fn sanitize_covariates(
    sample_ids: &[String],
    phenotype: &[f64],
    covariates: &[Vec<f64>],
    covariate_names: &[String],
    opts: &SanitizeOptions,
) -> Result<SanitizedCohort> {
    let n = sample_ids.len();
    assert_eq!(phenotype.len(), n);
    assert_eq!(covariates.len(), covariate_names.len());
    for c in covariates {
        assert_eq!(c.len(), n);
    }

    let mut report = SanitizeReport {
        n_covariates_in: covariates.len(),
        ..Default::default()
    };

    // Step 1: rank repair, jointly with the intercept column.
    let kept = rank_repair(covariates, covariate_names, opts, &mut report)?;
    let mut cols: Vec<Vec<f64>> = kept.iter().map(|&j| covariates[j].clone()).collect();
    let mut names: Vec<String> = kept.iter().map(|&j| covariate_names[j].clone()).collect();

    // Step 2: separation repair, binary phenotypes only.
    let mut pheno = phenotype.to_vec();
    let mut ids = sample_ids.to_vec();
    if is_binary_vector(&pheno) {
        separation_repair(&mut ids, &mut pheno, &mut cols, &mut names, opts, &mut report)?;

        // Removing samples can leave a surviving column constant or
        // dependent; rechecking is part of the authorized repair.
        if report.n_samples_removed > 0 && !cols.is_empty() {
            let mut with_intercept = vec![vec![1.0; pheno.len()]];
            with_intercept.extend(cols.iter().cloned());
            let kept_again: Vec<usize> =
                independent_columns(&DenseMatrix::from_columns(&with_intercept), RANK_TOL)
                    .into_iter()
                    .filter(|&j| j > 0)
                    .map(|j| j - 1)
                    .collect();
            if kept_again.len() < cols.len() {
                for j in (0..cols.len()).rev() {
                    if !kept_again.contains(&j) {
                        cols.remove(j);
                        let name = names.remove(j);
                        info!("Rank repair after separation: dropped covariate '{}'", name);
                        report.dropped_collinear.push(name);
                    }
                }
            }
        }
    }

    // Step 3: advisory sample-to-covariate ratio check.
    if !cols.is_empty() {
        let minority = if is_binary_vector(&pheno) {
            let n_cases = pheno.iter().filter(|&&v| v == 1.0).count();
            n_cases.min(pheno.len() - n_cases)
        } else {
            pheno.len()
        };
        if minority < opts.min_obs_per_covariate * cols.len() {
            warn!(
                "Only {} phenotype-minority observations for {} covariates \
                 (want >= {} per covariate); regression power is likely inadequate",
                minority,
                cols.len(),
                opts.min_obs_per_covariate
            );
            report.low_power_warning = true;
        }
    }

    info!("Covariate sanitization: {}", report);

    Ok(SanitizedCohort {
        sample_ids: ids,
        phenotype: pheno,
        covariates: DenseMatrix::from_columns(&cols),
        covariate_names: names,
        report,
    })
}

/// Select a maximal independent covariate subset. Aborts when columns
/// would be dropped without authorization.
fn rank_repair(
    covariates: &[Vec<f64>],
    names: &[String],
    opts: &SanitizeOptions,
    report: &mut SanitizeReport,
) -> Result<Vec<usize>> {
    if covariates.is_empty() {
        return Ok(Vec::new());
    }
    let n = covariates[0].len();

    // Intercept leads so constant covariates register as dependent.
    let mut with_intercept: Vec<Vec<f64>> = Vec::with_capacity(covariates.len() + 1);
    with_intercept.push(vec![1.0; n]);
    with_intercept.extend(covariates.iter().cloned());

    let kept_with_intercept =
        independent_columns(&DenseMatrix::from_columns(&with_intercept), RANK_TOL);
    let kept: Vec<usize> = kept_with_intercept
        .into_iter()
        .filter(|&j| j > 0)
        .map(|j| j - 1)
        .collect();

    if kept.len() < covariates.len() {
        let dropped: Vec<String> = (0..covariates.len())
            .filter(|j| !kept.contains(j))
            .map(|j| names[j].clone())
            .collect();
        if !opts.allow_rank_repair {
            bail!(
                "Covariate matrix is rank-deficient: {} of {} columns are linearly \
                 dependent ({}). Rerun with --allow-rank-repair to drop them.",
                dropped.len(),
                covariates.len(),
                dropped.join(", ")
            );
        }
        info!(
            "Rank repair: retained {} of {} covariates, dropped {}",
            kept.len(),
            covariates.len(),
            dropped.join(", ")
        );
        report.dropped_collinear = dropped;
    }

    Ok(kept)
}

/// Where a binary column quasi-separates the phenotype.
struct Separation {
    col: usize,
    /// Covariate level (0 or 1) whose samples must go, if any.
    remove_level: Option<f64>,
}

/// Find the first quasi-separating binary covariate column.
///
/// A level separates when all but `max_level_exceptions` of its samples
/// share one phenotype value. Samples are only removed for a flagged
/// level that is the smaller of the column's two levels; a flagged
/// majority level is resolved by dropping the column alone.
fn find_separation(
    phenotype: &[f64],
    cols: &[Vec<f64>],
    max_exceptions: usize,
) -> Option<Separation> {
    // A phenotype whose minority class is within the exception
    // tolerance is effectively constant; no covariate can separate it,
    // and without this guard every binary column would be flagged.
    let n_ones = phenotype.iter().filter(|&&y| y == 1.0).count();
    if n_ones.min(phenotype.len() - n_ones) <= max_exceptions {
        return None;
    }

    for (j, col) in cols.iter().enumerate() {
        if !is_binary_vector(col) {
            continue;
        }
        let mut flagged_levels: Vec<(f64, usize)> = Vec::new();
        for level in [0.0, 1.0] {
            let level_pheno: Vec<f64> = phenotype
                .iter()
                .zip(col.iter())
                .filter(|(_, &c)| c == level)
                .map(|(&y, _)| y)
                .collect();
            if level_pheno.is_empty() {
                continue;
            }
            let n_ones = level_pheno.iter().filter(|&&y| y == 1.0).count();
            let exceptions = n_ones.min(level_pheno.len() - n_ones);
            if exceptions <= max_exceptions {
                flagged_levels.push((level, level_pheno.len()));
            }
        }
        if flagged_levels.is_empty() {
            continue;
        }
        // Constant column: single level covering everyone, nothing to
        // separate (rank repair owns that case).
        let level_sizes: Vec<usize> = [0.0, 1.0]
            .iter()
            .map(|&l| col.iter().filter(|&&c| c == l).count())
            .collect();
        if level_sizes.contains(&0) {
            continue;
        }
        let minority_size = *level_sizes.iter().min().expect("two levels");
        let remove_level = flagged_levels
            .iter()
            .find(|&&(_, size)| size == minority_size)
            .map(|&(level, _)| level);
        return Some(Separation {
            col: j,
            remove_level,
        });
    }
    None
}

/// Remove quasi-separating binary columns and the samples of their
/// separating levels, iterating until the matrix is separation-free.
fn separation_repair(
    ids: &mut Vec<String>,
    phenotype: &mut Vec<f64>,
    cols: &mut Vec<Vec<f64>>,
    names: &mut Vec<String>,
    opts: &SanitizeOptions,
    report: &mut SanitizeReport,
) -> Result<()> {
    // Authorization check sees the full set of offenders up front.
    if !opts.allow_separation_repair {
        let offenders = cols
            .iter()
            .filter(|&col| {
                find_separation(phenotype, std::slice::from_ref(col), opts.max_level_exceptions)
                    .is_some()
            })
            .count();
        if offenders > 0 {
            bail!(
                "{} covariate column(s) quasi-completely separate the binary phenotype. \
                 Rerun with --allow-separation-repair to remove them.",
                offenders
            );
        }
        return Ok(());
    }

    while let Some(sep) = find_separation(phenotype, cols, opts.max_level_exceptions) {
        let name = names.remove(sep.col);
        let col = cols.remove(sep.col);
        if let Some(level) = sep.remove_level {
            let keep: Vec<usize> = (0..phenotype.len())
                .filter(|&i| col[i] != level)
                .collect();
            let removed = phenotype.len() - keep.len();
            *ids = keep.iter().map(|&i| ids[i].clone()).collect();
            *phenotype = keep.iter().map(|&i| phenotype[i]).collect();
            for c in cols.iter_mut() {
                *c = keep.iter().map(|&i| c[i]).collect();
            }
            report.n_samples_removed += removed;
            info!(
                "Separation repair: dropped covariate '{}' and {} samples of level {}",
                name, removed, level
            );
        } else {
            info!("Separation repair: dropped covariate '{}'", name);
        }
        report.dropped_separating.push(name);
    }
    Ok(())
}
