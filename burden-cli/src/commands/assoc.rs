//! Stage 2: per-gene association tests.
//!
//! burden assoc --cohort-file cohort.csv --scores-dir scores/ \
//!     --output-dir results/ --sample-id-col iid --pheno-col y \
//!     --covar-cols age,sex
//!
//! The cohort is parsed and sanitized once; the trait type is detected
//! once; then each gene score file in this task's shard is aligned to
//! the cohort and tested. Per-gene failures are logged and skipped.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{error, info};

use burden_core::assoc::{detect_trait_type, test_gene, TraitType};
use burden_core::sanitize::{sanitize_covariates, SanitizeOptions, SanitizedCohort};
use burden_core::shard;
use burden_geno::cohort::{covariate_columns_from_json, read_cohort_file};
use burden_geno::sample::{intersect_ordered, reorder_f64};
use burden_geno::scores::read_scores;
use burden_geno::variants::list_gene_files;

#[derive(Args)]
pub struct AssocArgs {
    /// Cohort CSV: sample IDs, phenotype, covariates
    #[arg(long)]
    cohort_file: PathBuf,

    /// Directory of per-gene score files from the gene-scores stage
    #[arg(long)]
    scores_dir: PathBuf,

    /// Output directory for per-gene result files
    #[arg(long)]
    output_dir: PathBuf,

    /// Sample ID column name
    #[arg(long, default_value = "sample_id")]
    sample_id_col: String,

    /// Phenotype column name
    #[arg(long)]
    pheno_col: String,

    /// Covariate column names (comma-separated)
    #[arg(long, default_value = "")]
    covar_cols: String,

    /// JSON array file of covariate column names (overrides --covar-cols)
    #[arg(long)]
    covar_json: Option<PathBuf>,

    /// Authorize dropping linearly dependent covariate columns
    #[arg(long)]
    allow_rank_repair: bool,

    /// Authorize removing separating covariates and their samples
    #[arg(long)]
    allow_separation_repair: bool,

    /// Minimum cohort/score sample overlap to test a gene
    #[arg(long, default_value = "30")]
    min_overlap: usize,

    /// This task's index in a distributed run
    #[arg(long, default_value = "0")]
    task_index: usize,

    /// Total number of tasks in a distributed run
    #[arg(long, default_value = "1")]
    total_tasks: usize,
}

pub fn run(args: AssocArgs) -> Result<()> {
    super::check_sharding(args.total_tasks, args.task_index)?;

    let covar_cols: Vec<String> = match &args.covar_json {
        Some(path) => covariate_columns_from_json(path)?,
        None if args.covar_cols.is_empty() => Vec::new(),
        None => args
            .covar_cols
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
    };

    let raw = read_cohort_file(
        &args.cohort_file,
        &args.sample_id_col,
        &args.pheno_col,
        &covar_cols,
    )?;
    info!("Loaded cohort with {} samples", raw.n_samples());
    let complete = raw.complete_cases();
    if complete.n_samples() == 0 {
        bail!("No samples remain after dropping missing phenotype/covariate values");
    }

    // Column-major covariates for the sanitizer.
    let covar_columns: Vec<Vec<f64>> = (0..covar_cols.len())
        .map(|j| complete.covariates.iter().map(|row| row[j]).collect())
        .collect();
    let opts = SanitizeOptions {
        allow_rank_repair: args.allow_rank_repair,
        allow_separation_repair: args.allow_separation_repair,
        ..Default::default()
    };
    let cohort = sanitize_covariates(
        &complete.sample_ids,
        &complete.phenotype,
        &covar_columns,
        &complete.covariate_names,
        &opts,
    )?;

    let trait_type = detect_trait_type(&cohort.phenotype);
    info!(
        "Testing {:?} phenotype on {} samples with {} covariates",
        trait_type,
        cohort.sample_ids.len(),
        cohort.covariate_names.len()
    );

    let genes = list_gene_files(&args.scores_dir)?;
    let (start, end) = shard(genes.len(), args.total_tasks, args.task_index);
    info!(
        "Task {}/{} claims genes [{}, {}) of {}",
        args.task_index,
        args.total_tasks,
        start,
        end,
        genes.len()
    );

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output dir: {}", args.output_dir.display()))?;

    let mut n_ok = 0usize;
    let mut n_failed = 0usize;
    for (gene_index, path) in &genes[start..end] {
        let out_path = args.output_dir.join(format!("{gene_index}.csv"));
        match test_one_gene(path, &out_path, &cohort, trait_type, args.min_overlap) {
            Ok(n) => {
                n_ok += 1;
                info!("Gene {}: tested {} samples", gene_index, n);
            }
            Err(e) => {
                n_failed += 1;
                error!("Gene {} failed: {:#}", gene_index, e);
            }
        }
    }

    info!("Association done: {} succeeded, {} failed", n_ok, n_failed);
    Ok(())
}

fn test_one_gene(
    scores_path: &Path,
    out_path: &Path,
    cohort: &SanitizedCohort,
    trait_type: TraitType,
    min_overlap: usize,
) -> Result<usize> {
    let scores = read_scores(scores_path)?;
    let (cohort_idx, score_idx) = intersect_ordered(&cohort.sample_ids, &scores.sample_ids);
    if cohort_idx.len() < min_overlap {
        bail!(
            "only {} samples overlap the cohort (minimum {})",
            cohort_idx.len(),
            min_overlap
        );
    }

    let pheno = reorder_f64(&cohort.phenotype, &cohort_idx);
    let covariates = cohort.covariates.select_rows(&cohort_idx);
    let dominant = reorder_f64(&scores.dominant, &score_idx);
    let recessive = reorder_f64(&scores.recessive, &score_idx);

    let result = test_gene(&pheno, &covariates, &dominant, &recessive, trait_type)?;
    std::fs::write(out_path, format!("{}\n", result.to_csv_row()))
        .with_context(|| format!("Failed to write result file: {}", out_path.display()))?;
    Ok(result.n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_cohort(dir: &Path, n: usize) -> PathBuf {
        let path = dir.join("cohort.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "iid,y,age").unwrap();
        for i in 0..n {
            // Quantitative phenotype rising with an age covariate.
            writeln!(f, "S{},{},{}", i, i as f64 * 0.1, 40 + (i % 20)).unwrap();
        }
        path
    }

    fn write_score_file(dir: &Path, gene: u64, n: usize) {
        let path = dir.join(format!("{gene}.csv"));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "sample_id,dominant,recessive").unwrap();
        for i in 0..n {
            writeln!(
                f,
                "S{},{},{}",
                i,
                (i % 7) as f64 / 10.0,
                (i % 3) as f64 / 10.0
            )
            .unwrap();
        }
    }

    fn base_args(dir: &Path) -> AssocArgs {
        AssocArgs {
            cohort_file: dir.join("cohort.csv"),
            scores_dir: dir.join("scores"),
            output_dir: dir.join("results"),
            sample_id_col: "iid".to_string(),
            pheno_col: "y".to_string(),
            covar_cols: "age".to_string(),
            covar_json: None,
            allow_rank_repair: false,
            allow_separation_repair: false,
            min_overlap: 30,
            task_index: 0,
            total_tasks: 1,
        }
    }

    #[test]
    fn test_end_to_end_results_written() {
        let dir = tempfile::tempdir().unwrap();
        write_cohort(dir.path(), 60);
        let scores_dir = dir.path().join("scores");
        std::fs::create_dir(&scores_dir).unwrap();
        write_score_file(&scores_dir, 0, 60);
        write_score_file(&scores_dir, 1, 60);

        let args = base_args(dir.path());
        let results_dir = args.output_dir.clone();
        run(args).unwrap();

        for gene in 0..2 {
            let row = std::fs::read_to_string(results_dir.join(format!("{gene}.csv"))).unwrap();
            let fields: Vec<&str> = row.trim().split(',').collect();
            assert_eq!(fields.len(), 7);
            assert_eq!(fields[0], "60");
        }
    }

    /// A gene with too few overlapping samples is skipped, not fatal.
    #[test]
    fn test_insufficient_overlap_skips_gene() {
        let dir = tempfile::tempdir().unwrap();
        write_cohort(dir.path(), 60);
        let scores_dir = dir.path().join("scores");
        std::fs::create_dir(&scores_dir).unwrap();
        write_score_file(&scores_dir, 0, 60);
        // Gene 1's scores cover only 5 cohort samples.
        write_score_file(&scores_dir, 1, 5);

        let args = base_args(dir.path());
        let results_dir = args.output_dir.clone();
        run(args).unwrap();

        assert!(results_dir.join("0.csv").exists());
        assert!(!results_dir.join("1.csv").exists());
    }

    #[test]
    fn test_unauthorized_rank_repair_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // Duplicate covariate columns force rank repair.
        let path = dir.path().join("cohort.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "iid,y,age,age2").unwrap();
        for i in 0..40 {
            writeln!(f, "S{},{},{},{}", i, i as f64, 40 + i, 40 + i).unwrap();
        }
        drop(f);
        let scores_dir = dir.path().join("scores");
        std::fs::create_dir(&scores_dir).unwrap();
        write_score_file(&scores_dir, 0, 40);

        let mut args = base_args(dir.path());
        args.covar_cols = "age,age2".to_string();
        assert!(run(args).is_err());
    }

    #[test]
    fn test_covar_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        write_cohort(dir.path(), 60);
        let scores_dir = dir.path().join("scores");
        std::fs::create_dir(&scores_dir).unwrap();
        write_score_file(&scores_dir, 0, 60);
        let json_path = dir.path().join("covars.json");
        std::fs::write(&json_path, r#"["age"]"#).unwrap();

        let mut args = base_args(dir.path());
        args.covar_cols = String::new();
        args.covar_json = Some(json_path);
        let results_dir = args.output_dir.clone();
        run(args).unwrap();
        assert!(results_dir.join("0.csv").exists());
    }
}
