//! Cohort dataset parsing.
//!
//! One row per sample: sample ID, phenotype, numeric covariates.
//! Missing values (NA and friends) parse to NaN; `complete_cases`
//! applies the one-time, irreversible drop of samples with any
//! missing phenotype or covariate value.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Parsed cohort data, one entry per sample.
#[derive(Debug, Clone)]
pub struct CohortData {
    /// Sample IDs in file order.
    pub sample_ids: Vec<String>,
    /// Phenotype values (NaN for missing).
    pub phenotype: Vec<f64>,
    /// Covariate rows: covariates[i][j] = sample i, covariate j.
    pub covariates: Vec<Vec<f64>>,
    /// Covariate column names.
    pub covariate_names: Vec<String>,
}

impl CohortData {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Drop samples with a missing phenotype or any missing covariate.
    pub fn complete_cases(&self) -> CohortData {
        let keep: Vec<usize> = (0..self.n_samples())
            .filter(|&i| {
                !self.phenotype[i].is_nan() && !self.covariates[i].iter().any(|v| v.is_nan())
            })
            .collect();
        if keep.len() < self.n_samples() {
            info!(
                "Dropped {} of {} samples with missing phenotype or covariates",
                self.n_samples() - keep.len(),
                self.n_samples()
            );
        }
        CohortData {
            sample_ids: keep.iter().map(|&i| self.sample_ids[i].clone()).collect(),
            phenotype: keep.iter().map(|&i| self.phenotype[i]).collect(),
            covariates: keep.iter().map(|&i| self.covariates[i].clone()).collect(),
            covariate_names: self.covariate_names.clone(),
        }
    }
}

/// Parse a cohort dataset CSV.
pub fn read_cohort_file(
    path: &Path,
    sample_id_col: &str,
    pheno_col: &str,
    covar_cols: &[String],
) -> Result<CohortData> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open cohort file: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);

    let id_idx = col(sample_id_col).ok_or_else(|| {
        anyhow::anyhow!("Sample ID column '{}' not found in header", sample_id_col)
    })?;
    let pheno_idx = col(pheno_col)
        .ok_or_else(|| anyhow::anyhow!("Phenotype column '{}' not found in header", pheno_col))?;
    let covar_indices: Vec<usize> = covar_cols
        .iter()
        .map(|name| {
            col(name).ok_or_else(|| {
                anyhow::anyhow!("Covariate column '{}' not found in header", name)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sample_ids = Vec::new();
    let mut phenotype = Vec::new();
    let mut covariates = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad cohort file row {}", row + 2))?;
        let get = |idx: usize| record.get(idx).unwrap_or_default();

        sample_ids.push(get(id_idx).to_string());
        phenotype.push(parse_value(get(pheno_idx)));
        covariates.push(covar_indices.iter().map(|&i| parse_value(get(i))).collect());
    }

    Ok(CohortData {
        sample_ids,
        phenotype,
        covariates,
        covariate_names: covar_cols.to_vec(),
    })
}

/// Read covariate column names from a JSON array file.
pub fn covariate_columns_from_json(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open covariate JSON: {}", path.display()))?;
    let cols: Vec<String> = serde_json::from_reader(file)
        .with_context(|| format!("Covariate JSON {} is not an array of strings", path.display()))?;
    Ok(cols)
}

/// Parse a string value to f64, treating NA/missing as NaN.
fn parse_value(s: &str) -> f64 {
    match s {
        "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan" => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1.5"), 1.5);
        assert_eq!(parse_value("0"), 0.0);
        assert!(parse_value("NA").is_nan());
        assert!(parse_value(".").is_nan());
        assert!(parse_value("").is_nan());
    }

    #[test]
    fn test_read_cohort_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "iid,y,age,sex").unwrap();
        writeln!(f, "S1,1,45,1").unwrap();
        writeln!(f, "S2,0,50,2").unwrap();
        writeln!(f, "S3,NA,55,1").unwrap();

        let cohort = read_cohort_file(
            &path,
            "iid",
            "y",
            &["age".to_string(), "sex".to_string()],
        )
        .unwrap();

        assert_eq!(cohort.sample_ids, vec!["S1", "S2", "S3"]);
        assert_eq!(cohort.phenotype[0], 1.0);
        assert!(cohort.phenotype[2].is_nan());
        assert_eq!(cohort.covariates[0], vec![45.0, 1.0]);
    }

    #[test]
    fn test_complete_cases() {
        let cohort = CohortData {
            sample_ids: vec!["S1".into(), "S2".into(), "S3".into()],
            phenotype: vec![1.0, f64::NAN, 0.0],
            covariates: vec![vec![1.0], vec![2.0], vec![f64::NAN]],
            covariate_names: vec!["x".into()],
        };
        let complete = cohort.complete_cases();
        assert_eq!(complete.sample_ids, vec!["S1"]);
        assert_eq!(complete.phenotype, vec![1.0]);
        // Original is untouched.
        assert_eq!(cohort.n_samples(), 3);
    }

    #[test]
    fn test_covariate_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("covars.json");
        std::fs::write(&path, r#"["age", "sex", "pc1"]"#).unwrap();
        let cols = covariate_columns_from_json(&path).unwrap();
        assert_eq!(cols, vec!["age", "sex", "pc1"]);
    }
}
