//! Per-gene variant files.
//!
//! Each gene has one CSV named `<gene_index>.csv` listing the variants
//! that belong to it:
//!
//! ```text
//! genotype_source_index,genotype_source_variant_index,effect_score
//! 0,12,0.83
//! 0,47,0.10
//! ```
//!
//! An optional boolean column (name chosen by the caller) records
//! whether allele 1 is the reference allele; absent means true.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// One variant belonging to a gene.
#[derive(Debug, Clone)]
pub struct GeneVariantRecord {
    /// Positional index into the genotyping spec.
    pub source_index: usize,
    /// Variant index within that source.
    pub variant_index: u64,
    /// Damage magnitude in [0, 1). A score of 1 would imply certain
    /// loss of function and is rejected.
    pub effect_score: f64,
    /// Whether allele 1 is the reference allele.
    pub is_allele1_ref: bool,
}

/// Read a gene's variant records. `ref_allele_col` names the optional
/// reference-allele boolean column.
pub fn read_gene_variants(
    path: &Path,
    ref_allele_col: Option<&str>,
) -> Result<Vec<GeneVariantRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open variant file: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let source_idx = col("genotype_source_index").ok_or_else(|| {
        anyhow::anyhow!("Variant file missing 'genotype_source_index' column")
    })?;
    let variant_idx = col("genotype_source_variant_index").ok_or_else(|| {
        anyhow::anyhow!("Variant file missing 'genotype_source_variant_index' column")
    })?;
    let score_idx = col("effect_score")
        .ok_or_else(|| anyhow::anyhow!("Variant file missing 'effect_score' column"))?;
    let ref_idx = ref_allele_col.and_then(col);

    let mut records = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad variant file row {}", row + 2))?;
        let get = |idx: usize| record.get(idx).unwrap_or_default();

        let source_index: usize = get(source_idx)
            .parse()
            .with_context(|| format!("Row {}: bad genotype_source_index", row + 2))?;
        let variant_index: u64 = get(variant_idx)
            .parse()
            .with_context(|| format!("Row {}: bad genotype_source_variant_index", row + 2))?;
        let effect_score: f64 = get(score_idx)
            .parse()
            .with_context(|| format!("Row {}: bad effect_score", row + 2))?;
        if !(0.0..1.0).contains(&effect_score) {
            bail!(
                "Row {}: effect_score {} outside [0, 1)",
                row + 2,
                effect_score
            );
        }

        let is_allele1_ref = match ref_idx {
            Some(i) => parse_bool(get(i))
                .with_context(|| format!("Row {}: bad reference-allele flag", row + 2))?,
            None => true,
        };

        records.push(GeneVariantRecord {
            source_index,
            variant_index,
            effect_score,
            is_allele1_ref,
        });
    }

    if records.is_empty() {
        bail!("Variant file {} has no variant rows", path.display());
    }

    Ok(records)
}

/// The single genotyping source all records must reference. A gene
/// split across sources is a data-integrity error.
pub fn single_source_index(records: &[GeneVariantRecord]) -> Result<usize> {
    let first = records[0].source_index;
    if records.iter().any(|r| r.source_index != first) {
        bail!("Gene references more than one genotyping source");
    }
    Ok(first)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        // Absent value falls back to the allele-1-is-reference default.
        "" => Ok(true),
        other => bail!("Cannot parse '{}' as a boolean", other),
    }
}

/// List `<gene_index>.csv` files in a directory, sorted by gene index.
/// The sorted list is the run's fixed, ordered gene set that sharding
/// partitions. Files whose stem is not a non-negative integer are
/// ignored.
pub fn list_gene_files(dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut genes = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if let Ok(index) = stem.parse::<u64>() {
                genes.push((index, path));
            }
        }
    }
    genes.sort_by_key(|(index, _)| *index);
    Ok(genes)
}
