//! Genotyping source spec file.
//!
//! One row per upstream genotype provider, immutable for a run and
//! looked up by positional index from gene variant files:
//!
//! ```text
//! name,format,bed_prefix,bgen_path
//! array,plink,/data/array_chr1,
//! imputed,bgen,,/data/imputed_chr1.bgen
//! ```

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::bgen::BgenSource;
use crate::plink::PlinkSource;
use crate::traits::GenotypeSource;

/// Supported genotype file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Plink,
    Bgen,
}

impl FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plink" => Ok(SourceFormat::Plink),
            "bgen" => Ok(SourceFormat::Bgen),
            other => bail!("Unknown genotyping source format: '{}'", other),
        }
    }
}

/// One row of the genotyping spec file.
#[derive(Debug, Clone)]
pub struct GenotypingSourceSpec {
    /// Unique source name, used only for diagnostics.
    pub name: String,
    pub format: SourceFormat,
    /// PLINK base path (without extension). Required for `plink` rows.
    pub bed_prefix: Option<String>,
    /// BGEN file path. Required for `bgen` rows.
    pub bgen_path: Option<String>,
}

/// Parse a genotyping spec CSV. Row order defines the positional index
/// that gene variant files reference.
pub fn parse_genotyping_spec(path: &Path) -> Result<Vec<GenotypingSourceSpec>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open genotyping spec: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let name_idx = col("name")
        .ok_or_else(|| anyhow::anyhow!("Genotyping spec missing 'name' column"))?;
    let format_idx = col("format")
        .ok_or_else(|| anyhow::anyhow!("Genotyping spec missing 'format' column"))?;
    let bed_idx = col("bed_prefix");
    let bgen_idx = col("bgen_path");

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let mut specs = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad genotyping spec row {}", row + 2))?;
        let name = record
            .get(name_idx)
            .unwrap_or_default()
            .to_string();
        let format: SourceFormat = record
            .get(format_idx)
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("Genotyping spec row {} ('{}')", row + 2, name))?;

        let spec = GenotypingSourceSpec {
            name,
            format,
            bed_prefix: field(&record, bed_idx),
            bgen_path: field(&record, bgen_idx),
        };
        match spec.format {
            SourceFormat::Plink if spec.bed_prefix.is_none() => {
                bail!("Source '{}' is plink but has no bed_prefix", spec.name)
            }
            SourceFormat::Bgen if spec.bgen_path.is_none() => {
                bail!("Source '{}' is bgen but has no bgen_path", spec.name)
            }
            _ => {}
        }
        specs.push(spec);
    }

    let mut names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    if names.len() != specs.len() {
        bail!("Genotyping spec contains duplicate source names");
    }

    Ok(specs)
}

/// Open a genotype source for a spec row. `temp_dir` is reserved for
/// external format adapters that need scratch space.
pub fn open_source(
    spec: &GenotypingSourceSpec,
    _temp_dir: Option<&Path>,
) -> Result<Box<dyn GenotypeSource>> {
    match spec.format {
        SourceFormat::Plink => {
            let prefix = spec.bed_prefix.as_ref().expect("validated at parse");
            Ok(Box::new(PlinkSource::new(prefix)?))
        }
        SourceFormat::Bgen => {
            let path = spec.bgen_path.as_ref().expect("validated at parse");
            Ok(Box::new(BgenSource::new(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,format,bed_prefix,bgen_path").unwrap();
        writeln!(f, "array,plink,/data/array,").unwrap();
        writeln!(f, "imputed,bgen,,/data/imp.bgen").unwrap();

        let specs = parse_genotyping_spec(&path).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "array");
        assert_eq!(specs[0].format, SourceFormat::Plink);
        assert_eq!(specs[0].bed_prefix.as_deref(), Some("/data/array"));
        assert_eq!(specs[1].format, SourceFormat::Bgen);
        assert_eq!(specs[1].bgen_path.as_deref(), Some("/data/imp.bgen"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,format,bed_prefix").unwrap();
        writeln!(f, "a,plink,/x").unwrap();
        writeln!(f, "a,plink,/y").unwrap();
        assert!(parse_genotyping_spec(&path).is_err());
    }

    #[test]
    fn test_missing_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,format,bed_prefix").unwrap();
        writeln!(f, "a,plink,").unwrap();
        assert!(parse_genotyping_spec(&path).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,format,bed_prefix").unwrap();
        writeln!(f, "a,vcf,/x").unwrap();
        assert!(parse_genotyping_spec(&path).is_err());
    }
}
