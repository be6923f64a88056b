//! Per-gene effect-score files.
//!
//! One row per sample: `sample_id,dominant,recessive`. Written by the
//! gene-scores stage, read back by the association stage. Values are
//! rounded to the requested floating precision on write.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Per-sample dominant and recessive scores for one gene.
#[derive(Debug, Clone)]
pub struct GeneScores {
    pub sample_ids: Vec<String>,
    pub dominant: Vec<f64>,
    pub recessive: Vec<f64>,
}

/// Output numeric precision for score files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    F32,
    F64,
}

impl FromStr for Precision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "f32" | "float32" | "single" => Ok(Precision::F32),
            "f64" | "float64" | "double" => Ok(Precision::F64),
            other => bail!("Unknown precision '{}', expected f32 or f64", other),
        }
    }
}

impl Precision {
    fn format(self, v: f64) -> String {
        match self {
            Precision::F32 => format!("{}", v as f32),
            Precision::F64 => format!("{v}"),
        }
    }
}

/// Write a gene's score file.
pub fn write_scores(path: &Path, scores: &GeneScores, precision: Precision) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create score file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "sample_id,dominant,recessive")?;
    for i in 0..scores.sample_ids.len() {
        writeln!(
            writer,
            "{},{},{}",
            scores.sample_ids[i],
            precision.format(scores.dominant[i]),
            precision.format(scores.recessive[i]),
        )?;
    }
    Ok(())
}

/// Read a gene's score file.
pub fn read_scores(path: &Path) -> Result<GeneScores> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open score file: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow::anyhow!("Score file missing '{}' column", name))
    };
    let id_idx = col("sample_id")?;
    let dom_idx = col("dominant")?;
    let rec_idx = col("recessive")?;

    let mut scores = GeneScores {
        sample_ids: Vec::new(),
        dominant: Vec::new(),
        recessive: Vec::new(),
    };
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad score file row {}", row + 2))?;
        let get = |idx: usize| record.get(idx).unwrap_or_default();
        scores.sample_ids.push(get(id_idx).to_string());
        scores.dominant.push(
            get(dom_idx)
                .parse()
                .with_context(|| format!("Row {}: bad dominant score", row + 2))?,
        );
        scores.recessive.push(
            get(rec_idx)
                .parse()
                .with_context(|| format!("Row {}: bad recessive score", row + 2))?,
        );
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("7.csv");
        let scores = GeneScores {
            sample_ids: vec!["S1".into(), "S2".into()],
            dominant: vec![0.25, 0.5],
            recessive: vec![0.0625, 0.125],
        };
        write_scores(&path, &scores, Precision::F64).unwrap();
        let back = read_scores(&path).unwrap();
        assert_eq!(back.sample_ids, scores.sample_ids);
        assert_eq!(back.dominant, scores.dominant);
        assert_eq!(back.recessive, scores.recessive);
    }

    #[test]
    fn test_f32_precision_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.csv");
        let scores = GeneScores {
            sample_ids: vec!["S1".into()],
            dominant: vec![0.123456789012345],
            recessive: vec![0.0],
        };
        write_scores(&path, &scores, Precision::F32).unwrap();
        let back = read_scores(&path).unwrap();
        assert!((back.dominant[0] - 0.123456789012345f64 as f32 as f64).abs() < 1e-12);
    }

    #[test]
    fn test_precision_from_str() {
        assert_eq!("f32".parse::<Precision>().unwrap(), Precision::F32);
        assert_eq!("F64".parse::<Precision>().unwrap(), Precision::F64);
        assert!("f16".parse::<Precision>().is_err());
    }
}
