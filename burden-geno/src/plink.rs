//! PLINK bed/bim/fam source using memory-mapped files.
//!
//! PLINK binary format consists of three files:
//! - .bed: Binary genotype data (2 bits per genotype, packed)
//! - .bim: Variant information (chrom, id, cm, pos, a1, a2)
//! - .fam: Sample information (fid, iid, father, mother, sex, pheno)
//!
//! Hard calls are exposed as degenerate probability triples over
//! copies of allele 1; missing genotypes get Hardy-Weinberg triples
//! computed from the variant's observed allele-1 frequency.
//!
//! Reference: https://www.cog-genomics.org/plink/1.9/formats#bed

use std::path::Path;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

use crate::traits::{GenotypeProbs, GenotypeSource};

/// Genotype source backed by a PLINK bed/bim/fam fileset.
pub struct PlinkSource {
    /// Memory-mapped .bed file.
    mmap: Mmap,
    /// Number of variants (lines in the .bim file).
    n_variants: usize,
    /// Sample IDs (IID column of the .fam file).
    sample_ids: Vec<String>,
    /// Number of bytes per variant in the bed file.
    bytes_per_variant: usize,
}

impl PlinkSource {
    /// Open PLINK files from a base path (without extension).
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base = base_path.as_ref();
        let bed_path = base.with_extension("bed");
        let bim_path = base.with_extension("bim");
        let fam_path = base.with_extension("fam");

        let sample_ids = Self::parse_fam(&fam_path)?;
        let n_variants = Self::count_bim_variants(&bim_path)?;
        let n_samples = sample_ids.len();

        let bed_file = std::fs::File::open(&bed_path)
            .with_context(|| format!("Failed to open bed file: {}", bed_path.display()))?;
        let mmap = unsafe { Mmap::map(&bed_file)? };

        if mmap.len() < 3 {
            bail!("Bed file too small: {}", bed_path.display());
        }
        if mmap[0] != 0x6C || mmap[1] != 0x1B {
            bail!("Invalid PLINK bed file magic number");
        }
        if mmap[2] != 0x01 {
            bail!("Only SNP-major bed files are supported (mode byte = 0x01)");
        }

        let bytes_per_variant = n_samples.div_ceil(4);
        let expected_size = 3 + bytes_per_variant * n_variants;
        if mmap.len() < expected_size {
            bail!(
                "Bed file too small: expected at least {} bytes, got {}",
                expected_size,
                mmap.len()
            );
        }

        Ok(Self {
            mmap,
            n_variants,
            sample_ids,
            bytes_per_variant,
        })
    }

    /// Parse sample IDs (IID column) from a .fam file.
    fn parse_fam(path: &Path) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fam file: {}", path.display()))?;
        let mut ids = Vec::new();
        for (line_num, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                bail!("Fam file line {} has fewer than 6 fields", line_num + 1);
            }
            ids.push(fields[1].to_string());
        }
        Ok(ids)
    }

    /// Count variants in a .bim file.
    fn count_bim_variants(path: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bim file: {}", path.display()))?;
        let mut n = 0;
        for (line_num, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.split_whitespace().count() < 6 {
                bail!("Bim file line {} has fewer than 6 fields", line_num + 1);
            }
            n += 1;
        }
        Ok(n)
    }

    /// Decode a single genotype from the bed file.
    /// Returns the allele-1 dosage: 0, 1, 2, or None for missing.
    #[inline]
    fn decode_genotype(byte: u8, offset: usize) -> Option<u8> {
        let bits = (byte >> (offset * 2)) & 0x03;
        match bits {
            0b00 => Some(2), // Homozygous A1/A1
            0b01 => None,    // Missing
            0b10 => Some(1), // Heterozygous
            0b11 => Some(0), // Homozygous A2/A2
            _ => unreachable!(),
        }
    }

    /// Hardy-Weinberg probability triple for allele-1 frequency `f`.
    #[inline]
    fn hwe_probs(f: f64) -> GenotypeProbs {
        let q = 1.0 - f;
        [q * q, 2.0 * f * q, f * f]
    }
}

impl GenotypeSource for PlinkSource {
    fn n_variants(&self) -> usize {
        self.n_variants
    }

    fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    fn variant_probabilities(&self, index: u64) -> Result<Vec<GenotypeProbs>> {
        let variant_idx = index as usize;
        if variant_idx >= self.n_variants {
            bail!(
                "Variant index {} out of range ({})",
                index,
                self.n_variants
            );
        }

        let n = self.sample_ids.len();
        let offset = 3 + variant_idx * self.bytes_per_variant;

        let mut dosages: Vec<Option<u8>> = Vec::with_capacity(n);
        for sample_idx in 0..n {
            let byte = self.mmap[offset + sample_idx / 4];
            dosages.push(Self::decode_genotype(byte, sample_idx % 4));
        }

        // Allele-1 frequency among observed genotypes, used for missing
        // entries. An all-missing variant falls back to frequency 0.
        let (sum, n_valid) = dosages
            .iter()
            .flatten()
            .fold((0u64, 0u64), |(s, c), &d| (s + u64::from(d), c + 1));
        let freq = if n_valid > 0 {
            sum as f64 / (2.0 * n_valid as f64)
        } else {
            0.0
        };

        Ok(dosages
            .into_iter()
            .map(|d| match d {
                Some(0) => [1.0, 0.0, 0.0],
                Some(1) => [0.0, 1.0, 0.0],
                Some(_) => [0.0, 0.0, 1.0],
                None => Self::hwe_probs(freq),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_genotype() {
        assert_eq!(PlinkSource::decode_genotype(0b00_00_00_00, 0), Some(2));
        assert_eq!(PlinkSource::decode_genotype(0b00_00_00_01, 0), None);
        assert_eq!(PlinkSource::decode_genotype(0b00_00_00_10, 0), Some(1));
        assert_eq!(PlinkSource::decode_genotype(0b00_00_00_11, 0), Some(0));
    }

    #[test]
    fn test_decode_genotype_offsets() {
        let byte: u8 = 0b11_10_01_00;
        assert_eq!(PlinkSource::decode_genotype(byte, 0), Some(2));
        assert_eq!(PlinkSource::decode_genotype(byte, 1), None);
        assert_eq!(PlinkSource::decode_genotype(byte, 2), Some(1));
        assert_eq!(PlinkSource::decode_genotype(byte, 3), Some(0));
    }

    /// Write a tiny bed/bim/fam fileset and return its base path.
    fn write_fixture(dir: &Path) -> std::path::PathBuf {
        let base = dir.join("toy");
        let mut fam = std::fs::File::create(base.with_extension("fam")).unwrap();
        for i in 0..4 {
            writeln!(fam, "F{i} S{i} 0 0 0 -9").unwrap();
        }
        let mut bim = std::fs::File::create(base.with_extension("bim")).unwrap();
        writeln!(bim, "1 rs1 0 100 A G").unwrap();
        writeln!(bim, "1 rs2 0 200 C T").unwrap();
        // Variant 0: S0=hom A1, S1=het, S2=hom A2, S3=missing
        // Variant 1: all het
        let bed: Vec<u8> = vec![0x6C, 0x1B, 0x01, 0b01_11_10_00, 0b10_10_10_10];
        std::fs::write(base.with_extension("bed"), bed).unwrap();
        base
    }

    #[test]
    fn test_read_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let source = PlinkSource::new(write_fixture(dir.path())).unwrap();
        assert_eq!(source.n_samples(), 4);
        assert_eq!(source.n_variants(), 2);
        assert_eq!(source.sample_ids(), &["S0", "S1", "S2", "S3"]);

        let probs = source.variant_probabilities(0).unwrap();
        assert_eq!(probs[0], [0.0, 0.0, 1.0]);
        assert_eq!(probs[1], [0.0, 1.0, 0.0]);
        assert_eq!(probs[2], [1.0, 0.0, 0.0]);
        // Missing genotype: HWE triple at freq (2+1+0)/6 = 0.5
        let p3 = probs[3];
        assert!((p3[0] - 0.25).abs() < 1e-12);
        assert!((p3[1] - 0.5).abs() < 1e-12);
        assert!((p3[2] - 0.25).abs() < 1e-12);

        let probs = source.variant_probabilities(1).unwrap();
        assert!(probs.iter().all(|p| *p == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_out_of_range_variant() {
        let dir = tempfile::tempdir().unwrap();
        let source = PlinkSource::new(write_fixture(dir.path())).unwrap();
        assert!(source.variant_probabilities(2).is_err());
    }
}
