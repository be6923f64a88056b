//! burden-geno: Genotype and cohort I/O for burden-rs
//!
//! Provides the `GenotypeSource` trait with a PLINK bed/bim/fam
//! implementation, the genotyping source spec file, per-gene variant
//! files, cohort dataset parsing, effect-score files, and sample-ID
//! alignment.

pub mod bgen;
pub mod cohort;
pub mod plink;
pub mod sample;
pub mod scores;
pub mod source_spec;
pub mod traits;
pub mod variants;

pub use source_spec::{open_source, GenotypingSourceSpec, SourceFormat};
pub use traits::{GenotypeProbs, GenotypeSource};
