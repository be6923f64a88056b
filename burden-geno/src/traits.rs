//! Core trait for genotype probability sources.

use anyhow::Result;

/// Probability mass over 0, 1, or 2 copies of allele 1 for one sample
/// at one variant. Entries sum to 1 for a well-formed source.
pub type GenotypeProbs = [f64; 3];

/// Trait for reading per-variant genotype probabilities from a source.
///
/// Implementations must be safe to call repeatedly and in any order:
/// a `variant_probabilities` call carries no cursor state, so lookups
/// for different variants never affect each other's results. All
/// methods therefore take `&self`.
pub trait GenotypeSource: Send {
    /// Total number of variants in the source.
    fn n_variants(&self) -> usize;

    /// Total number of samples in the source.
    fn n_samples(&self) -> usize;

    /// Sample IDs in source order. The order is fixed for the lifetime
    /// of the source and applies to every variant.
    fn sample_ids(&self) -> &[String];

    /// Genotype probability triples for the variant at `index`, one
    /// per sample, in `sample_ids()` order.
    fn variant_probabilities(&self, index: u64) -> Result<Vec<GenotypeProbs>>;
}
