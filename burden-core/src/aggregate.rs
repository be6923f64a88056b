//! Dominant and recessive gene-score aggregation.
//!
//! Collapses a gene's qualifying variants into two per-sample scores in
//! `[0, 1)`. Inputs are genotype probability triples already oriented
//! to non-reference allele copies, weighted by each variant's effect
//! score.
//!
//! Dominant model: one damaged copy suffices, so a variant contributes
//! its full carrier probability `P1 + P2`. Recessive model: both copies
//! must be hit, via homozygosity (`P2`) or a compound-heterozygote pair
//! of distinct variants (`P1` of the two strongest het contributions).
//! Per-variant contributions combine through a blend of the maximum and
//! a power mean, tunable between "worst variant dominates" and "burden
//! accumulates".

use anyhow::{bail, ensure, Result};

/// Aggregation model parameters.
///
/// `mu_*` blends max (`1.0`) against the power mean (`0.0`); `p_*` is
/// the power-mean exponent; `q_r` sharpens the compound-heterozygote
/// term.
#[derive(Debug, Clone, Copy)]
pub struct ModelParams {
    pub mu_d: f64,
    pub p_d: f64,
    pub mu_r: f64,
    pub p_r: f64,
    pub q_r: f64,
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        for (name, mu) in [("mu_d", self.mu_d), ("mu_r", self.mu_r)] {
            ensure!(
                (0.0..=1.0).contains(&mu),
                "{} must be in [0, 1], got {}",
                name,
                mu
            );
        }
        for (name, p) in [("p_d", self.p_d), ("p_r", self.p_r), ("q_r", self.q_r)] {
            ensure!(p >= 1.0 && p.is_finite(), "{} must be >= 1, got {}", name, p);
        }
        Ok(())
    }
}

/// One qualifying variant: effect score in `[0, 1)` and, per sample,
/// the probability of carrying one or two non-reference copies.
#[derive(Debug, Clone)]
pub struct GeneVariant {
    pub effect_score: f64,
    /// `probs[i] = [P0, P1, P2]` for sample `i`, oriented so index
    /// counts non-reference copies.
    pub probs: Vec<[f64; 3]>,
}

/// Blend of max and p-power mean over per-variant contributions.
///
/// Both terms are bounded by the largest input, so the result stays in
/// `[0, 1)` whenever the inputs do.
fn combine(values: &[f64], mu: f64, p: f64) -> f64 {
    let max = values.iter().cloned().fold(0.0, f64::max);
    let mean = (values.iter().map(|v| v.powf(p)).sum::<f64>() / values.len() as f64).powf(1.0 / p);
    mu * max + (1.0 - mu) * mean
}

/// Per-sample dominant scores for one gene.
pub fn dominant_scores(variants: &[GeneVariant], params: &ModelParams) -> Result<Vec<f64>> {
    let n = check_variants(variants)?;
    let mut scores = Vec::with_capacity(n);
    for i in 0..n {
        let carrier: Vec<f64> = variants
            .iter()
            .map(|v| v.effect_score * (v.probs[i][1] + v.probs[i][2]))
            .collect();
        scores.push(combine(&carrier, params.mu_d, params.p_d));
    }
    Ok(scores)
}

/// Per-sample recessive scores for one gene.
///
/// Homozygote and compound-heterozygote routes are treated as
/// independent ways of hitting both copies:
/// `R = 1 - (1 - R_hom)(1 - C)`.
pub fn recessive_scores(variants: &[GeneVariant], params: &ModelParams) -> Result<Vec<f64>> {
    let n = check_variants(variants)?;
    let mut scores = Vec::with_capacity(n);
    for i in 0..n {
        let hom: Vec<f64> = variants
            .iter()
            .map(|v| v.effect_score * v.probs[i][2])
            .collect();
        let r_hom = combine(&hom, params.mu_r, params.p_r);

        // Compound het needs two distinct variants; take the two
        // strongest het contributions.
        let compound = if variants.len() >= 2 {
            let (mut h1, mut h2) = (0.0f64, 0.0f64);
            for v in variants {
                let h = v.effect_score * v.probs[i][1];
                if h > h1 {
                    h2 = h1;
                    h1 = h;
                } else if h > h2 {
                    h2 = h;
                }
            }
            (h1 * h2).powf(params.q_r / 2.0)
        } else {
            0.0
        };

        scores.push(1.0 - (1.0 - r_hom) * (1.0 - compound));
    }
    Ok(scores)
}

/// Validate the variant set and return the common sample count.
fn check_variants(variants: &[GeneVariant]) -> Result<usize> {
    let Some(first) = variants.first() else {
        bail!("gene has no qualifying variants");
    };
    let n = first.probs.len();
    for (k, v) in variants.iter().enumerate() {
        if v.probs.len() != n {
            bail!(
                "variant {} carries {} samples, expected {}",
                k,
                v.probs.len(),
                n
            );
        }
        if !(0.0..1.0).contains(&v.effect_score) {
            bail!(
                "variant {} effect score {} outside [0, 1)",
                k,
                v.effect_score
            );
        }
    }
    Ok(n)
}

/// Orient a genotype probability triple to count non-reference copies.
///
/// Sources report the triple over copies of their first allele; when
/// that allele is the reference, the triple reverses.
pub fn orient_probs(probs: [f64; 3], is_allele1_ref: bool) -> [f64; 3] {
    if is_allele1_ref {
        [probs[2], probs[1], probs[0]]
    } else {
        probs
    }
}
