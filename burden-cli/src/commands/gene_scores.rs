//! Stage 1: per-gene dominant/recessive score computation.
//!
//! burden gene-scores --genotype-spec sources.csv --variants-dir genes/ \
//!     --output-dir scores/ --task-index 0 --total-tasks 8
//!
//! Each gene in this task's shard is scored independently: a gene that
//! fails validation or probability extraction is logged and skipped,
//! the batch continues.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{error, info};

use burden_core::aggregate::{dominant_scores, orient_probs, recessive_scores, GeneVariant, ModelParams};
use burden_core::shard;
use burden_geno::scores::{write_scores, GeneScores, Precision};
use burden_geno::source_spec::{open_source, parse_genotyping_spec, GenotypingSourceSpec};
use burden_geno::variants::{list_gene_files, read_gene_variants, single_source_index};
use burden_geno::GenotypeSource;

#[derive(Args)]
pub struct GeneScoresArgs {
    /// Genotyping spec CSV (one row per genotype source)
    #[arg(long)]
    genotype_spec: PathBuf,

    /// Directory of per-gene variant files, <gene_index>.csv
    #[arg(long)]
    variants_dir: PathBuf,

    /// Output directory for per-gene score files
    #[arg(long)]
    output_dir: PathBuf,

    /// Optional variant-file column flagging allele 1 as the reference
    #[arg(long)]
    ref_allele_col: Option<String>,

    /// Dominant model max/power-mean blend, in [0, 1]
    #[arg(long, default_value = "0.5")]
    d_u: f64,

    /// Dominant model power-mean exponent, >= 1
    #[arg(long, default_value = "2.0")]
    d_p: f64,

    /// Recessive model max/power-mean blend, in [0, 1]
    #[arg(long, default_value = "0.5")]
    r_u: f64,

    /// Recessive model power-mean exponent, >= 1
    #[arg(long, default_value = "2.0")]
    r_p: f64,

    /// Compound-heterozygote sharpening exponent, >= 1
    #[arg(long, default_value = "2.0")]
    r_q: f64,

    /// Output precision: f32 or f64
    #[arg(long, default_value = "f64")]
    precision: String,

    /// Scratch directory for external format adapters
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// This task's index in a distributed run
    #[arg(long, default_value = "0")]
    task_index: usize,

    /// Total number of tasks in a distributed run
    #[arg(long, default_value = "1")]
    total_tasks: usize,
}

pub fn run(args: GeneScoresArgs) -> Result<()> {
    super::check_sharding(args.total_tasks, args.task_index)?;
    let precision: Precision = args.precision.parse()?;
    let params = ModelParams {
        mu_d: args.d_u,
        p_d: args.d_p,
        mu_r: args.r_u,
        p_r: args.r_p,
        q_r: args.r_q,
    };
    params.validate()?;

    let specs = parse_genotyping_spec(&args.genotype_spec)?;
    info!("Loaded {} genotyping sources", specs.len());

    let genes = list_gene_files(&args.variants_dir)?;
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

    // Sources are opened lazily and shared across the task's genes.
    let mut cache: HashMap<usize, Box<dyn GenotypeSource>> = HashMap::new();
    let mut n_ok = 0usize;
    let mut n_failed = 0usize;

    for (gene_index, path) in &genes[start..end] {
        let out_path = args.output_dir.join(format!("{gene_index}.csv"));
        match score_one_gene(
            path,
            &out_path,
            &specs,
            &mut cache,
            &params,
            precision,
            args.ref_allele_col.as_deref(),
            args.temp_dir.as_deref(),
        ) {
            Ok(n_samples) => {
                n_ok += 1;
                info!("Gene {}: wrote scores for {} samples", gene_index, n_samples);
            }
            Err(e) => {
                n_failed += 1;
                error!("Gene {} failed: {:#}", gene_index, e);
            }
        }
    }

    info!("Gene scoring done: {} succeeded, {} failed", n_ok, n_failed);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn score_one_gene(
    variant_path: &Path,
    out_path: &Path,
    specs: &[GenotypingSourceSpec],
    cache: &mut HashMap<usize, Box<dyn GenotypeSource>>,
    params: &ModelParams,
    precision: Precision,
    ref_allele_col: Option<&str>,
    temp_dir: Option<&Path>,
) -> Result<usize> {
    let records = read_gene_variants(variant_path, ref_allele_col)?;
    let source_index = single_source_index(&records)?;
    if source_index >= specs.len() {
        bail!(
            "references genotyping source {} but the spec defines {}",
            source_index,
            specs.len()
        );
    }

    let source = match cache.entry(source_index) {
        Entry::Occupied(e) => e.into_mut(),
        Entry::Vacant(v) => v.insert(open_source(&specs[source_index], temp_dir)?),
    };

    let mut variants = Vec::with_capacity(records.len());
    for r in &records {
        if r.variant_index >= source.n_variants() as u64 {
            bail!(
                "variant index {} out of range for source '{}' ({} variants)",
                r.variant_index,
                specs[source_index].name,
                source.n_variants()
            );
        }
        let probs: Vec<[f64; 3]> = source
            .variant_probabilities(r.variant_index)?
            .into_iter()
            .map(|p| orient_probs(p, r.is_allele1_ref))
            .collect();
        variants.push(GeneVariant {
            effect_score: r.effect_score,
            probs,
        });
    }

    let dominant = dominant_scores(&variants, params)?;
    let recessive = recessive_scores(&variants, params)?;
    let scores = GeneScores {
        sample_ids: source.sample_ids().to_vec(),
        dominant,
        recessive,
    };
    write_scores(out_path, &scores, precision)?;
    Ok(scores.sample_ids.len())
}
