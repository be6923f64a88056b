//! burden-rs: gene-level dominant/recessive burden analysis.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "burden",
    version,
    about = "Gene-level dominant/recessive burden scoring and association testing",
    long_about = "Collapses per-variant genotype probabilities into per-gene dominant and \n\
                  recessive effect scores, then tests each gene against a phenotype with \n\
                  covariate-adjusted likelihood-ratio tests."
)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: Compute per-sample gene scores from genotype probabilities
    GeneScores(commands::gene_scores::GeneScoresArgs),

    /// Stage 2: Run per-gene association tests against a phenotype
    Assoc(commands::assoc::AssocArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    tracing::info!("burden-rs v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::GeneScores(args) => commands::gene_scores::run(args),
        Commands::Assoc(args) => commands::assoc::run(args),
    }
}
