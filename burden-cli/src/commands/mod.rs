//! CLI subcommands.

pub mod assoc;
pub mod gene_scores;

use anyhow::{bail, Result};

/// Validate the distributed-run arguments shared by both stages.
/// Misconfigured sharding must abort before any work is claimed.
pub fn check_sharding(total_tasks: usize, task_index: usize) -> Result<()> {
    if total_tasks == 0 {
        bail!("--total-tasks must be at least 1");
    }
    if task_index >= total_tasks {
        bail!(
            "--task-index {} out of range for --total-tasks {}",
            task_index,
            total_tasks
        );
    }
    Ok(())
}
