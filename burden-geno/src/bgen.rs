//! BGEN source (placeholder).
//!
//! BGEN v1.2 decoding is delegated to an external format adapter that
//! converts into a PLINK fileset under the stage's temp directory.
//! Direct decoding is out of scope here.

use anyhow::{bail, Result};

use crate::traits::{GenotypeProbs, GenotypeSource};

/// Source for BGEN files (stub - requires an external format adapter).
pub struct BgenSource {
    _path: std::path::PathBuf,
}

impl BgenSource {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        bail!(
            "BGEN source not supported directly: convert {} to PLINK with an \
             external adapter (see --temp-dir) and reference the converted fileset",
            path.as_ref().display()
        )
    }
}

impl GenotypeSource for BgenSource {
    fn n_variants(&self) -> usize {
        0
    }
    fn n_samples(&self) -> usize {
        0
    }
    fn sample_ids(&self) -> &[String] {
        &[]
    }
    fn variant_probabilities(&self, _index: u64) -> Result<Vec<GenotypeProbs>> {
        bail!("BGEN source not supported directly")
    }
}
