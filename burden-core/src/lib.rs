//! burden-core: Statistical algorithms for burden-rs
//!
//! Implements the run-level and per-gene machinery: deterministic work
//! sharding, covariate sanitization (rank repair and quasi-complete
//! separation repair), dominant/recessive score aggregation, and the
//! gene association dispatcher with its logistic/linear likelihood-ratio
//! engine.

pub mod aggregate;
pub mod assoc;
pub mod regress;
pub mod sanitize;
pub mod shard;

pub use shard::shard;
