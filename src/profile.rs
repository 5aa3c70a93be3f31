//! Run configuration: the reference resource profile and the workload sizes.
//!
//! The profile is the declarative budget a run emulates. Each engine adapter
//! maps it onto its own tuning knobs at open time; knobs an engine lacks are
//! ignored and documented on the adapter. The workload sizes are injected
//! rather than compiled in, so a CI-small run is just a different config.

use serde::Serialize;

/// Whether a commit must be flushed to stable storage before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Durability {
    /// Engine-level flush guaranteed before the commit call returns.
    Sync,
    /// The engine may buffer; data loss window on crash is acceptable.
    Buffered,
}

/// Declarative resource budget for the engine under test. Immutable once
/// constructed; consumed once by engine configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceProfile {
    pub cache_bytes: u64,
    pub write_buffer_bytes: u64,
    pub block_bytes: u64,
    /// When false, the adapter must also disable auxiliary indexing
    /// structures (bloom filters and the like); the reference engine has no
    /// equivalent and leaving them on would bias the comparison.
    pub compression: bool,
    pub durability: Durability,
    pub max_open_files: u64,
    pub num_levels: u32,
    pub target_file_bytes: u64,
}

impl ResourceProfile {
    /// The constrained reference profile: 2 MiB cache, 2 MiB write buffer,
    /// 4 KiB blocks, no compression, fsync on every commit.
    pub fn small() -> Self {
        Self {
            cache_bytes: 2 * 1024 * 1024,
            write_buffer_bytes: 2 * 1024 * 1024,
            block_bytes: 4 * 1024,
            compression: false,
            durability: Durability::Sync,
            max_open_files: 100,
            num_levels: 4,
            target_file_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Workload sizes and randomness seed for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// N: number of records in the main key range [0, N).
    pub records: u64,
    /// Commit granularity for the sequential load.
    pub batch_size: u64,
    /// M: point lookups for random-read and existence-probe workloads.
    pub reads: u64,
    /// K: random updates (single batch, single commit).
    pub updates: u64,
    /// K: random deletes (single batch, single commit).
    pub deletes: u64,
    /// Total ops for the mixed workload.
    pub mixed_ops: u64,
    /// Mixed-workload weights out of 100; delete weight is the remainder.
    pub read_weight: u8,
    pub write_weight: u8,
    /// Mixed-workload batch is flushed once more than this many mutations
    /// are pending.
    pub flush_threshold: usize,
    /// Durability applied to every committing workload.
    pub durability: Durability,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            records: 1_000_000,
            batch_size: 1_000,
            reads: 50_000,
            updates: 10_000,
            deletes: 5_000,
            mixed_ops: 20_000,
            read_weight: 70,
            write_weight: 20,
            flush_threshold: 100,
            durability: Durability::Sync,
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Sanity-check the weights and batch size.
    pub fn validate(&self) -> crate::BenchResult<()> {
        if self.records == 0 {
            return Err(crate::BenchError::Config("records must be >= 1".into()));
        }
        if self.batch_size == 0 {
            return Err(crate::BenchError::Config("batch-size must be >= 1".into()));
        }
        if self.read_weight as u16 + self.write_weight as u16 > 100 {
            return Err(crate::BenchError::Config(
                "read-weight + write-weight must be <= 100".into(),
            ));
        }
        Ok(())
    }

    /// A fast profile for smoke runs and CI.
    pub fn ci_small() -> Self {
        Self {
            records: 10_000,
            batch_size: 100,
            reads: 2_000,
            updates: 500,
            deletes: 250,
            mixed_ops: 1_000,
            ..Self::default()
        }
    }
}
