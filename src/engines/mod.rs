//! Storage engine capability and concrete adapters.
//!
//! The harness consumes engines through a narrow contract: open with a
//! resource profile, point get, atomically committed mutation batches with a
//! per-commit durability decision, ordered forward iteration, optional
//! internal statistics, close, destroy. Anything an engine does beyond that
//! is invisible to the measurement.

pub mod memory_engine;
pub mod redb_engine;
pub mod sled_engine;

use crate::profile::{Durability, ResourceProfile};
use crate::{BenchError, BenchResult};
use std::path::Path;
use std::str::FromStr;

// ────────────────────────────────────────────────────────────────────────────────
// Mutation batch
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Mutation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered pending mutations, committed atomically with one durability
/// decision. Stack-local to each workload; cleared after every commit.
#[derive(Debug, Clone, Default)]
pub struct OperationBatch {
    ops: Vec<Mutation>,
}

impl OperationBatch {
    pub fn push_put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(Mutation::Put { key, value });
    }

    pub fn push_delete(&mut self, key: Vec<u8>) {
        self.ops.push(Mutation::Delete { key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.ops.iter()
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Engine contract
// ────────────────────────────────────────────────────────────────────────────────

/// One engine-reported internal figure; engines return `None` for figures
/// they do not expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStat {
    CacheBytes,
    MemtableBytes,
    TableReaderBytes,
    DiskBytes,
}

/// An open storage engine instance bound to one on-disk location.
/// Exclusively owned by the run loop; at most one live handle per path.
pub trait StorageEngine {
    fn name(&self) -> &str;

    /// Point lookup. A miss is a normal outcome, not an error.
    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>>;

    /// Commit the batch atomically. With `Durability::Sync` the engine-level
    /// flush completes before this returns; every engine under comparison
    /// pays the same durability cost.
    fn commit_batch(&mut self, batch: &OperationBatch, durability: Durability)
        -> BenchResult<()>;

    /// Forward in-order iteration over all entries, restartable per call.
    /// Returns the number of entries visited.
    fn iterate(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> BenchResult<u64>;

    /// Internal statistics introspection; `None` means unsupported.
    fn stat(&self, stat: EngineStat) -> Option<u64>;

    fn close(self: Box<Self>) -> BenchResult<()>;
}

// ────────────────────────────────────────────────────────────────────────────────
// Engine selection
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Sled,
    Redb,
    Memory,
}

impl EngineKind {
    pub fn label(self) -> &'static str {
        match self {
            EngineKind::Sled => "sled",
            EngineKind::Redb => "redb",
            EngineKind::Memory => "memory",
        }
    }

    /// Open an engine at `path`, mapping the profile onto its knobs.
    /// Open failure is fatal to the harness; there is no retry.
    pub fn open(
        self,
        path: &Path,
        profile: &ResourceProfile,
    ) -> BenchResult<Box<dyn StorageEngine>> {
        match self {
            EngineKind::Sled => Ok(Box::new(sled_engine::SledEngine::open(path, profile)?)),
            EngineKind::Redb => Ok(Box::new(redb_engine::RedbEngine::open(path, profile)?)),
            EngineKind::Memory => Ok(Box::new(memory_engine::MemoryEngine::new())),
        }
    }

    /// Remove all on-disk state at `path`. Idempotent: a missing path is a
    /// no-op. sled stores a directory, redb a single file; both are covered.
    pub fn destroy(self, path: &Path) -> BenchResult<()> {
        match std::fs::metadata(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
            Ok(meta) => {
                if meta.is_dir() {
                    std::fs::remove_dir_all(path)?;
                } else {
                    std::fs::remove_file(path)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for EngineKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sled" => Ok(EngineKind::Sled),
            "redb" => Ok(EngineKind::Redb),
            "memory" => Ok(EngineKind::Memory),
            other => Err(BenchError::Config(format!(
                "unknown engine '{}' (expected sled, redb or memory)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_accumulates_and_clears() {
        let mut batch = OperationBatch::default();
        assert!(batch.is_empty());
        batch.push_put(b"k1".to_vec(), b"v1".to_vec());
        batch.push_delete(b"k2".to_vec());
        assert_eq!(batch.len(), 2);

        let kinds: Vec<bool> = batch
            .iter()
            .map(|m| matches!(m, Mutation::Put { .. }))
            .collect();
        assert_eq!(kinds, vec![true, false]);

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn destroy_missing_path_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_created");
        assert!(EngineKind::Sled.destroy(&path).is_ok());
        assert!(EngineKind::Redb.destroy(&path).is_ok());
        // Twice in a row is still fine.
        assert!(EngineKind::Sled.destroy(&path).is_ok());
    }

    #[test]
    fn engine_kind_parses_case_insensitively() {
        assert_eq!("sled".parse::<EngineKind>().unwrap(), EngineKind::Sled);
        assert_eq!("REDB".parse::<EngineKind>().unwrap(), EngineKind::Redb);
        assert_eq!("Memory".parse::<EngineKind>().unwrap(), EngineKind::Memory);
        assert!("rocksdb".parse::<EngineKind>().is_err());
    }
}
