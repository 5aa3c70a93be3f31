//! In-memory engine backed by a BTreeMap.
//!
//! Exists for tests and smoke runs: commits are counted and observable, and
//! the resident data size is reported through `stat`, so harness invariants
//! (commit cadence, key population) can be asserted without touching disk.

use super::{EngineStat, Mutation, OperationBatch, StorageEngine};
use crate::profile::Durability;
use crate::BenchResult;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryEngine {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
    commits: u64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batch commits applied so far.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn entry_count(&self) -> u64 {
        self.map.len() as u64
    }
}

impl StorageEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn commit_batch(
        &mut self,
        batch: &OperationBatch,
        _durability: Durability,
    ) -> BenchResult<()> {
        for mutation in batch.iter() {
            match mutation {
                Mutation::Put { key, value } => {
                    self.map.insert(key.clone(), value.clone());
                }
                Mutation::Delete { key } => {
                    // Deleting an absent key is a no-op.
                    self.map.remove(key);
                }
            }
        }
        self.commits += 1;
        Ok(())
    }

    fn iterate(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> BenchResult<u64> {
        let mut count = 0u64;
        for (k, v) in &self.map {
            visit(k, v);
            count += 1;
        }
        Ok(count)
    }

    fn stat(&self, stat: EngineStat) -> Option<u64> {
        match stat {
            EngineStat::MemtableBytes => Some(
                self.map
                    .iter()
                    .map(|(k, v)| (k.len() + v.len()) as u64)
                    .sum(),
            ),
            _ => None,
        }
    }

    fn close(self: Box<Self>) -> BenchResult<()> {
        Ok(())
    }
}
