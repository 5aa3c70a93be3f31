//! sled adapter.
//!
//! Profile mapping: `cache_bytes` -> `cache_capacity`, `compression` ->
//! `use_compression`. sled has no block-size, level-count, file-size or
//! open-file knobs; those profile fields are ignored. Durability: sled's
//! `apply_batch` is atomic but buffered, so a `Sync` commit is
//! `apply_batch` followed by an explicit `flush`, and the background
//! flusher is disabled under a `Sync` profile so the flush cost lands on
//! the commit being measured.

use super::{EngineStat, Mutation, OperationBatch, StorageEngine};
use crate::profile::{Durability, ResourceProfile};
use crate::{BenchError, BenchResult};
use std::path::Path;

pub struct SledEngine {
    db: sled::Db,
}

impl SledEngine {
    pub fn open(path: &Path, profile: &ResourceProfile) -> BenchResult<Self> {
        let flush_every_ms = match profile.durability {
            Durability::Sync => None,
            Durability::Buffered => Some(500),
        };
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(profile.cache_bytes)
            .use_compression(profile.compression)
            .flush_every_ms(flush_every_ms)
            .open()
            .map_err(|e| BenchError::Engine(format!("sled open: {}", e)))?;
        Ok(Self { db })
    }
}

impl StorageEngine for SledEngine {
    fn name(&self) -> &str {
        "sled"
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        let found = self
            .db
            .get(key)
            .map_err(|e| BenchError::Engine(format!("sled get: {}", e)))?;
        Ok(found.map(|ivec| ivec.to_vec()))
    }

    fn commit_batch(
        &mut self,
        batch: &OperationBatch,
        durability: Durability,
    ) -> BenchResult<()> {
        let mut sled_batch = sled::Batch::default();
        for mutation in batch.iter() {
            match mutation {
                Mutation::Put { key, value } => {
                    sled_batch.insert(key.as_slice(), value.as_slice())
                }
                Mutation::Delete { key } => sled_batch.remove(key.as_slice()),
            }
        }
        self.db
            .apply_batch(sled_batch)
            .map_err(|e| BenchError::Engine(format!("sled commit: {}", e)))?;
        if durability == Durability::Sync {
            self.db
                .flush()
                .map_err(|e| BenchError::Engine(format!("sled flush: {}", e)))?;
        }
        Ok(())
    }

    fn iterate(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> BenchResult<u64> {
        let mut count = 0u64;
        for entry in self.db.iter() {
            let (k, v) = entry.map_err(|e| BenchError::Engine(format!("sled scan: {}", e)))?;
            visit(&k, &v);
            count += 1;
        }
        Ok(count)
    }

    fn stat(&self, stat: EngineStat) -> Option<u64> {
        match stat {
            EngineStat::DiskBytes => self.db.size_on_disk().ok(),
            // sled does not expose cache or memtable occupancy.
            _ => None,
        }
    }

    fn close(self: Box<Self>) -> BenchResult<()> {
        self.db
            .flush()
            .map_err(|e| BenchError::Engine(format!("sled close: {}", e)))?;
        Ok(())
    }
}
