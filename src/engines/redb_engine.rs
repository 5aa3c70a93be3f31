//! redb adapter.
//!
//! Profile mapping: `cache_bytes` -> `set_cache_size`. redb never
//! compresses and carries no bloom filters, which already matches the "no
//! compression / no extra indexing" minimal profile; block size, level
//! count and open-file limits have no redb equivalent and are ignored.
//! Durability maps per transaction: `Sync` -> `Durability::Immediate`,
//! `Buffered` -> `Durability::Eventual`.

use super::{EngineStat, Mutation, OperationBatch, StorageEngine};
use crate::profile::{Durability, ResourceProfile};
use crate::{BenchError, BenchResult};
use redb::{ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("bench");

pub struct RedbEngine {
    db: redb::Database,
    path: PathBuf,
}

impl RedbEngine {
    pub fn open(path: &Path, profile: &ResourceProfile) -> BenchResult<Self> {
        let db = redb::Builder::new()
            .set_cache_size(profile.cache_bytes as usize)
            .create(path)
            .map_err(|e| BenchError::Engine(format!("redb open: {}", e)))?;

        // Create the table up front so reads and scans on a fresh engine
        // see an empty table instead of a missing one.
        let txn = db
            .begin_write()
            .map_err(|e| BenchError::Engine(format!("redb init: {}", e)))?;
        {
            txn.open_table(TABLE)
                .map_err(|e| BenchError::Engine(format!("redb init table: {}", e)))?;
        }
        txn.commit()
            .map_err(|e| BenchError::Engine(format!("redb init commit: {}", e)))?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }
}

impl StorageEngine for RedbEngine {
    fn name(&self) -> &str {
        "redb"
    }

    fn get(&mut self, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| BenchError::Engine(format!("redb read txn: {}", e)))?;
        let table = txn
            .open_table(TABLE)
            .map_err(|e| BenchError::Engine(format!("redb open table: {}", e)))?;
        let found = table
            .get(key)
            .map_err(|e| BenchError::Engine(format!("redb get: {}", e)))?;
        Ok(found.map(|guard| guard.value().to_vec()))
    }

    fn commit_batch(
        &mut self,
        batch: &OperationBatch,
        durability: Durability,
    ) -> BenchResult<()> {
        let mut txn = self
            .db
            .begin_write()
            .map_err(|e| BenchError::Engine(format!("redb write txn: {}", e)))?;
        txn.set_durability(match durability {
            Durability::Sync => redb::Durability::Immediate,
            Durability::Buffered => redb::Durability::Eventual,
        });
        {
            let mut table = txn
                .open_table(TABLE)
                .map_err(|e| BenchError::Engine(format!("redb open table: {}", e)))?;
            for mutation in batch.iter() {
                match mutation {
                    Mutation::Put { key, value } => {
                        table
                            .insert(key.as_slice(), value.as_slice())
                            .map_err(|e| BenchError::Engine(format!("redb put: {}", e)))?;
                    }
                    Mutation::Delete { key } => {
                        // Absent keys remove nothing; that is a normal outcome.
                        table
                            .remove(key.as_slice())
                            .map_err(|e| BenchError::Engine(format!("redb delete: {}", e)))?;
                    }
                }
            }
        }
        txn.commit()
            .map_err(|e| BenchError::Engine(format!("redb commit: {}", e)))?;
        Ok(())
    }

    fn iterate(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> BenchResult<u64> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| BenchError::Engine(format!("redb read txn: {}", e)))?;
        let table = txn
            .open_table(TABLE)
            .map_err(|e| BenchError::Engine(format!("redb open table: {}", e)))?;
        let mut count = 0u64;
        for entry in table
            .iter()
            .map_err(|e| BenchError::Engine(format!("redb scan: {}", e)))?
        {
            let (k, v) = entry.map_err(|e| BenchError::Engine(format!("redb scan: {}", e)))?;
            visit(k.value(), v.value());
            count += 1;
        }
        Ok(count)
    }

    fn stat(&self, stat: EngineStat) -> Option<u64> {
        match stat {
            EngineStat::DiskBytes => std::fs::metadata(&self.path).map(|m| m.len()).ok(),
            // redb exposes no cache or write-buffer occupancy.
            _ => None,
        }
    }

    fn close(self: Box<Self>) -> BenchResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::EngineKind;

    #[test]
    fn put_get_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.redb");
        let mut engine = RedbEngine::open(&path, &ResourceProfile::small()).unwrap();

        let mut batch = OperationBatch::default();
        batch.push_put(b"k".to_vec(), b"v".to_vec());
        engine.commit_batch(&batch, Durability::Sync).unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(engine.get(b"missing").unwrap(), None);

        batch.clear();
        batch.push_delete(b"k".to_vec());
        batch.push_delete(b"missing".to_vec());
        engine.commit_batch(&batch, Durability::Buffered).unwrap();
        assert_eq!(engine.get(b"k").unwrap(), None);
    }

    #[test]
    fn fresh_engine_scans_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.redb");
        let mut engine = RedbEngine::open(&path, &ResourceProfile::small()).unwrap();
        assert_eq!(engine.iterate(&mut |_, _| {}).unwrap(), 0);
        assert!(engine.stat(EngineStat::DiskBytes).unwrap_or(0) > 0);
        assert_eq!(engine.stat(EngineStat::CacheBytes), None);
    }

    #[test]
    fn destroy_removes_the_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.redb");
        let engine = RedbEngine::open(&path, &ResourceProfile::small()).unwrap();
        Box::new(engine).close().unwrap();
        assert!(path.exists());
        EngineKind::Redb.destroy(&path).unwrap();
        assert!(!path.exists());
        EngineKind::Redb.destroy(&path).unwrap();
    }
}
