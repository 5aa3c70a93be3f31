//! The fixed workload battery.
//!
//! Each function takes an open `&mut dyn StorageEngine` plus the run config,
//! emits a known-in-advance number of logical operations, times only the
//! engine calls, and returns one `BenchmarkResult`. The workloads run in a
//! fixed order and later ones rely on state committed by earlier ones: the
//! random read/update/delete workloads assume `sequential_load` has
//! populated the key range [0, records).
//!
//! Commit status is checked on every batch: a failed commit aborts the
//! workload with a diagnostic instead of proceeding on known-bad state.

use crate::engines::{EngineKind, OperationBatch, StorageEngine};
use crate::profile::{ResourceProfile, RunConfig};
use crate::{BenchResult, BenchmarkResult, LatencyRecorder, OpGen};
use std::path::Path;

// Per-workload seed salts keep the random streams independent while the
// whole run stays reproducible from one configured seed.
const SALT_READS: u64 = 0x01;
const SALT_UPDATES: u64 = 0x02;
const SALT_DELETES: u64 = 0x03;
const SALT_EXISTS: u64 = 0x04;
const SALT_MIXED: u64 = 0x05;

/// N puts over keys [0, N) in order, committed in batches of `batch_size`.
/// A final short batch is still committed, so exactly ceil(N/B) commits run.
pub fn sequential_load(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let gen = OpGen::new(cfg.seed);
    let mut rec = LatencyRecorder::new();
    let mut batch = OperationBatch::default();
    let mut commits = 0u64;

    let mut i = 0u64;
    while i < cfg.records {
        let end = (i + cfg.batch_size).min(cfg.records);
        for idx in i..end {
            batch.push_put(gen.key(idx), gen.value(idx));
        }
        let t = rec.start();
        engine.commit_batch(&batch, cfg.durability)?;
        rec.record_batch(t.elapsed(), end - i);
        batch.clear();
        commits += 1;
        i = end;
    }

    Ok(
        BenchmarkResult::from_recorder(engine.name(), "sequential_load", &rec)
            .with_extra("commits", commits),
    )
}

/// M point lookups with indices drawn uniformly from [0, N). A miss is a
/// normal outcome: the key may have been deleted or never written.
pub fn random_reads(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut gen = OpGen::new(cfg.seed ^ SALT_READS);
    let mut rec = LatencyRecorder::new();
    let mut hits = 0u64;

    for _ in 0..cfg.reads {
        let idx = gen.index(cfg.records);
        let key = gen.key(idx);
        let t = rec.start();
        let found = engine.get(&key)?;
        rec.record(t);
        if found.is_some() {
            hits += 1;
        }
    }

    Ok(BenchmarkResult::from_recorder(engine.name(), "random_reads", &rec)
        .with_extra("hits", hits))
}

/// Full forward scan. The op count is the number of entries actually
/// visited, not the nominal record count.
pub fn sequential_scan(
    engine: &mut dyn StorageEngine,
    _cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut rec = LatencyRecorder::new();

    let t = rec.start();
    let visited = engine.iterate(&mut |_k, _v| {})?;
    rec.record_batch(t.elapsed(), visited);

    Ok(BenchmarkResult::from_recorder(
        engine.name(),
        "sequential_scan",
        &rec,
    ))
}

/// K puts of fresh values at random existing-range keys, accumulated into
/// one batch and committed once.
pub fn random_updates(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut gen = OpGen::new(cfg.seed ^ SALT_UPDATES);
    let mut rec = LatencyRecorder::new();
    let mut batch = OperationBatch::default();

    for _ in 0..cfg.updates {
        let idx = gen.index(cfg.records);
        batch.push_put(gen.key(idx), gen.updated_value(idx));
    }
    let t = rec.start();
    engine.commit_batch(&batch, cfg.durability)?;
    rec.record_batch(t.elapsed(), cfg.updates);

    Ok(BenchmarkResult::from_recorder(
        engine.name(),
        "random_updates",
        &rec,
    ))
}

/// K deletes at random existing-range keys, one batch, one commit.
/// Duplicate indices (sampling with replacement) and deletes of absent keys
/// are expected, not anomalies.
pub fn random_deletes(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut gen = OpGen::new(cfg.seed ^ SALT_DELETES);
    let mut rec = LatencyRecorder::new();
    let mut batch = OperationBatch::default();

    for _ in 0..cfg.deletes {
        let idx = gen.index(cfg.records);
        batch.push_delete(gen.key(idx));
    }
    let t = rec.start();
    engine.commit_batch(&batch, cfg.durability)?;
    rec.record_batch(t.elapsed(), cfg.deletes);

    Ok(BenchmarkResult::from_recorder(
        engine.name(),
        "random_deletes",
        &rec,
    ))
}

/// M presence probes, identical in shape to random reads. Engines whose
/// only primitive is a full-value fetch pay for the value here; the harness
/// reports that asymmetry rather than trying to equalize it.
pub fn exists_checks(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut gen = OpGen::new(cfg.seed ^ SALT_EXISTS);
    let mut rec = LatencyRecorder::new();
    let mut present = 0u64;

    for _ in 0..cfg.reads {
        let idx = gen.index(cfg.records);
        let key = gen.key(idx);
        let t = rec.start();
        let found = engine.get(&key)?;
        rec.record(t);
        if found.is_some() {
            present += 1;
        }
    }

    Ok(
        BenchmarkResult::from_recorder(engine.name(), "exists_checks", &rec)
            .with_extra("present", present),
    )
}

/// Fixed op count with a per-op three-way roll (default 70/20/10
/// read/write/delete). Reads execute immediately against committed state;
/// writes and deletes accumulate into a shared batch flushed once more than
/// `flush_threshold` mutations are pending, plus a final flush.
pub fn mixed_workload(
    engine: &mut dyn StorageEngine,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    let mut gen = OpGen::new(cfg.seed ^ SALT_MIXED);
    let mut rec = LatencyRecorder::new();
    let mut batch = OperationBatch::default();
    let (mut reads, mut writes, mut deletes) = (0u64, 0u64, 0u64);

    for _ in 0..cfg.mixed_ops {
        let idx = gen.index(cfg.records);
        let roll = gen.roll();
        let key = gen.key(idx);

        if roll < cfg.read_weight {
            let t = rec.start();
            engine.get(&key)?;
            rec.record(t);
            reads += 1;
        } else if roll < cfg.read_weight + cfg.write_weight {
            batch.push_put(key, gen.mixed_value(idx));
            writes += 1;
        } else {
            batch.push_delete(key);
            deletes += 1;
        }

        if batch.len() > cfg.flush_threshold {
            let n = batch.len() as u64;
            let t = rec.start();
            engine.commit_batch(&batch, cfg.durability)?;
            rec.record_batch(t.elapsed(), n);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        let n = batch.len() as u64;
        let t = rec.start();
        engine.commit_batch(&batch, cfg.durability)?;
        rec.record_batch(t.elapsed(), n);
    }

    Ok(
        BenchmarkResult::from_recorder(engine.name(), "mixed_workload", &rec)
            .with_extra("reads", reads)
            .with_extra("writes", writes)
            .with_extra("deletes", deletes),
    )
}

/// N puts under the disjoint `bulk_key_` prefix, all in one batch with one
/// commit, against a throwaway engine instance at its own path. The
/// instance is opened, written, closed and destroyed entirely within this
/// function; it is never live alongside the main engine's path.
pub fn bulk_load(
    kind: EngineKind,
    path: &Path,
    profile: &ResourceProfile,
    cfg: &RunConfig,
) -> BenchResult<BenchmarkResult> {
    kind.destroy(path)?;
    let mut engine = kind.open(path, profile)?;

    let gen = OpGen::new(cfg.seed);
    let mut rec = LatencyRecorder::new();
    let mut batch = OperationBatch::default();
    for i in 0..cfg.records {
        batch.push_put(gen.bulk_key(i), gen.bulk_value(i));
    }
    let t = rec.start();
    engine.commit_batch(&batch, cfg.durability)?;
    rec.record_batch(t.elapsed(), cfg.records);

    let result = BenchmarkResult::from_recorder(kind.label(), "bulk_load", &rec);

    engine.close()?;
    kind.destroy(path)?;
    Ok(result)
}
