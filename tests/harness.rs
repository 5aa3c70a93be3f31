//! End-to-end harness scenarios against real and in-memory engines.

use kvbench::engines::memory_engine::MemoryEngine;
use kvbench::engines::{EngineKind, StorageEngine};
use kvbench::profile::{ResourceProfile, RunConfig};
use kvbench::workloads;
use kvbench::OpGen;

fn tiny_config() -> RunConfig {
    RunConfig {
        records: 2_000,
        batch_size: 200,
        reads: 500,
        updates: 200,
        deletes: 100,
        mixed_ops: 500,
        ..RunConfig::default()
    }
}

#[test]
fn scenario_100k_records_in_1000_batches() {
    let cfg = RunConfig {
        records: 100_000,
        batch_size: 1_000,
        ..RunConfig::default()
    };
    let mut engine = MemoryEngine::new();

    let load = workloads::sequential_load(&mut engine, &cfg).unwrap();
    assert_eq!(load.ops, 100_000);
    assert_eq!(engine.commit_count(), 100);

    let scan = workloads::sequential_scan(&mut engine, &cfg).unwrap();
    assert_eq!(scan.ops, 100_000);
}

#[test]
fn scenario_deletes_with_replacement_bound_population() {
    let cfg = RunConfig {
        records: 100_000,
        batch_size: 1_000,
        deletes: 5_000,
        ..RunConfig::default()
    };
    let mut engine = MemoryEngine::new();
    workloads::sequential_load(&mut engine, &cfg).unwrap();
    workloads::random_deletes(&mut engine, &cfg).unwrap();

    // Sampling with replacement: duplicates mean at most 5000 keys vanish.
    let remaining = engine.entry_count();
    assert!(remaining >= 95_000);
    assert!(remaining <= 100_000);
}

#[test]
fn untouched_keys_keep_their_original_values() {
    let cfg = tiny_config();
    let mut engine = MemoryEngine::new();
    workloads::sequential_load(&mut engine, &cfg).unwrap();
    workloads::random_updates(&mut engine, &cfg).unwrap();
    workloads::random_deletes(&mut engine, &cfg).unwrap();

    // Every surviving entry is either the original load value for its index
    // or the update shape; nothing else can appear.
    let gen = OpGen::new(cfg.seed);
    let mut originals = 0u64;
    let visited = engine
        .iterate(&mut |k, v| {
            let key = String::from_utf8(k.to_vec()).unwrap();
            let idx: u64 = key.strip_prefix("key_").unwrap().parse().unwrap();
            assert!(idx < cfg.records);
            if v.starts_with(b"value_") {
                assert_eq!(v, gen.value(idx).as_slice());
                originals += 1;
            } else {
                assert_eq!(v, gen.updated_value(idx).as_slice());
            }
        })
        .unwrap();
    assert!(visited >= cfg.records - cfg.deletes);
    // Most of the range was never updated or deleted.
    assert!(originals > 0);
}

#[test]
fn full_battery_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sled_db");
    let cfg = tiny_config();
    let profile = ResourceProfile::small();

    EngineKind::Sled.destroy(&path).unwrap();
    let mut engine = EngineKind::Sled.open(&path, &profile).unwrap();

    let load = workloads::sequential_load(engine.as_mut(), &cfg).unwrap();
    assert_eq!(load.ops, cfg.records);
    assert_eq!(load.extra.get("commits").unwrap(), "10");

    let reads = workloads::random_reads(engine.as_mut(), &cfg).unwrap();
    assert_eq!(reads.ops, cfg.reads);
    assert_eq!(reads.extra.get("hits").unwrap(), &cfg.reads.to_string());

    let scan = workloads::sequential_scan(engine.as_mut(), &cfg).unwrap();
    assert_eq!(scan.ops, cfg.records);

    let updates = workloads::random_updates(engine.as_mut(), &cfg).unwrap();
    assert_eq!(updates.ops, cfg.updates);

    let deletes = workloads::random_deletes(engine.as_mut(), &cfg).unwrap();
    assert_eq!(deletes.ops, cfg.deletes);

    let exists = workloads::exists_checks(engine.as_mut(), &cfg).unwrap();
    assert_eq!(exists.ops, cfg.reads);

    let mixed = workloads::mixed_workload(engine.as_mut(), &cfg).unwrap();
    assert_eq!(mixed.ops, cfg.mixed_ops);

    // Population after deletes and mixed churn stays inside the loaded range
    // plus nothing: all keys share the `key_` prefix and index < records.
    let final_scan = workloads::sequential_scan(engine.as_mut(), &cfg).unwrap();
    assert!(final_scan.ops <= cfg.records);
    assert!(final_scan.ops >= cfg.records - cfg.deletes - cfg.mixed_ops);

    engine.close().unwrap();
    EngineKind::Sled.destroy(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn full_battery_on_redb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.redb");
    let cfg = RunConfig {
        records: 500,
        batch_size: 100,
        reads: 100,
        updates: 50,
        deletes: 25,
        mixed_ops: 100,
        ..RunConfig::default()
    };
    let profile = ResourceProfile::small();

    let mut engine = EngineKind::Redb.open(&path, &profile).unwrap();
    workloads::sequential_load(engine.as_mut(), &cfg).unwrap();
    let scan = workloads::sequential_scan(engine.as_mut(), &cfg).unwrap();
    assert_eq!(scan.ops, cfg.records);
    workloads::random_updates(engine.as_mut(), &cfg).unwrap();
    workloads::random_deletes(engine.as_mut(), &cfg).unwrap();
    let mixed = workloads::mixed_workload(engine.as_mut(), &cfg).unwrap();
    assert_eq!(mixed.ops, cfg.mixed_ops);
    engine.close().unwrap();
}

#[test]
fn bulk_load_is_isolated_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bulk_db");
    let cfg = RunConfig {
        records: 1_000,
        ..tiny_config()
    };

    let result =
        workloads::bulk_load(EngineKind::Sled, &path, &ResourceProfile::small(), &cfg).unwrap();
    assert_eq!(result.ops, cfg.records);
    assert_eq!(result.workload, "bulk_load");
    // The throwaway engine's storage is gone before control returns.
    assert!(!path.exists());
}

#[test]
fn destroy_then_fresh_open_yields_empty_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reset_db");
    let cfg = tiny_config();
    let profile = ResourceProfile::small();

    let mut engine = EngineKind::Sled.open(&path, &profile).unwrap();
    workloads::sequential_load(engine.as_mut(), &cfg).unwrap();
    engine.close().unwrap();

    EngineKind::Sled.destroy(&path).unwrap();
    // Idempotent on the now-missing path.
    EngineKind::Sled.destroy(&path).unwrap();

    let mut engine = EngineKind::Sled.open(&path, &profile).unwrap();
    let scan = workloads::sequential_scan(engine.as_mut(), &cfg).unwrap();
    assert_eq!(scan.ops, 0);
    // Zero ops means throughput is reported as n/a, never a division.
    assert_eq!(scan.throughput, 0.0);
    engine.close().unwrap();
}
