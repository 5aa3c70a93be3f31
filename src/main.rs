//! kvbench runner.
//!
//! Usage:
//!   kvbench                          # sled, full reference workload sizes
//!   kvbench --engine redb --smoke    # CI-sized run against redb
//!   kvbench --buffered               # relax per-commit durability
//!   kvbench --export results/        # CSV + JSON export

use clap::Parser;
use colored::Colorize;
use kvbench::engines::{EngineKind, EngineStat, StorageEngine};
use kvbench::probe::{platform_probe, MemoryTracker};
use kvbench::profile::{Durability, ResourceProfile, RunConfig};
use kvbench::{
    report, workloads, BenchError, BenchResult, BenchSuite, BenchmarkResult, EngineInternalStats,
    SystemInfo,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "kvbench", about = "Key-value engine benchmark harness")]
struct Cli {
    /// Engine under test: sled, redb or memory.
    #[arg(long, default_value = "sled")]
    engine: String,

    /// Database path for the main run; the bulk-load run uses a sibling
    /// path with a `_bulk` suffix.
    #[arg(long, default_value = "benchmark_db")]
    path: PathBuf,

    /// N: records loaded by sequential load (key range [0, N)).
    #[arg(long, default_value_t = 1_000_000)]
    records: u64,

    /// Commit batch size for sequential load.
    #[arg(long, default_value_t = 1_000)]
    batch_size: u64,

    /// Point lookups for the random-read and existence-probe workloads.
    #[arg(long, default_value_t = 50_000)]
    reads: u64,

    /// Random updates (one batch, one commit).
    #[arg(long, default_value_t = 10_000)]
    updates: u64,

    /// Random deletes (one batch, one commit).
    #[arg(long, default_value_t = 5_000)]
    deletes: u64,

    /// Total ops for the mixed 70/20/10 workload.
    #[arg(long, default_value_t = 20_000)]
    mixed_ops: u64,

    /// Seed for the randomized access patterns.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Buffered commits instead of per-commit sync durability.
    #[arg(long)]
    buffered: bool,

    /// Run the CI-small workload sizes, ignoring the individual count flags.
    #[arg(long)]
    smoke: bool,

    /// Export directory for CSV + JSON results.
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "FATAL:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> BenchResult<()> {
    let cli = Cli::parse();
    let kind: EngineKind = cli.engine.parse()?;

    let durability = if cli.buffered {
        Durability::Buffered
    } else {
        Durability::Sync
    };
    let cfg = if cli.smoke {
        RunConfig {
            durability,
            seed: cli.seed,
            ..RunConfig::ci_small()
        }
    } else {
        RunConfig {
            records: cli.records,
            batch_size: cli.batch_size,
            reads: cli.reads,
            updates: cli.updates,
            deletes: cli.deletes,
            mixed_ops: cli.mixed_ops,
            durability,
            seed: cli.seed,
            ..RunConfig::default()
        }
    };
    cfg.validate()?;

    let mut profile = ResourceProfile::small();
    profile.durability = durability;

    report::print_banner(kind.label(), cfg.records);
    report::print_profile(&profile);

    // Every run starts from an empty engine.
    kind.destroy(&cli.path)?;

    let mut tracker = MemoryTracker::new(platform_probe());

    println!("\n{}", "Initializing database...".yellow());
    let mut engine = kind.open(&cli.path, &profile)?;
    let after_open = tracker.checkpoint();
    println!(
        "  Memory after opening DB: {}",
        report::format_kb(after_open.saturating_sub(tracker.initial_kb()))
    );

    let mut results: Vec<BenchmarkResult> = Vec::new();
    let main_start = Instant::now();

    let battery: [(
        &str,
        fn(&mut dyn StorageEngine, &RunConfig) -> BenchResult<BenchmarkResult>,
    ); 7] = [
        ("BENCHMARK 1: Sequential Load", workloads::sequential_load),
        ("BENCHMARK 2: Random Reads", workloads::random_reads),
        ("BENCHMARK 3: Sequential Scan", workloads::sequential_scan),
        ("BENCHMARK 4: Random Updates", workloads::random_updates),
        ("BENCHMARK 5: Random Deletes", workloads::random_deletes),
        ("BENCHMARK 6: Exists Checks", workloads::exists_checks),
        ("BENCHMARK 7: Mixed Workload", workloads::mixed_workload),
    ];

    for (title, workload) in battery {
        report::print_section(title);
        let result = workload(engine.as_mut(), &cfg)?;
        report::print_result(&result);
        results.push(result);
        tracker.checkpoint();
    }

    let main_secs = main_start.elapsed().as_secs_f64();

    let internal = EngineInternalStats {
        cache_bytes: engine.stat(EngineStat::CacheBytes),
        memtable_bytes: engine.stat(EngineStat::MemtableBytes),
        table_reader_bytes: engine.stat(EngineStat::TableReaderBytes),
        disk_bytes: engine.stat(EngineStat::DiskBytes),
    };

    engine.close()?;
    tracker.checkpoint();

    // Bulk load runs against its own disposable engine instance; only the
    // committed workload time counts toward the total.
    report::print_section("BENCHMARK 8: Bulk Load (Single Transaction)");
    let bulk_path = bulk_path_for(&cli.path)?;
    let bulk = workloads::bulk_load(kind, &bulk_path, &profile, &cfg)?;
    report::print_result(&bulk);
    let total_secs = main_secs + bulk.total_secs;
    results.push(bulk);
    tracker.checkpoint();

    let suite = BenchSuite {
        system_info: SystemInfo::collect(),
        engine: kind.label().to_string(),
        results,
        memory: tracker.summary(),
        internal,
        total_secs,
    };

    report::print_suite(&suite);

    if let Some(dir) = &cli.export {
        std::fs::create_dir_all(dir)?;
        report::export_csv(&suite, &dir.join("benchmark_results.csv"))?;
        report::export_json(&suite, &dir.join("benchmark_results.json"))?;
    }

    kind.destroy(&cli.path)?;
    println!("\n{}\n", "✓ Benchmark complete!".green());
    Ok(())
}

fn bulk_path_for(path: &Path) -> BenchResult<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BenchError::Config(format!("invalid database path {:?}", path)))?;
    Ok(path.with_file_name(format!("{}_bulk", name)))
}
