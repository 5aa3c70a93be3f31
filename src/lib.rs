//! Shared types, operation generators and latency recording for kvbench.
//!
//! The harness drives a single storage engine through a fixed battery of
//! workloads under a constrained resource profile and reports throughput,
//! latency percentiles and process memory consumption.

pub mod engines;
pub mod probe;
pub mod profile;
pub mod report;
pub mod workloads;

use hdrhistogram::Histogram;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("config error: {0}")]
    Config(String),
}

// ────────────────────────────────────────────────────────────────────────────────
// Operation generator (deterministic via ChaCha8Rng)
// ────────────────────────────────────────────────────────────────────────────────

/// Key/value shapes plus a seeded index stream for the random workloads.
///
/// Key and value layout is fixed so every run produces the same operation
/// shapes; only index selection draws from the seeded RNG. The main run
/// uses `key_` keys; bulk load uses the disjoint `bulk_key_` prefix so the
/// two runs can never observe each other's data.
pub struct OpGen {
    rng: ChaCha8Rng,
}

impl OpGen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Main-run key: `key_{i:08}`.
    pub fn key(&self, i: u64) -> Vec<u8> {
        format!("key_{:08}", i).into_bytes()
    }

    /// Initial load value. Deliberately not minimal so writes carry a
    /// realistic payload.
    pub fn value(&self, i: u64) -> Vec<u8> {
        format!(
            "value_{:08}_with_some_additional_data_to_make_it_realistic",
            i
        )
        .into_bytes()
    }

    /// Value written by the random-update workload.
    pub fn updated_value(&self, i: u64) -> Vec<u8> {
        format!("updated_value_{:08}", i).into_bytes()
    }

    /// Value written by the mixed workload.
    pub fn mixed_value(&self, i: u64) -> Vec<u8> {
        format!("mixed_value_{:08}", i).into_bytes()
    }

    /// Bulk-load key: `bulk_key_{i:08}` (disjoint prefix from the main run).
    pub fn bulk_key(&self, i: u64) -> Vec<u8> {
        format!("bulk_key_{:08}", i).into_bytes()
    }

    pub fn bulk_value(&self, i: u64) -> Vec<u8> {
        format!("bulk_value_{:08}", i).into_bytes()
    }

    /// Uniform index in `[0, n)`, sampling with replacement.
    pub fn index(&mut self, n: u64) -> u64 {
        self.rng.gen_range(0..n.max(1))
    }

    /// Uniform roll in `[0, 100)` for the mixed-workload op choice.
    pub fn roll(&mut self) -> u8 {
        self.rng.gen_range(0..100)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Latency recorder (HDR histogram)
// ────────────────────────────────────────────────────────────────────────────────

pub struct LatencyRecorder {
    hist: Histogram<u64>,
    total: Duration,
    ops: u64,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self {
            // 1ns .. 60s at 3 significant figures covers any single op here.
            hist: Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3)
                .expect("static histogram bounds"),
            total: Duration::ZERO,
            ops: 0,
        }
    }

    /// Start a latency measurement.
    #[inline(always)]
    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// Record one op's elapsed time since `start`.
    #[inline(always)]
    pub fn record(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let nanos = elapsed.as_nanos() as u64;
        let _ = self.hist.record(nanos.max(1));
        self.total += elapsed;
        self.ops += 1;
    }

    /// Record `n` ops that collectively took `elapsed` (one batch commit).
    pub fn record_batch(&mut self, elapsed: Duration, n: u64) {
        let per_op = elapsed.as_nanos() as u64 / n.max(1);
        for _ in 0..n {
            let _ = self.hist.record(per_op.max(1));
        }
        self.total += elapsed;
        self.ops += n;
    }

    pub fn ops(&self) -> u64 {
        self.ops
    }

    pub fn total_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }

    /// Ops/sec, or 0.0 when nothing was recorded (reported as "n/a").
    pub fn throughput(&self) -> f64 {
        if self.ops > 0 && self.total > Duration::ZERO {
            self.ops as f64 / self.total.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn percentile_us(&self, p: f64) -> f64 {
        self.hist.value_at_percentile(p) as f64 / 1_000.0
    }

    pub fn mean_us(&self) -> f64 {
        self.hist.mean() / 1_000.0
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Benchmark output types
// ────────────────────────────────────────────────────────────────────────────────

/// One workload's completed measurement. Never mutated after being pushed
/// into the suite; suite order is execution order.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub engine: String,
    pub workload: String,
    pub ops: u64,
    pub total_secs: f64,
    pub throughput: f64, // ops/sec, 0.0 means "n/a"
    pub p50_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub mean_us: f64,
    pub extra: BTreeMap<String, String>,
}

impl BenchmarkResult {
    pub fn from_recorder(engine: &str, workload: &str, rec: &LatencyRecorder) -> Self {
        Self {
            engine: engine.to_string(),
            workload: workload.to_string(),
            ops: rec.ops(),
            total_secs: rec.total_secs(),
            throughput: rec.throughput(),
            p50_us: rec.percentile_us(50.0),
            p99_us: rec.percentile_us(99.0),
            p999_us: rec.percentile_us(99.9),
            mean_us: rec.mean_us(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, val: impl ToString) -> Self {
        self.extra.insert(key.to_string(), val.to_string());
        self
    }
}

/// Engine-reported internal memory usage, queried once after the main
/// workload sequence. `None` means the engine does not expose that figure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineInternalStats {
    pub cache_bytes: Option<u64>,
    pub memtable_bytes: Option<u64>,
    pub table_reader_bytes: Option<u64>,
    pub disk_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchSuite {
    pub system_info: SystemInfo,
    pub engine: String,
    pub results: Vec<BenchmarkResult>,
    pub memory: probe::MemorySummary,
    pub internal: EngineInternalStats,
    /// First workload start to last workload end; excludes the bulk-load
    /// engine's own open/close.
    pub total_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            timestamp: epoch_timestamp(),
        }
    }
}

fn epoch_timestamp() -> String {
    let d = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}s-since-epoch", d.as_secs())
}
