//! Console report, CSV and JSON export.
//!
//! Presentation only: everything here is derived from `BenchSuite` and can
//! be swapped for another reporter without touching the measurement path.

use crate::{BenchSuite, BenchmarkResult};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use std::path::Path;

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

pub fn print_banner(engine: &str, records: u64) {
    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║        Key-Value Engine Benchmark (Small Resource DB)        ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );
    println!("  Engine: {}  Records: {}", engine, format_count(records));
}

/// Echo the resource budget the engine was configured with, so a report is
/// self-describing about what was being emulated.
pub fn print_profile(profile: &crate::profile::ResourceProfile) {
    println!("  Configuration:");
    println!("    - Cache:            {}", format_bytes(profile.cache_bytes));
    println!(
        "    - Write buffer:     {}",
        format_bytes(profile.write_buffer_bytes)
    );
    println!("    - Block size:       {}", format_bytes(profile.block_bytes));
    println!(
        "    - Compression:      {}",
        if profile.compression { "Enabled" } else { "Disabled" }
    );
    println!("    - Max open files:   {}", profile.max_open_files);
    println!("    - Num levels:       {}", profile.num_levels);
    println!(
        "    - Target file size: {}",
        format_bytes(profile.target_file_bytes)
    );
    println!(
        "    - Sync on commit:   {}",
        match profile.durability {
            crate::profile::Durability::Sync => "Yes",
            crate::profile::Durability::Buffered => "No",
        }
    );
}

pub fn print_section(title: &str) {
    println!(
        "\n{}",
        format!("━━━ {} ━━━", title).bold().cyan()
    );
}

/// One green throughput line per finished workload, printed as the run
/// progresses.
pub fn print_result(r: &BenchmarkResult) {
    let throughput = if r.ops == 0 {
        "n/a".to_string()
    } else {
        format!("{} ops/sec", format_commas(r.throughput as u64))
    };
    println!(
        "  {:<18}: {} ({:.3} seconds for {} ops)",
        r.workload,
        throughput.green(),
        r.total_secs,
        format_count(r.ops)
    );
}

/// Full end-of-run report: per-workload table, engine-internal statistics,
/// process memory summary, total time.
pub fn print_suite(suite: &BenchSuite) {
    print_section("Summary");
    println!(
        "  OS: {}  Arch: {}  CPUs: {}  Time: {}",
        suite.system_info.os,
        suite.system_info.arch,
        suite.system_info.cpus,
        suite.system_info.timestamp
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Workload",
        "Ops",
        "Time (s)",
        "Throughput",
        "p50 (μs)",
        "p99 (μs)",
        "p99.9 (μs)",
        "Mean (μs)",
    ]);

    for r in &suite.results {
        let tp_cell = if r.ops == 0 {
            Cell::new("n/a")
        } else {
            Cell::new(format_throughput(r.throughput)).fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&r.workload),
            Cell::new(format_count(r.ops)),
            Cell::new(format!("{:.3}", r.total_secs)),
            tp_cell,
            Cell::new(format!("{:.1}", r.p50_us)),
            Cell::new(format!("{:.1}", r.p99_us)),
            Cell::new(format!("{:.1}", r.p999_us)),
            Cell::new(format!("{:.1}", r.mean_us)),
        ]);
    }
    println!("{table}");

    for r in &suite.results {
        if !r.extra.is_empty() {
            let fields: Vec<String> =
                r.extra.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("  {} {}", r.workload.dimmed(), fields.join(", ").dimmed());
        }
    }

    println!("\n  {} Internal Memory Usage:", suite.engine);
    print_stat_line("Block cache", suite.internal.cache_bytes);
    print_stat_line("Memtables", suite.internal.memtable_bytes);
    print_stat_line("Table readers", suite.internal.table_reader_bytes);
    print_stat_line("On disk", suite.internal.disk_bytes);

    println!("\n  Process Memory Usage:");
    println!("    - Initial:  {}", format_kb(suite.memory.initial_kb));
    println!("    - Final:    {}", format_kb(suite.memory.final_kb));
    println!("    - Peak:     {}", format_kb(suite.memory.peak_kb));
    let delta = suite.memory.delta_kb();
    println!(
        "    - Delta:    {}{}",
        if delta < 0 { "-" } else { "" },
        format_kb(delta.unsigned_abs())
    );

    println!(
        "\n  Total benchmark time: {}",
        format!("{:.2} seconds", suite.total_secs).green()
    );
}

fn print_stat_line(label: &str, value: Option<u64>) {
    match value {
        Some(bytes) => println!("    - {:<14}: {}", label, format_bytes(bytes)),
        None => println!("    - {:<14}: {}", label, "unknown".dimmed()),
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_csv(suite: &BenchSuite, path: &Path) -> std::io::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "engine",
        "workload",
        "ops",
        "total_secs",
        "throughput_ops_sec",
        "p50_us",
        "p99_us",
        "p999_us",
        "mean_us",
        "extra",
    ])?;

    for r in &suite.results {
        let extra: Vec<String> = r.extra.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        wtr.write_record([
            &r.engine,
            &r.workload,
            &r.ops.to_string(),
            &format!("{:.6}", r.total_secs),
            &format!("{:.2}", r.throughput),
            &format!("{:.2}", r.p50_us),
            &format!("{:.2}", r.p99_us),
            &format!("{:.2}", r.p999_us),
            &format!("{:.2}", r.mean_us),
            &extra.join(";"),
        ])?;
    }

    wtr.flush()?;
    println!("  CSV exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_json(suite: &BenchSuite, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(suite)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// Formatting helpers
// ────────────────────────────────────────────────────────────────────────────────

pub fn format_throughput(t: f64) -> String {
    if t >= 1_000_000.0 {
        format!("{:.2}M", t / 1_000_000.0)
    } else if t >= 1_000.0 {
        format!("{:.1}K", t / 1_000.0)
    } else {
        format!("{:.0}", t)
    }
}

pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

/// Thousands separators for the progress lines.
pub fn format_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_bytes(b: u64) -> String {
    if b >= 1_073_741_824 {
        format!("{:.2} GB", b as f64 / 1_073_741_824.0)
    } else if b >= 1_048_576 {
        format!("{:.2} MB", b as f64 / 1_048_576.0)
    } else if b >= 1_024 {
        format!("{:.2} KB", b as f64 / 1_024.0)
    } else {
        format!("{} B", b)
    }
}

/// Memory samples arrive in KiB.
pub fn format_kb(kb: u64) -> String {
    if kb >= 1024 * 1024 {
        format!("{:.2} GB", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.2} MB", kb as f64 / 1024.0)
    } else {
        format!("{} KB", kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_group_by_thousands() {
        assert_eq!(format_commas(0), "0");
        assert_eq!(format_commas(999), "999");
        assert_eq!(format_commas(1_000), "1,000");
        assert_eq!(format_commas(1_234_567), "1,234,567");
    }

    #[test]
    fn counts_scale_to_k_and_m() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(50_000), "50.0K");
        assert_eq!(format_count(1_000_000), "1.00M");
    }

    #[test]
    fn byte_and_kb_units_scale() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_kb(100), "100 KB");
        assert_eq!(format_kb(2048), "2.00 MB");
        assert_eq!(format_kb(3 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn throughput_formatting() {
        assert_eq!(format_throughput(950.4), "950");
        assert_eq!(format_throughput(12_500.0), "12.5K");
        assert_eq!(format_throughput(2_000_000.0), "2.00M");
    }
}
