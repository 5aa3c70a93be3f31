//! Process memory sampling.
//!
//! Memory is sampled at fixed checkpoints of the run (initial, after open,
//! after the heavy workloads, final) and reduced to an
//! initial/peak/final/delta summary. Sampling must never fail the run: a
//! platform without process introspection just reports zero.

use serde::Serialize;

/// Resident-memory sampler capability. One production implementation per
/// platform, a null implementation everywhere else.
pub trait MemoryProbe {
    /// Current process resident memory in KiB; 0 when unavailable.
    fn sample_kb(&self) -> u64;
}

/// Linux probe reading `VmRSS` from `/proc/self/status`.
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn sample_kb(&self) -> u64 {
        let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
            return 0;
        };
        status
            .lines()
            .find_map(|line| line.strip_prefix("VmRSS:"))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse().ok())
            .unwrap_or(0)
    }
}

/// Fallback for platforms without a probe implementation.
pub struct NullProbe;

impl MemoryProbe for NullProbe {
    fn sample_kb(&self) -> u64 {
        0
    }
}

pub fn platform_probe() -> Box<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcStatusProbe)
    } else {
        Box::new(NullProbe)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Checkpoint tracking
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    pub initial_kb: u64,
    pub peak_kb: u64,
    pub final_kb: u64,
}

impl MemorySummary {
    /// Final minus initial; negative means the process shrank.
    pub fn delta_kb(&self) -> i64 {
        self.final_kb as i64 - self.initial_kb as i64
    }
}

/// Accumulates checkpoint samples over the run.
pub struct MemoryTracker {
    probe: Box<dyn MemoryProbe>,
    initial_kb: u64,
    peak_kb: u64,
    last_kb: u64,
}

impl MemoryTracker {
    /// Takes the initial sample immediately.
    pub fn new(probe: Box<dyn MemoryProbe>) -> Self {
        let initial = probe.sample_kb();
        Self {
            probe,
            initial_kb: initial,
            peak_kb: initial,
            last_kb: initial,
        }
    }

    pub fn initial_kb(&self) -> u64 {
        self.initial_kb
    }

    /// Sample now and fold it into the peak. Returns the sample.
    pub fn checkpoint(&mut self) -> u64 {
        let kb = self.probe.sample_kb();
        self.peak_kb = self.peak_kb.max(kb);
        self.last_kb = kb;
        kb
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            initial_kb: self.initial_kb,
            // peak >= max(initial, final) by construction.
            peak_kb: self.peak_kb.max(self.last_kb),
            final_kb: self.last_kb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedProbe {
        samples: std::cell::RefCell<Vec<u64>>,
    }

    impl MemoryProbe for ScriptedProbe {
        fn sample_kb(&self) -> u64 {
            self.samples.borrow_mut().remove(0)
        }
    }

    #[test]
    fn peak_dominates_initial_and_final() {
        let probe = ScriptedProbe {
            samples: std::cell::RefCell::new(vec![100, 500, 300, 200]),
        };
        let mut tracker = MemoryTracker::new(Box::new(probe));
        tracker.checkpoint();
        tracker.checkpoint();
        tracker.checkpoint();
        let s = tracker.summary();
        assert_eq!(s.initial_kb, 100);
        assert_eq!(s.peak_kb, 500);
        assert_eq!(s.final_kb, 200);
        assert!(s.peak_kb >= s.initial_kb.max(s.final_kb));
        assert_eq!(s.delta_kb(), 100);
    }

    #[test]
    fn shrinking_process_yields_negative_delta() {
        let probe = ScriptedProbe {
            samples: std::cell::RefCell::new(vec![400, 100]),
        };
        let mut tracker = MemoryTracker::new(Box::new(probe));
        tracker.checkpoint();
        let s = tracker.summary();
        assert_eq!(s.delta_kb(), -300);
        assert_eq!(s.peak_kb, 400);
    }

    #[test]
    fn null_probe_reports_zero() {
        assert_eq!(NullProbe.sample_kb(), 0);
        let s = MemoryTracker::new(Box::new(NullProbe)).summary();
        assert_eq!(s.initial_kb, 0);
        assert_eq!(s.peak_kb, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn proc_status_probe_sees_live_process() {
        assert!(ProcStatusProbe.sample_kb() > 0);
    }
}
