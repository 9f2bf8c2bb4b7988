//! Best-effort process memory sampling
//!
//! Reads the harness process RSS through sysinfo. Hosts that expose no
//! process table degrade to 0.0; downstream aggregation treats zeros as
//! "unavailable" rather than failing the run.

use std::sync::Mutex;

use sysinfo::System;

pub struct MemoryProbe {
    system: Mutex<System>,
    pid: sysinfo::Pid,
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::Pid::from(std::process::id() as usize),
        }
    }

    /// Current process memory in MB, 0.0 when unavailable.
    pub fn sample_mb(&self) -> f64 {
        let mut system = self.system.lock().expect("memory probe lock poisoned");
        if !system.refresh_process(self.pid) {
            return 0.0;
        }
        system
            .process(self.pid)
            .map(|p| p.memory() as f64 / 1024.0 / 1024.0)
            .unwrap_or(0.0)
    }

    /// Delta between two readings, clamped to finite and non-negative so a
    /// missing reading cannot corrupt the aggregate.
    pub fn delta_mb(before: f64, after: f64) -> f64 {
        let delta = after - before;
        if !delta.is_finite() {
            return 0.0;
        }
        delta.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_finite_and_non_negative() {
        let probe = MemoryProbe::new();
        let mb = probe.sample_mb();
        assert!(mb.is_finite());
        assert!(mb >= 0.0);
    }

    #[test]
    fn delta_is_sanitized() {
        assert_eq!(MemoryProbe::delta_mb(10.0, 8.0), 0.0);
        assert_eq!(MemoryProbe::delta_mb(10.0, 12.5), 2.5);
        assert_eq!(MemoryProbe::delta_mb(f64::NAN, 12.5), 0.0);
        assert_eq!(MemoryProbe::delta_mb(0.0, f64::INFINITY), 0.0);
    }
}
