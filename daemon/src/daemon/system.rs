// src/daemon/system.rs
use clusterdash_core::utils::models::SystemStats;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System, MINIMUM_CPU_UPDATE_INTERVAL};
use std::thread;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Host CPU and memory sampler.
///
/// CPU usage is measured between consecutive refreshes, so the sampler
/// must be kept alive across collection cycles. `new` blocks for
/// `MINIMUM_CPU_UPDATE_INTERVAL` to take the first measurement.
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        // First reading needs a baseline refresh one interval earlier
        thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();
        SystemSampler { system }
    }

    pub fn sample(&mut self) -> SystemStats {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        system_stats_from(
            self.system.global_cpu_usage() as f64,
            self.system.total_memory(),
            self.system.used_memory(),
        )
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Builds `SystemStats` from raw readings: percents to one decimal, GB to two.
pub fn system_stats_from(cpu_percent: f64, total_bytes: u64, used_bytes: u64) -> SystemStats {
    let cpu = if cpu_percent.is_finite() { cpu_percent.clamp(0.0, 100.0) } else { 0.0 };
    let used_bytes = used_bytes.min(total_bytes);
    let memory_percent = if total_bytes == 0 {
        0.0
    } else {
        used_bytes as f64 / total_bytes as f64 * 100.0
    };

    SystemStats {
        cpu_usage_percent: round_to(cpu, 1),
        memory_usage_percent: round_to(memory_percent, 1),
        memory_total_gb: round_to(total_bytes as f64 / BYTES_PER_GB, 2),
        memory_used_gb: round_to(used_bytes as f64 / BYTES_PER_GB, 2),
    }
}
