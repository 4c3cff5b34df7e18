// core/src/dashboard/synthetic.rs
//! Placeholder telemetry used when no backend is selected or reachable.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::models::{GpuStats, JobState, MetricsSnapshot, SchedulerJob, SystemStats};

pub const DEFAULT_CPU_JITTER: f64 = 5.0;
pub const DEFAULT_MEMORY_JITTER: f64 = 2.5;

/// Half-widths of the symmetric noise applied to the host percentages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    pub cpu: f64,
    pub memory: f64,
}

impl Default for Jitter {
    fn default() -> Self {
        Jitter {
            cpu: DEFAULT_CPU_JITTER,
            memory: DEFAULT_MEMORY_JITTER,
        }
    }
}

impl Jitter {
    pub fn none() -> Self {
        Jitter { cpu: 0.0, memory: 0.0 }
    }
}

/// Offsets `value` by `amplitude * draw` and clamps into [0, 100].
///
/// `draw` is expected in [-1, 1] and is clamped to it.
pub fn perturb(value: f64, amplitude: f64, draw: f64) -> f64 {
    let offset = amplitude.abs() * draw.clamp(-1.0, 1.0);
    (value + offset).clamp(0.0, 100.0)
}

/// Derives a fresh snapshot from `baseline`. Only the two host percentages move.
pub fn synthesize<R: Rng + ?Sized>(
    baseline: &MetricsSnapshot,
    jitter: Jitter,
    rng: &mut R,
) -> MetricsSnapshot {
    let mut next = baseline.clone();
    next.system.cpu_usage_percent = perturb(
        baseline.system.cpu_usage_percent,
        jitter.cpu,
        rng.gen_range(-1.0..=1.0),
    );
    next.system.memory_usage_percent = perturb(
        baseline.system.memory_usage_percent,
        jitter.memory,
        rng.gen_range(-1.0..=1.0),
    );
    next.timestamp = Utc::now();
    next
}

fn job(
    id: &str,
    name: &str,
    user: &str,
    state: JobState,
    cpus: u32,
    memory: &str,
    walltime: &str,
    nodelist: &str,
) -> SchedulerJob {
    SchedulerJob {
        id: id.to_string(),
        name: name.to_string(),
        user: user.to_string(),
        state,
        nodes: 1,
        cpus,
        memory: memory.to_string(),
        walltime: walltime.to_string(),
        nodelist: nodelist.to_string(),
    }
}

fn rtx_3090(uuid: &str, temperature: i64, used: u64, gpu_util: u32, mem_util: u32, is_hot: bool) -> GpuStats {
    const TOTAL_MIB: u64 = 24576;
    GpuStats {
        uuid: uuid.to_string(),
        gpu_name: "NVIDIA GeForce RTX 3090".to_string(),
        temperature,
        memory_total: TOTAL_MIB,
        memory_used: used,
        memory_free: TOTAL_MIB - used,
        gpu_utilization: gpu_util,
        memory_utilization: mem_util,
        is_hot,
    }
}

/// The seed snapshot: a small two-GPU node with a short queue.
pub fn baseline() -> MetricsSnapshot {
    MetricsSnapshot {
        jobs: vec![
            job("72892", "bash", "user1", JobState::Running, 1, "500M", "3-00:00:00", "gpu-node-01"),
            job("72893", "train_model", "user2", JobState::Running, 8, "16G", "2-12:00:00", "gpu-node-02"),
            job("72894", "data_processing", "user1", JobState::Pending, 2, "4G", "4-00:00:00", "(Resources)"),
            job("72895", "jupyter_notebook", "user3", JobState::Pending, 4, "8G", "7-00:00:00", "(Priority)"),
        ],
        gpus: vec![
            rtx_3090("GPU-d49e29a8-3f5f-4a6d-9be2-4a4a5b6c7d8e", 55, 10240, 80, 42, false),
            rtx_3090("GPU-a1b2c3d4-e5f6-a7b8-c9d0-e1f2a3b4c5d6", 85, 20480, 95, 83, true),
        ],
        system: SystemStats {
            cpu_usage_percent: 45.2,
            memory_usage_percent: 67.8,
            memory_total_gb: 32.0,
            memory_used_gb: 21.7,
        },
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn baseline_is_internally_consistent() {
        let seed = baseline();
        assert!(seed.validate().is_ok());
        assert_eq!(seed.jobs.len(), 4);
        assert_eq!(seed.gpus.len(), 2);
        assert!(seed.gpus[1].is_hot);
    }

    #[test]
    fn perturb_clamps_extreme_draws() {
        assert_eq!(perturb(1.0, 5.0, -1.0), 0.0);
        assert_eq!(perturb(99.0, 5.0, 1.0), 100.0);
        assert_eq!(perturb(0.0, 50.0, -1.0), 0.0);
        assert_eq!(perturb(100.0, 50.0, 1.0), 100.0);
        // out-of-range draws are treated as the nearest bound
        assert_eq!(perturb(50.0, 5.0, 7.0), 55.0);
        assert_eq!(perturb(50.0, -5.0, -1.0), 45.0);
    }

    #[test]
    fn synthesize_stays_in_range_near_the_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut edge = baseline();
        edge.system.cpu_usage_percent = 0.5;
        edge.system.memory_usage_percent = 99.5;
        let wide = Jitter { cpu: 40.0, memory: 40.0 };

        for _ in 0..1000 {
            let next = synthesize(&edge, wide, &mut rng);
            assert!((0.0..=100.0).contains(&next.system.cpu_usage_percent));
            assert!((0.0..=100.0).contains(&next.system.memory_usage_percent));
        }
    }

    #[test]
    fn synthesize_only_moves_host_percentages() {
        let mut rng = StdRng::seed_from_u64(42);
        let seed = baseline();
        let next = synthesize(&seed, Jitter::default(), &mut rng);

        assert_eq!(next.jobs, seed.jobs);
        assert_eq!(next.gpus, seed.gpus);
        assert_eq!(next.system.memory_total_gb, seed.system.memory_total_gb);
        assert_eq!(next.system.memory_used_gb, seed.system.memory_used_gb);
        assert!((next.system.cpu_usage_percent - 45.2).abs() <= 5.0 + 1e-9);
        assert!((next.system.memory_usage_percent - 67.8).abs() <= 2.5 + 1e-9);
        assert!(next.gpus.iter().all(GpuStats::memory_consistent));
    }

    #[test]
    fn zero_jitter_reproduces_baseline_data() {
        let mut rng = StdRng::seed_from_u64(1);
        let seed = baseline();
        let a = synthesize(&seed, Jitter::none(), &mut rng);
        let b = synthesize(&seed, Jitter::none(), &mut rng);
        assert!(a.eq_ignoring_timestamp(&b));
        assert!(a.eq_ignoring_timestamp(&seed));
    }
}
