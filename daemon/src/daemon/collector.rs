// src/daemon/collector.rs
use chrono::Utc;
use clusterdash_core::dashboard::synthetic;
use clusterdash_core::gpu::monitor::GpuMonitor;
use clusterdash_core::utils::models::{GpuStats, MetricsSnapshot};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::daemon::squeue;
use crate::daemon::state::BackendState;
use crate::daemon::system::SystemSampler;

/// Where the collector gets its data from.
pub enum Collector {
    /// Probe the host: squeue, NVML, sysinfo.
    Host {
        gpu_monitor: Option<GpuMonitor>,
        sampler: SystemSampler,
    },
    /// Serve the built-in sample data.
    Mock,
}

impl Collector {
    pub fn host() -> Self {
        let gpu_monitor = match GpuMonitor::new() {
            Ok(monitor) => {
                info!(
                    "NVML initialized, {} GPU(s) visible",
                    monitor.device_count().unwrap_or(0)
                );
                Some(monitor)
            }
            Err(e) => {
                warn!("GPU monitoring disabled: {:#}", e);
                None
            }
        };
        Collector::Host {
            gpu_monitor,
            sampler: SystemSampler::new(),
        }
    }

    /// Gathers one snapshot. Individual source failures degrade to empty lists.
    pub async fn collect(&mut self) -> MetricsSnapshot {
        match self {
            Collector::Mock => {
                let mut snapshot = synthetic::baseline();
                snapshot.timestamp = Utc::now();
                snapshot
            }
            Collector::Host {
                gpu_monitor,
                sampler,
            } => {
                let jobs = match squeue::query_jobs().await {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        warn!("Failed to query SLURM jobs: {:#}", e);
                        Vec::new()
                    }
                };
                let gpus = gpu_monitor.as_ref().map(collect_gpus).unwrap_or_default();
                MetricsSnapshot {
                    jobs,
                    gpus,
                    system: sampler.sample(),
                    timestamp: Utc::now(),
                }
            }
        }
    }
}

fn collect_gpus(monitor: &GpuMonitor) -> Vec<GpuStats> {
    match monitor.get_all_stats() {
        Ok(results) => results
            .into_iter()
            .enumerate()
            .filter_map(|(index, result)| match result {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!("Skipping GPU {}: {:#}", index, e);
                    None
                }
            })
            .collect(),
        Err(e) => {
            error!("Failed to enumerate GPUs: {:#}", e);
            Vec::new()
        }
    }
}

/// Refreshes `state` every `interval` until `shutdown_rx` flips to true.
pub async fn run_collector(
    mut collector: Collector,
    state: BackendState,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Collector started, interval {} ms", interval.as_millis());
    loop {
        let snapshot = collector.collect().await;
        debug!(
            "Collected {} jobs, {} GPUs, cpu {:.1}%",
            snapshot.jobs.len(),
            snapshot.gpus.len(),
            snapshot.system.cpu_usage_percent
        );
        state.replace(snapshot).await;

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown_rx.changed() => {
                info!("Collector stopping");
                break;
            }
        }
    }
}
