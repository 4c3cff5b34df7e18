// src/cli/snapshot.rs
use anyhow::{Context, Result};
use clusterdash_core::dashboard::{synthetic, DashboardView, Mode, RefreshController, SnapshotStore};
use clusterdash_core::source::HttpMetricsSource;
use clusterdash_core::utils::logging;
use clusterdash_core::utils::models::{GpuStats, JobState, HOT_UTILIZATION_PERCENT};
use chrono::Local;
use colored::*;
use std::sync::Arc;
use structopt::StructOpt;

use crate::cli::{load_config, Overrides};

#[derive(StructOpt, Debug)]
pub struct SnapshotCommand {
    /// Optional path to config file
    #[structopt(long)]
    pub config: Option<String>,

    /// Metrics endpoint, overrides the config file
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// Perturb the built-in sample instead of fetching
    #[structopt(long)]
    pub synthetic: bool,
}

impl SnapshotCommand {
    pub fn execute(self) -> Result<()> {
        let mut config = load_config(
            self.config.as_deref(),
            Overrides {
                endpoint: self.endpoint,
                interval_ms: None,
            },
        )?;
        config.mode = if self.synthetic { Mode::Synthetic } else { Mode::Live };

        logging::init(&config.log_path, logging::parse_level(&config.log_level))
            .context("Failed to initialize logger")?;

        let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        let view = runtime.block_on(async {
            let source = HttpMetricsSource::with_timeout(config.endpoint.clone(), config.poll_interval())
                .context("Failed to build HTTP client")?;
            let store = SnapshotStore::new(synthetic::baseline());
            let controller =
                RefreshController::new(store.clone(), Arc::new(source), config.controller_settings());
            if config.mode == Mode::Live {
                println!(
                    "{} Fetching metrics from {}...",
                    "[INFO]".blue(),
                    config.endpoint.yellow()
                );
            }
            controller.tick().await;
            Ok::<_, anyhow::Error>(store.view().await)
        })?;

        for line in render_lines(&view, config.mode) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn temperature_colored(gpu: &GpuStats) -> ColoredString {
    let text = format!("{}°C", gpu.temperature);
    if gpu.is_temperature_elevated() {
        text.red()
    } else {
        text.green()
    }
}

fn utilization_colored(gpu: &GpuStats) -> ColoredString {
    let text = format!("{}%", gpu.gpu_utilization);
    if gpu.gpu_utilization > HOT_UTILIZATION_PERCENT {
        text.red()
    } else {
        text.blue()
    }
}

fn state_colored(state: JobState) -> ColoredString {
    match state {
        JobState::Running => state.as_str().green(),
        JobState::Pending => state.as_str().yellow(),
        JobState::Completed => state.as_str().blue(),
        JobState::Failed => state.as_str().red(),
    }
}

fn render_lines(view: &DashboardView, mode: Mode) -> Vec<String> {
    let snapshot = &view.snapshot;
    let mut lines = Vec::new();

    lines.push(format!(
        "{} Snapshot ({}) taken at {}",
        "[INFO]".blue(),
        mode,
        snapshot.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(error) = &view.error {
        lines.push(format!(
            "{} {} (showing sample data)",
            "[WARN]".yellow(),
            error
        ));
    }

    let system = &snapshot.system;
    lines.push(String::new());
    lines.push(format!("{}", "System Overview".bold().underline()));
    lines.push(format!(
        "  CPU {:.1}%   Memory {:.1}%   {:.1} / {:.1} GB",
        system.cpu_usage_percent,
        system.memory_usage_percent,
        system.memory_used_gb,
        system.memory_total_gb
    ));

    lines.push(String::new());
    lines.push(format!("{}", "GPU Status".bold().underline()));
    if snapshot.gpus.is_empty() {
        lines.push(format!("{} No GPUs detected", "[INFO]".blue()));
    } else {
        lines.push(format!(
            "{:<14} {:<26} {:<8} {:<18} {:<9} {}",
            "UUID".bold(),
            "Name".bold(),
            "Temp".bold(),
            "Memory".bold(),
            "GPU Util".bold(),
            "Mem Util".bold()
        ));
        lines.push("-".repeat(90));
        for gpu in &snapshot.gpus {
            let uuid = gpu.uuid.get(..12).unwrap_or(&gpu.uuid);
            let mut line = format!(
                "{:<14} {:<26} {:<8} {:<18} {:<9} {}%",
                uuid.yellow(),
                gpu.gpu_name,
                temperature_colored(gpu),
                format!("{}/{} MiB", gpu.memory_used, gpu.memory_total),
                utilization_colored(gpu),
                gpu.memory_utilization
            );
            if gpu.is_hot {
                line.push_str(&format!("  {}", "HOT".red().bold()));
            }
            lines.push(line);
        }
    }

    lines.push(String::new());
    lines.push(format!("{}", "SLURM Jobs".bold().underline()));
    if snapshot.jobs.is_empty() {
        lines.push(format!("{} No SLURM jobs found", "[INFO]".blue()));
    } else {
        lines.push(format!(
            "{:<9} {:<18} {:<10} {:<10} {:<6} {:<5} {:<8} {:<12} {}",
            "Job ID".bold(),
            "Name".bold(),
            "User".bold(),
            "State".bold(),
            "Nodes".bold(),
            "CPUs".bold(),
            "Memory".bold(),
            "Walltime".bold(),
            "Nodelist".bold()
        ));
        lines.push("-".repeat(100));
        for job in &snapshot.jobs {
            lines.push(format!(
                "{:<9} {:<18} {:<10} {:<10} {:<6} {:<5} {:<8} {:<12} {}",
                job.id,
                job.name,
                job.user,
                state_colored(job.state),
                job.nodes,
                job.cpus,
                job.memory,
                job.walltime,
                job.nodelist
            ));
        }
    }
    lines
}
