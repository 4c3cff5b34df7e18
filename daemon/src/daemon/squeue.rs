// src/daemon/squeue.rs
use anyhow::{anyhow, Context, Result};
use clusterdash_core::utils::models::{JobState, SchedulerJob};
use log::{debug, warn};
use std::time::Duration;
use tokio::process::Command;
use tokio::time;

/// Column order: JOBID|NAME|USER|STATE|NODES|CPUS|MEMORY|SUBMIT_TIME|START_TIME|TIME_LEFT|NODELIST(REASON)
pub const SQUEUE_FORMAT: &str = "%.18i|%.80j|%.8u|%.9T|%.6D|%.4C|%.10m|%.20V|%.20S|%.10L|%R";
const FIELD_COUNT: usize = 11;
const DELIMITER: char = '|';
/// An unreachable slurmctld can leave `squeue` hanging.
pub const SQUEUE_TIMEOUT: Duration = Duration::from_secs(10);

/// Folds the many SLURM job states onto the four the dashboard shows.
pub fn map_state(raw: &str) -> JobState {
    // e.g. "CANCELLED by 1001"
    let state = raw.split_whitespace().next().unwrap_or("").to_uppercase();
    match state.as_str() {
        "RUNNING" | "COMPLETING" | "CONFIGURING" | "STAGE_OUT" | "SIGNALING" => JobState::Running,
        "PENDING" | "REQUEUED" | "REQUEUE_HOLD" | "REQUEUE_FED" | "RESIZING" | "SUSPENDED"
        | "STOPPED" => JobState::Pending,
        "COMPLETED" => JobState::Completed,
        _ => JobState::Failed,
    }
}

/// Parses one `squeue` line in `SQUEUE_FORMAT`.
pub fn parse_line(line: &str) -> Result<SchedulerJob> {
    // Job names may contain commas, hence the pipe. NODELIST takes whatever remains.
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, DELIMITER).map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(anyhow!(
            "expected {} fields, found {}: {:?}",
            FIELD_COUNT,
            fields.len(),
            line
        ));
    }

    let nodes: u32 = fields[4]
        .parse()
        .with_context(|| format!("invalid NODES value {:?}", fields[4]))?;
    let cpus: u32 = fields[5]
        .parse()
        .with_context(|| format!("invalid CPUS value {:?}", fields[5]))?;

    Ok(SchedulerJob {
        id: fields[0].to_string(),
        name: fields[1].to_string(),
        user: fields[2].to_string(),
        state: map_state(fields[3]),
        nodes: nodes.max(1),
        cpus: cpus.max(1),
        memory: fields[6].to_string(),
        walltime: fields[9].to_string(),
        nodelist: fields[10].to_string(),
    })
}

/// Parses full `squeue` output, skipping blanks, a header row, and unparsable lines.
pub fn parse_output(output: &str) -> Vec<SchedulerJob> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with("JOBID"))
        .filter_map(|line| match parse_line(line) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!("Skipping squeue line: {:#}", e);
                None
            }
        })
        .collect()
}

/// Runs `cmd` to completion and returns its stdout, killing it after `timeout`.
async fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<String> {
    cmd.kill_on_drop(true);
    let output = match time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.context("Failed to launch squeue")?,
        Err(_) => {
            return Err(anyhow!(
                "squeue timed out after {} ms",
                timeout.as_millis()
            ))
        }
    };

    if !output.status.success() {
        return Err(anyhow!(
            "squeue exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs `squeue` and returns the parsed queue.
pub async fn query_jobs() -> Result<Vec<SchedulerJob>> {
    let mut cmd = Command::new("squeue");
    cmd.arg("--noheader")
        .arg(format!("--format={}", SQUEUE_FORMAT));

    let stdout = run_with_timeout(cmd, SQUEUE_TIMEOUT).await?;
    let jobs = parse_output(&stdout);
    debug!("squeue reported {} jobs", jobs.len());
    Ok(jobs)
}
