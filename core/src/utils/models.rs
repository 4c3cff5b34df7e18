// core/src/utils/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// GPU utilization above which a device is flagged hot.
pub const HOT_UTILIZATION_PERCENT: u32 = 90;
/// Temperature above which a device is rendered as elevated.
pub const ELEVATED_TEMPERATURE_C: i64 = 80;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Running,
    Pending,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Running => "RUNNING",
            JobState::Pending => "PENDING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job as reported by the workload manager queue.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SchedulerJob {
    #[serde(deserialize_with = "string_or_integer")]
    pub id: String,
    pub name: String,
    pub user: String,
    pub state: JobState,
    pub nodes: u32,
    pub cpus: u32,
    pub memory: String,   // human readable, e.g. "16G"
    pub walltime: String, // DD-HH:MM:SS or HH:MM:SS
    pub nodelist: String, // hostname or "(Reason)" while pending
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GpuStats {
    pub uuid: String,
    pub gpu_name: String,
    pub temperature: i64, // °C
    pub memory_total: u64, // MiB
    pub memory_used: u64,  // MiB
    pub memory_free: u64,  // MiB
    pub gpu_utilization: u32,
    pub memory_utilization: u32,
    #[serde(default)]
    pub is_hot: bool,
}

impl GpuStats {
    /// Hot flag as derived by a collector from raw readings.
    pub fn hot_from_readings(temperature: i64, gpu_utilization: u32) -> bool {
        temperature > ELEVATED_TEMPERATURE_C || gpu_utilization > HOT_UTILIZATION_PERCENT
    }

    /// Folds the utilization rule into the upstream flag. Never clears a flag set upstream.
    pub fn normalize_hot(&mut self) {
        self.is_hot = self.is_hot || self.gpu_utilization > HOT_UTILIZATION_PERCENT;
    }

    /// Temperature styling rule, independent of `is_hot`.
    pub fn is_temperature_elevated(&self) -> bool {
        self.temperature > ELEVATED_TEMPERATURE_C
    }

    pub fn memory_consistent(&self) -> bool {
        self.memory_used.checked_add(self.memory_free) == Some(self.memory_total)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SystemStats {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
}

/// Everything the dashboard shows, replaced as a whole on every refresh.
///
/// On the wire the collections use the backend's historical key names
/// (`slurm_jobs`, `gpu_stats`, `system_stats`); the short names are accepted
/// when decoding.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    #[serde(rename = "slurm_jobs", alias = "jobs")]
    pub jobs: Vec<SchedulerJob>,
    #[serde(rename = "gpu_stats", alias = "gpus")]
    pub gpus: Vec<GpuStats>,
    #[serde(rename = "system_stats", alias = "system")]
    pub system: SystemStats,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShapeViolation {
    #[error("GPU {uuid}: used ({used}) + free ({free}) != total ({total}) MiB")]
    GpuMemoryMismatch {
        uuid: String,
        used: u64,
        free: u64,
        total: u64,
    },
    #[error("GPU uuid {0} appears more than once")]
    DuplicateGpu(String),
    #[error("{field} = {value} is outside [0, 100]")]
    PercentOutOfRange { field: &'static str, value: f64 },
}

impl MetricsSnapshot {
    /// Checks the invariants a producer is expected to uphold.
    pub fn validate(&self) -> Result<(), ShapeViolation> {
        let mut seen = HashSet::with_capacity(self.gpus.len());
        for gpu in &self.gpus {
            if !gpu.memory_consistent() {
                return Err(ShapeViolation::GpuMemoryMismatch {
                    uuid: gpu.uuid.clone(),
                    used: gpu.memory_used,
                    free: gpu.memory_free,
                    total: gpu.memory_total,
                });
            }
            if !seen.insert(gpu.uuid.as_str()) {
                return Err(ShapeViolation::DuplicateGpu(gpu.uuid.clone()));
            }
        }

        for (field, value) in [
            ("cpu_usage_percent", self.system.cpu_usage_percent),
            ("memory_usage_percent", self.system.memory_usage_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ShapeViolation::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn normalize_hot(&mut self) {
        self.gpus.iter_mut().for_each(GpuStats::normalize_hot);
    }

    pub fn eq_ignoring_timestamp(&self, other: &MetricsSnapshot) -> bool {
        self.jobs == other.jobs && self.gpus == other.gpus && self.system == other.system
    }
}

// Older backends emitted numeric job ids.
fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Integer(number) => number.to_string(),
    })
}
