// core/src/utils/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::dashboard::controller::{ControllerSettings, Mode};
use crate::dashboard::synthetic::{Jitter, DEFAULT_CPU_JITTER, DEFAULT_MEMORY_JITTER};

pub const DEFAULT_CONFIG_FILE: &str = "clusterdash.json";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/metrics";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub endpoint: String,
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,
    pub mode: Mode,
    #[serde(rename = "cpu-jitter")]
    pub cpu_jitter: f64,
    #[serde(rename = "memory-jitter")]
    pub memory_jitter: f64,
    #[serde(rename = "log-level")]
    pub log_level: String,
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            mode: Mode::Synthetic,
            cpu_jitter: DEFAULT_CPU_JITTER,
            memory_jitter: DEFAULT_MEMORY_JITTER,
            log_level: "info".to_string(),
            log_path: "logs/clusterdash.log".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads an explicit path, else `clusterdash.json` in `dir` if present, else defaults.
    pub fn discover(explicit: Option<&str>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(anyhow!("Config file not found at {}", path.display()));
                }
                Self::load(path)
            }
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.exists() {
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll-interval-ms must be greater than zero"));
        }
        for (name, value) in [("cpu-jitter", self.cpu_jitter), ("memory-jitter", self.memory_jitter)] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            interval: self.poll_interval(),
            jitter: Jitter {
                cpu: self.cpu_jitter,
                memory: self.memory_jitter,
            },
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_in_dir_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.mode, Mode::Synthetic);
    }

    #[test]
    fn partial_file_keeps_defaults_for_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        write!(
            file,
            r#"{{"endpoint": "http://head-node:9000/api/metrics", "poll-interval-ms": 2500, "mode": "live"}}"#
        )
        .unwrap();

        let config = DashboardConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.endpoint, "http://head-node:9000/api/metrics");
        assert_eq!(config.poll_interval_ms, 2500);
        assert_eq!(config.mode, Mode::Live);
        assert_eq!(config.cpu_jitter, DEFAULT_CPU_JITTER);

        let settings = config.controller_settings();
        assert_eq!(settings.interval, Duration::from_millis(2500));
        assert_eq!(settings.mode, Mode::Live);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(DashboardConfig::discover(missing.to_str(), dir.path()).is_err());
    }

    #[test]
    fn rejects_zero_interval_and_negative_jitter() {
        let mut config = DashboardConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.memory_jitter = -1.0;
        assert!(config.validate().is_err());
    }
}
