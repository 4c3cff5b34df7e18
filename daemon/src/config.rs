// daemon/src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    #[serde(rename = "listen-addr")]
    pub listen_addr: String,
    #[serde(rename = "collect-interval-ms")]
    pub collect_interval_ms: u64,
    /// Serve the built-in sample data instead of probing the host.
    pub mock: bool,
    #[serde(rename = "log-level")]
    pub log_level: String,
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            listen_addr: "0.0.0.0:8080".to_string(),
            collect_interval_ms: 5_000,
            mock: false,
            log_level: "info".to_string(),
            log_path: "logs/clusterdash-daemon.log".to_string(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DaemonConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if config.collect_interval_ms == 0 {
            return Err(anyhow!("collect-interval-ms must be greater than zero"));
        }
        Ok(config)
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_millis(self.collect_interval_ms)
    }
}
