mod render;
mod snapshot;
mod watch;

use anyhow::{Context, Result};
use clusterdash_core::utils::config::DashboardConfig;
use std::env;

use structopt::{clap::AppSettings, StructOpt};
use self::{snapshot::SnapshotCommand, watch::WatchCommand};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "clusterdash",
    global_settings = &[AppSettings::DisableHelpSubcommand]
)]
pub enum AppCommand {
    /// Live terminal dashboard
    #[structopt(name = "watch")]
    Watch(WatchCommand),

    /// Print a single snapshot and exit
    #[structopt(name = "snapshot")]
    Snapshot(SnapshotCommand),
}

impl AppCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            AppCommand::Watch(cmd) => cmd.execute(),
            AppCommand::Snapshot(cmd) => cmd.execute(),
        }
    }
}

/// Flags that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    endpoint: Option<String>,
    interval_ms: Option<u64>,
}

impl Overrides {
    fn apply(self, mut config: DashboardConfig) -> Result<DashboardConfig> {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

// Explicit --config, else clusterdash.json in the working directory, else defaults
fn load_config(config_override: Option<&str>, overrides: Overrides) -> Result<DashboardConfig> {
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let config = DashboardConfig::discover(config_override, &current_dir)?;
    overrides.apply(config)
}
