// src/main.rs
use anyhow::{Context, Result};
use clusterdash_core::utils::logging;
use clusterdash_daemon::config::DaemonConfig;
use clusterdash_daemon::daemon;
use std::env;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    // Expect config path as the first argument
    if args.len() < 2 {
        // Logger is not up yet
        eprintln!("Usage: clusterdash-daemon <config_path>");
        return Err(anyhow::anyhow!("Usage: clusterdash-daemon <config_path>"));
    }
    let config_path = &args[1];

    let config = DaemonConfig::load(Path::new(config_path))?;

    logging::init(&config.log_path, logging::parse_level(&config.log_level))
        .context("Failed to initialize logger")?;

    daemon::start(&config).await
}
