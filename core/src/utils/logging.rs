// core/src/utils/logging.rs
use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs;
use std::path::Path;

/// Maps a config string onto a level filter, defaulting to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Routes the `log` facade into `log_file`, appending.
///
/// The terminal belongs to the dashboard, so nothing is echoed to stdout.
pub fn init(log_file: &str, level: LevelFilter) -> Result<()> {
    if let Some(parent) = Path::new(log_file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory: {}", parent.display())
            })?;
        }
    }

    let file = fern::log_file(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // reqwest/hyper are chatty at debug
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(file)
        .apply()
        .context("Failed to install logger")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
    }

    // The only test in this crate allowed to install the global logger.
    #[test]
    fn writes_formatted_lines_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dash.log");
        let path_str = path.to_str().unwrap();

        init(path_str, LevelFilter::Info).unwrap();
        log::info!("controller started");
        log::debug!("filtered out");
        log::logger().flush();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains(" - INFO - "));
        assert!(contents.contains("controller started"));
        assert!(!contents.contains("filtered out"));
    }
}
