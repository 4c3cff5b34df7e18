// src/cli/watch.rs
use anyhow::{Context, Result};
use clusterdash_core::dashboard::{synthetic, Mode, RefreshController, SnapshotStore};
use clusterdash_core::source::HttpMetricsSource;
use clusterdash_core::utils::config::DashboardConfig;
use clusterdash_core::utils::logging;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use structopt::StructOpt;
use tokio::sync::mpsc;
use tokio::time;
use tui::{backend::CrosstermBackend, Terminal};

use crate::cli::{load_config, render, Overrides};

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL: Duration = Duration::from_millis(200);

#[derive(StructOpt, Debug)]
pub struct WatchCommand {
    /// Optional path to config file
    #[structopt(long)]
    pub config: Option<String>,

    /// Metrics endpoint, overrides the config file
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// Refresh interval in milliseconds
    #[structopt(long)]
    pub interval_ms: Option<u64>,

    /// Start in live mode
    #[structopt(long)]
    pub live: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    ToggleMode,
    Quit,
}

fn key_action(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(KeyAction::Quit),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(KeyAction::ToggleMode),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

impl WatchCommand {
    pub fn execute(self) -> Result<()> {
        let mut config = load_config(
            self.config.as_deref(),
            Overrides {
                endpoint: self.endpoint,
                interval_ms: self.interval_ms,
            },
        )?;
        if self.live {
            config.mode = Mode::Live;
        }

        logging::init(&config.log_path, logging::parse_level(&config.log_level))
            .context("Failed to initialize logger")?;

        let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        runtime.block_on(run(config))
    }
}

/// Raw mode and the alternate screen, undone on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = terminal::disable_raw_mode();
            return Err(e).context("Failed to enter alternate screen");
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to set up terminal")?;
        Ok(TerminalGuard { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("Failed to disable raw mode: {}", e);
        }
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            error!("Failed to leave alternate screen: {}", e);
        }
        if let Err(e) = self.terminal.show_cursor() {
            error!("Failed to restore cursor: {}", e);
        }
    }
}

// crossterm's event reads block, so they live on a plain thread
fn forward_keys(key_tx: mpsc::UnboundedSender<KeyEvent>) {
    loop {
        if key_tx.is_closed() {
            break;
        }
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    if key_tx.send(key).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read terminal event: {}", e);
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                error!("Failed to poll terminal events: {}", e);
                break;
            }
        }
    }
    debug!("Input thread exiting");
}

async fn run(config: DashboardConfig) -> Result<()> {
    let source = HttpMetricsSource::with_timeout(config.endpoint.clone(), config.poll_interval())
        .context("Failed to build HTTP client")?;
    let store = SnapshotStore::new(synthetic::baseline());
    let mut controller =
        RefreshController::new(store.clone(), Arc::new(source), config.controller_settings());

    let mut guard = TerminalGuard::enter()?;
    info!("Dashboard watching {} every {} ms", config.endpoint, config.poll_interval_ms);
    controller.start();

    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let input = thread::spawn(move || forward_keys(key_tx));

    let mut redraw = time::interval(REDRAW_INTERVAL);
    let mut frame_count: usize = 0;
    let result = loop {
        let view = store.view().await;
        let mode = controller.mode();
        if let Err(e) = guard
            .terminal
            .draw(|f| render::draw(f, &view, mode, frame_count))
        {
            break Err::<(), _>(e).context("Failed to draw dashboard");
        }

        tokio::select! {
            _ = redraw.tick() => {
                frame_count = frame_count.wrapping_add(1);
            }
            key = key_rx.recv() => match key.map(|k| key_action(k.code, k.modifiers)) {
                Some(Some(KeyAction::ToggleMode)) => {
                    let mode = controller.toggle_mode().await;
                    debug!("Toggled to {} mode from keyboard", mode);
                }
                Some(Some(KeyAction::Quit)) => break Ok(()),
                Some(None) => {}
                None => {
                    debug!("Input channel closed");
                    break Ok(());
                }
            },
        }
    };

    controller.stop().await;
    controller.join().await;

    drop(key_rx);
    if input.join().is_err() {
        error!("Input thread panicked");
    }
    drop(guard);
    info!("Dashboard closed");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_dashboard_keys() {
        assert_eq!(key_action(KeyCode::Char('m'), KeyModifiers::NONE), Some(KeyAction::ToggleMode));
        assert_eq!(key_action(KeyCode::Char('q'), KeyModifiers::NONE), Some(KeyAction::Quit));
        assert_eq!(key_action(KeyCode::Esc, KeyModifiers::NONE), Some(KeyAction::Quit));
        assert_eq!(key_action(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(KeyAction::Quit));
        assert_eq!(key_action(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(key_action(KeyCode::Enter, KeyModifiers::NONE), None);
    }
}
