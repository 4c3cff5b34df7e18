// core/src/dashboard/controller.rs
//! Decides every tick whether to pull live telemetry or synthesize it, and
//! writes the outcome into the [`SnapshotStore`].

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::dashboard::store::SnapshotStore;
use crate::dashboard::synthetic::{self, Jitter};
use crate::source::{FetchError, MetricsSource};
use crate::utils::models::MetricsSnapshot;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Live,
    #[default]
    Synthetic,
}

impl Mode {
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Live => Mode::Synthetic,
            Mode::Synthetic => Mode::Live,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => f.write_str("live"),
            Mode::Synthetic => f.write_str("synthetic"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControllerSettings {
    pub interval: Duration,
    pub jitter: Jitter,
    pub mode: Mode,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            interval: DEFAULT_INTERVAL,
            jitter: Jitter::default(),
            mode: Mode::Synthetic,
        }
    }
}

/// What one tick needs; shared between the controller handle and its task.
struct TickContext {
    store: SnapshotStore,
    source: Arc<dyn MetricsSource>,
    baseline: MetricsSnapshot,
    jitter: Jitter,
    interval: Duration,
    mode_rx: watch::Receiver<Mode>,
}

impl TickContext {
    async fn tick(&self) {
        let epoch = self.store.epoch().await;
        let mode = *self.mode_rx.borrow();
        self.store.set_loading(true).await;

        let (mut snapshot, error) = match mode {
            Mode::Live => match self.fetch_bounded().await {
                Ok(snapshot) => (snapshot, None),
                Err(e) => {
                    warn!("Live fetch failed, falling back to synthetic baseline: {}", e);
                    (self.baseline.clone(), Some(e.user_message()))
                }
            },
            Mode::Synthetic => (self.synthesize(), None),
        };
        snapshot.normalize_hot();
        snapshot.timestamp = Utc::now();

        if self.store.commit(epoch, snapshot, error).await {
            debug!("Committed {} snapshot (epoch {})", mode, epoch);
        } else {
            debug!("Discarded stale {} result from epoch {}", mode, epoch);
        }
        self.store.set_loading(false).await;
    }

    // The dropped tick's epoch is already stale, so only the flag needs undoing.
    async fn abandon_tick(&self) {
        debug!("Abandoning in-flight tick");
        self.store.set_loading(false).await;
    }

    // Kept synchronous so the thread-local RNG never lives across an await.
    fn synthesize(&self) -> MetricsSnapshot {
        synthetic::synthesize(&self.baseline, self.jitter, &mut rand::thread_rng())
    }

    // A fetch may never outlive one interval, so ticks cannot pile up.
    async fn fetch_bounded(&self) -> Result<MetricsSnapshot, FetchError> {
        match time::timeout(self.interval, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::timed_out(self.interval.as_millis())),
        }
    }
}

/// Owns the refresh loop and its lifecycle.
///
/// Mode changes bump the store epoch (so an in-flight fetch from the old mode
/// is dropped), tick immediately and restart the interval from that point.
pub struct RefreshController {
    ctx: Arc<TickContext>,
    mode_tx: watch::Sender<Mode>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshController {
    pub fn new(
        store: SnapshotStore,
        source: Arc<dyn MetricsSource>,
        settings: ControllerSettings,
    ) -> Self {
        Self::with_baseline(store, source, settings, synthetic::baseline())
    }

    pub fn with_baseline(
        store: SnapshotStore,
        source: Arc<dyn MetricsSource>,
        settings: ControllerSettings,
        baseline: MetricsSnapshot,
    ) -> Self {
        let (mode_tx, mode_rx) = watch::channel(settings.mode);
        let ctx = TickContext {
            store,
            source,
            baseline,
            jitter: settings.jitter,
            interval: settings.interval,
            mode_rx,
        };
        RefreshController {
            ctx: Arc::new(ctx),
            mode_tx,
            shutdown_tx: None,
            handle: None,
        }
    }

    pub fn mode(&self) -> Mode {
        *self.mode_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Switches mode. Returns false if `mode` was already active.
    pub async fn set_mode(&self, mode: Mode) -> bool {
        if self.mode() == mode {
            return false;
        }
        self.ctx.store.advance_epoch().await;
        self.mode_tx.send_replace(mode);
        info!("Refresh mode set to {}", mode);
        true
    }

    pub async fn toggle_mode(&self) -> Mode {
        let next = self.mode().toggled();
        self.set_mode(next).await;
        next
    }

    /// Runs a single tick in the current mode, outside the timer.
    pub async fn tick(&self) {
        self.ctx.tick().await;
    }

    /// Spawns the refresh loop: one tick now, then one per interval.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Refresh controller already running, ignoring start");
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mode_rx = self.mode_tx.subscribe();
        self.handle = Some(tokio::spawn(run_refresh_loop(
            self.ctx.clone(),
            mode_rx,
            shutdown_rx,
        )));
        self.shutdown_tx = Some(shutdown_tx);
        info!(
            "Refresh controller started in {} mode, interval {} ms",
            self.mode(),
            self.ctx.interval.as_millis()
        );
    }

    /// Cancels the timer. A fetch already in flight finishes but is not committed.
    pub async fn stop(&mut self) {
        self.ctx.store.advance_epoch().await;
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            if shutdown_tx.send(true).is_err() {
                debug!("Refresh loop already gone when stop was requested");
            }
            info!("Refresh controller stopping");
        }
    }

    /// Waits for the refresh task to exit after `stop`.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Refresh task ended abnormally: {}", e);
            }
        }
    }
}

async fn run_refresh_loop(
    ctx: Arc<TickContext>,
    mut mode_rx: watch::Receiver<Mode>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            changed = mode_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let mode = *mode_rx.borrow_and_update();
                debug!("Mode changed to {}, resyncing timer", mode);
                ticker.reset_immediately();
            }
            _ = ticker.tick() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                // A pending fetch must not delay a mode switch or a stop.
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        ctx.abandon_tick().await;
                        break;
                    }
                    changed = mode_rx.changed() => {
                        ctx.abandon_tick().await;
                        if changed.is_err() {
                            break;
                        }
                        let mode = *mode_rx.borrow_and_update();
                        debug!("Mode changed to {} mid-tick, resyncing timer", mode);
                        ticker.reset_immediately();
                    }
                    _ = ctx.tick() => {}
                }
            }
        }
    }
    info!("Refresh loop exited");
}
