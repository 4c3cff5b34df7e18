// core/src/dashboard/store.rs
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::utils::models::MetricsSnapshot;

/// Shared handle to the latest metrics. Cloning is cheap; all clones see the same state.
///
/// Snapshots are held behind an `Arc` and swapped whole, so a reader either
/// gets the previous snapshot or the next one, never a mix.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<InnerStore>>,
}

#[derive(Debug)]
struct InnerStore {
    snapshot: Arc<MetricsSnapshot>,
    loading: bool,
    error: Option<String>,
    // Writers that captured an older epoch must not commit.
    epoch: u64,
}

/// A coherent read of everything the presentation layer needs.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub snapshot: Arc<MetricsSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SnapshotStore {
    pub fn new(seed: MetricsSnapshot) -> Self {
        SnapshotStore {
            inner: Arc::new(RwLock::new(InnerStore {
                snapshot: Arc::new(seed),
                loading: false,
                error: None,
                epoch: 0,
            })),
        }
    }

    pub async fn current(&self) -> Arc<MetricsSnapshot> {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn view(&self) -> DashboardView {
        let state = self.inner.read().await;
        DashboardView {
            snapshot: state.snapshot.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub async fn set_snapshot(&self, snapshot: MetricsSnapshot) {
        self.inner.write().await.snapshot = Arc::new(snapshot);
    }

    pub async fn set_loading(&self, loading: bool) {
        self.inner.write().await.loading = loading;
    }

    pub async fn set_error(&self, error: Option<String>) {
        self.inner.write().await.error = error;
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.read().await.error.clone()
    }

    // --- Epoch (stale-write guard) ---

    pub async fn epoch(&self) -> u64 {
        self.inner.read().await.epoch
    }

    /// Invalidates every writer that captured an earlier epoch.
    pub async fn advance_epoch(&self) -> u64 {
        let mut state = self.inner.write().await;
        state.epoch += 1;
        state.epoch
    }

    /// Writes snapshot and error together, but only if `epoch` is still current.
    /// Returns whether the write happened.
    pub async fn commit(&self, epoch: u64, snapshot: MetricsSnapshot, error: Option<String>) -> bool {
        let mut state = self.inner.write().await;
        if state.epoch != epoch {
            return false;
        }
        state.snapshot = Arc::new(snapshot);
        state.error = error;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::synthetic::baseline;

    #[tokio::test]
    async fn set_snapshot_replaces_wholesale() {
        let store = SnapshotStore::new(baseline());
        let before = store.current().await;

        let mut next = baseline();
        next.jobs.clear();
        next.system.cpu_usage_percent = 3.0;
        store.set_snapshot(next).await;

        let after = store.current().await;
        assert!(after.jobs.is_empty());
        assert_eq!(after.system.cpu_usage_percent, 3.0);
        // earlier handles are untouched
        assert_eq!(before.jobs.len(), 4);
    }

    #[tokio::test]
    async fn flags_are_independent_of_snapshot() {
        let store = SnapshotStore::new(baseline());
        store.set_loading(true).await;
        store.set_error(Some("boom".to_string())).await;

        let view = store.view().await;
        assert!(view.loading);
        assert_eq!(view.error.as_deref(), Some("boom"));
        assert_eq!(view.snapshot.jobs.len(), 4);

        store.set_error(None).await;
        store.set_loading(false).await;
        assert!(!store.is_loading().await);
        assert!(store.error().await.is_none());
    }

    #[tokio::test]
    async fn commit_with_stale_epoch_is_discarded() {
        let store = SnapshotStore::new(baseline());
        let epoch = store.epoch().await;
        store.advance_epoch().await;

        let mut next = baseline();
        next.system.cpu_usage_percent = 99.0;
        assert!(!store.commit(epoch, next.clone(), Some("late".into())).await);
        assert_eq!(store.current().await.system.cpu_usage_percent, 45.2);
        assert!(store.error().await.is_none());

        let fresh = store.epoch().await;
        assert!(store.commit(fresh, next, None).await);
        assert_eq!(store.current().await.system.cpu_usage_percent, 99.0);
    }
}
