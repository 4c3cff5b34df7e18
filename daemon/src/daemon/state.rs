// src/daemon/state.rs

use std::sync::Arc;
use tokio::sync::RwLock;

use clusterdash_core::utils::models::MetricsSnapshot;

/// Latest collected snapshot, shared between the collector and HTTP handlers.
///
/// Empty until the first collection lands when probing a real host.
#[derive(Debug, Clone)]
pub struct BackendState {
    inner: Arc<RwLock<Option<MetricsSnapshot>>>,
}

impl BackendState {
    pub fn new(initial: MetricsSnapshot) -> Self {
        BackendState {
            inner: Arc::new(RwLock::new(Some(initial))),
        }
    }

    pub fn empty() -> Self {
        BackendState {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn snapshot(&self) -> Option<MetricsSnapshot> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, snapshot: MetricsSnapshot) {
        *self.inner.write().await = Some(snapshot);
    }
}
