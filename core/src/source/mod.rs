// core/src/source/mod.rs
pub mod error;

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::utils::models::MetricsSnapshot;
pub use error::FetchError;

/// The external fetch capability: one parameterless request for a full snapshot.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self) -> Result<MetricsSnapshot, FetchError>;
}

/// Pulls snapshots from a metrics backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMetricsSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Same as `new`, with a transport-level request timeout.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch(&self) -> Result<MetricsSnapshot, FetchError> {
        debug!("Fetching metrics from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Protocol {
                status: status.as_u16(),
            });
        }

        // Read the body first so decode errors are not reported as transport errors.
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let snapshot: MetricsSnapshot =
            serde_json::from_slice(&body).map_err(|e| FetchError::Shape(e.to_string()))?;
        snapshot
            .validate()
            .map_err(|e| FetchError::Shape(e.to_string()))?;

        debug!(
            "Fetched {} jobs and {} GPUs from {}",
            snapshot.jobs.len(),
            snapshot.gpus.len(),
            self.endpoint
        );
        Ok(snapshot)
    }
}
