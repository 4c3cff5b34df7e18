use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use clusterdash_core::utils::models::MetricsSnapshot;

use crate::daemon::state::BackendState;

/// Handles `GET /api/metrics`: the latest collected snapshot, or 503 before the first one.
pub async fn handle_metrics(
    State(state): State<BackendState>,
) -> Result<Json<MetricsSnapshot>, (StatusCode, &'static str)> {
    match state.snapshot().await {
        Some(snapshot) => {
            log::debug!(
                "Serving snapshot with {} jobs and {} GPUs",
                snapshot.jobs.len(),
                snapshot.gpus.len()
            );
            Ok(Json(snapshot))
        }
        None => {
            log::debug!("Metrics requested before the first collection");
            Err((StatusCode::SERVICE_UNAVAILABLE, "no metrics collected yet"))
        }
    }
}

/// Handles `GET /health`.
pub async fn handle_health() -> &'static str {
    "ok"
}
