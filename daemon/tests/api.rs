//! Integration tests for the metrics backend HTTP surface.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use clusterdash_core::dashboard::synthetic;
use clusterdash_core::utils::models::MetricsSnapshot;
use clusterdash_daemon::daemon::router;
use clusterdash_daemon::daemon::state::BackendState;
use tower::ServiceExt; // for `oneshot`

#[tokio::test]
async fn test_health_check() {
    let app = router(BackendState::new(synthetic::baseline()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_uses_backend_key_names() {
    let app = router(BackendState::new(synthetic::baseline()));

    let response = app
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(raw.get("slurm_jobs").is_some());
    assert!(raw.get("gpu_stats").is_some());
    assert!(raw.get("system_stats").is_some());
    assert_eq!(raw["slurm_jobs"][0]["state"], "RUNNING");

    let snapshot: MetricsSnapshot = serde_json::from_slice(&body).unwrap();
    assert!(snapshot.validate().is_ok());
    assert!(snapshot.eq_ignoring_timestamp(&synthetic::baseline()));
}

#[tokio::test]
async fn test_metrics_reflects_latest_replace() {
    let state = BackendState::new(synthetic::baseline());
    let mut next = synthetic::baseline();
    next.gpus.clear();
    next.system.cpu_usage_percent = 7.5;
    state.replace(next).await;

    let response = router(state)
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let snapshot: MetricsSnapshot = serde_json::from_slice(&body).unwrap();
    assert!(snapshot.gpus.is_empty());
    assert_eq!(snapshot.system.cpu_usage_percent, 7.5);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = router(BackendState::new(synthetic::baseline()));

    let response = app
        .oneshot(Request::builder().uri("/api/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_host_state_is_unavailable_until_first_collection() {
    let state = BackendState::empty();

    let response = router(state.clone())
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(!text.contains("GPU-a1b2"), "sample data must not be served: {}", text);

    let mut collected = synthetic::baseline();
    collected.jobs.clear();
    collected.gpus.clear();
    state.replace(collected).await;

    let response = router(state)
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let snapshot: MetricsSnapshot = serde_json::from_slice(&body).unwrap();
    assert!(snapshot.jobs.is_empty());
    assert!(snapshot.gpus.is_empty());
}
