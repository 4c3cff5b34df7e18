use axum::{http::StatusCode, routing::get, Json, Router};
use clusterdash_core::dashboard::synthetic::{self, Jitter};
use clusterdash_core::dashboard::{ControllerSettings, Mode, RefreshController, SnapshotStore};
use clusterdash_core::source::{FetchError, HttpMetricsSource, MetricsSource};
use clusterdash_core::utils::models::MetricsSnapshot;
use std::sync::Arc;
use std::time::Duration;

/// Serves `router` on an ephemeral port and returns the metrics URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/metrics", addr)
}

fn live_snapshot() -> MetricsSnapshot {
    let mut snapshot = synthetic::baseline();
    snapshot.system.cpu_usage_percent = 3.5;
    snapshot.jobs.truncate(2);
    snapshot
}

#[tokio::test]
async fn fetch_decodes_backend_document() {
    let url = serve(Router::new().route("/api/metrics", get(|| async { Json(live_snapshot()) }))).await;
    let source = HttpMetricsSource::new(url);

    let snapshot = source.fetch().await.unwrap();
    assert!(snapshot.eq_ignoring_timestamp(&live_snapshot()));
}

#[tokio::test]
async fn fetch_accepts_legacy_integer_job_ids() {
    let body = serde_json::json!({
        "slurm_jobs": [{
            "id": 72893, "name": "train", "user": "user2", "state": "RUNNING",
            "nodes": 1, "cpus": 8, "memory": "16G", "walltime": "2-12:00:00",
            "nodelist": "gpu-node-02"
        }],
        "gpu_stats": [],
        "system_stats": {
            "cpu_usage_percent": 10.0, "memory_usage_percent": 20.0,
            "memory_total_gb": 16.0, "memory_used_gb": 3.2
        }
    });
    let url = serve(Router::new().route(
        "/api/metrics",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    ))
    .await;

    let snapshot = HttpMetricsSource::new(url).fetch().await.unwrap();
    assert_eq!(snapshot.jobs[0].id, "72893");
}

#[tokio::test]
async fn non_success_status_is_a_protocol_error() {
    let url = serve(Router::new().route(
        "/api/metrics",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    ))
    .await;

    let err = HttpMetricsSource::new(url).fetch().await.unwrap_err();
    assert_eq!(err, FetchError::Protocol { status: 503 });
}

#[tokio::test]
async fn undecodable_body_is_a_shape_error() {
    let url = serve(Router::new().route("/api/metrics", get(|| async { "<html>oops</html>" }))).await;

    let err = HttpMetricsSource::new(url).fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Shape(_)), "got {:?}", err);
}

#[tokio::test]
async fn inconsistent_gpu_memory_is_a_shape_error() {
    let url = serve(Router::new().route(
        "/api/metrics",
        get(|| async {
            let mut snapshot = live_snapshot();
            snapshot.gpus[0].memory_free += 1;
            Json(snapshot)
        }),
    ))
    .await;

    let err = HttpMetricsSource::new(url).fetch().await.unwrap_err();
    match err {
        FetchError::Shape(detail) => assert!(detail.contains("!= total")),
        other => panic!("expected shape error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source =
        HttpMetricsSource::with_timeout(format!("http://{}/api/metrics", addr), Duration::from_secs(2)).unwrap();
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn controller_commits_live_data_then_falls_back_when_backend_breaks() {
    let url = serve(Router::new()
        .route("/api/metrics", get(|| async { Json(live_snapshot()) }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR })))
    .await;
    let settings = ControllerSettings {
        interval: Duration::from_secs(5),
        jitter: Jitter::default(),
        mode: Mode::Live,
    };

    let store = SnapshotStore::new(synthetic::baseline());
    let healthy = RefreshController::new(store.clone(), Arc::new(HttpMetricsSource::new(url.clone())), settings.clone());
    healthy.tick().await;
    let view = store.view().await;
    assert!(view.error.is_none());
    assert_eq!(view.snapshot.system.cpu_usage_percent, 3.5);
    assert_eq!(view.snapshot.jobs.len(), 2);

    let broken_url = url.replace("/api/metrics", "/broken");
    let broken = RefreshController::new(store.clone(), Arc::new(HttpMetricsSource::new(broken_url)), settings);
    broken.tick().await;
    let view = store.view().await;
    assert_eq!(
        view.error.as_deref(),
        Some("live data unavailable: backend returned HTTP 500")
    );
    assert!(view.snapshot.eq_ignoring_timestamp(&synthetic::baseline()));
    assert!(!view.loading);
}
