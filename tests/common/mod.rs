//! Local HTTP target shared by the integration tests

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use stampede_config::{HttpMethod, RequestSpec, Scenario, TestConfiguration, ThinkTime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Requests served per route
#[derive(Debug, Default)]
pub struct Hits {
    pub health: AtomicU64,
    pub items: AtomicU64,
    pub fail: AtomicU64,
    pub slow: AtomicU64,
}

impl Hits {
    pub fn total(&self) -> u64 {
        self.health.load(Ordering::SeqCst)
            + self.items.load(Ordering::SeqCst)
            + self.fail.load(Ordering::SeqCst)
            + self.slow.load(Ordering::SeqCst)
    }
}

async fn health(State(hits): State<Arc<Hits>>) -> Json<Value> {
    hits.health.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "status": "ok" }))
}

async fn items(State(hits): State<Arc<Hits>>) -> Json<Value> {
    hits.items.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "items": [1, 2, 3] }))
}

async fn fail(State(hits): State<Arc<Hits>>) -> (StatusCode, &'static str) {
    hits.fail.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow(State(hits): State<Arc<Hits>>) -> &'static str {
    hits.slow.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(300)).await;
    "done"
}

/// Serve the target on an ephemeral port and return its base URL
pub async fn spawn_target() -> (String, Arc<Hits>) {
    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/items", get(items))
        .route("/api/fail", get(fail))
        .route("/api/slow", get(slow))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), hits)
}

/// A short test against `path` with quick think times
pub fn quick_test(base_url: &str, path: &str, duration_secs: u64) -> TestConfiguration {
    TestConfiguration {
        base_url: base_url.to_string(),
        scenarios: vec![Scenario::new(
            "browse",
            vec![RequestSpec::new(HttpMethod::Get, path).with_name("request")],
        )],
        concurrency: 10,
        duration: Duration::from_secs(duration_secs),
        ramp_up: Duration::from_secs(1),
        worker_count: 1,
        timeout: Duration::from_secs(5),
        think_time: ThinkTime {
            min: Duration::from_millis(10),
            max: Duration::from_millis(50),
        },
        ..TestConfiguration::default()
    }
}
