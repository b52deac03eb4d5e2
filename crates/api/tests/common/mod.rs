use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use speedtrap_api::config::ServerConfig;
use speedtrap_api::router::build_app_router;
use speedtrap_api::state::AppState;
use speedtrap_core::correlation::TriggerCorrelator;
use speedtrap_store::StoreConfig;

/// Build a test `ServerConfig` with safe defaults, storing data under
/// `data_dir`.
pub fn test_config(data_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        body_limit_bytes: 1024 * 1024,
        data_dir: data_dir.to_path_buf(),
        static_dir: None,
        line_distance_meters: 10.0,
        match_window_secs: 30,
        sweep_interval_secs: 60,
        max_webhook_log_bytes: 1024 * 1024,
        max_detections: 1000,
    }
}

/// Build the full application router plus a handle on its state.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub async fn build_test_app(data_dir: &Path) -> (Router, AppState) {
    let config = test_config(data_dir);
    let store_config: StoreConfig = config.store_config();
    let store = speedtrap_store::open(store_config)
        .await
        .expect("test store should open");
    let correlator = Arc::new(TriggerCorrelator::new(
        config.correlator_config().expect("test config is valid"),
    ));

    let state = AppState {
        store,
        correlator,
        config: Arc::new(config.clone()),
    };
    (build_app_router(state.clone(), &config), state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "text/plain")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// A single-crossing delivery for the "Gate" alarm watched by `cam-1` and
/// `cam-2`.
pub fn crossing(device: &str, line: &str, timestamp: i64, event_id: &str) -> Value {
    serde_json::json!({
        "alarm": {
            "name": "Gate",
            "sources": [{ "device": "cam-1" }, { "device": "cam-2" }],
            "triggers": [{
                "key": "line_crossed",
                "device": device,
                "timestamp": timestamp,
                "zones": { "line": [line] },
                "eventId": event_id
            }]
        }
    })
}
