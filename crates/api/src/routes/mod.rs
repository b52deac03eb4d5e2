pub mod detections;
pub mod health;
pub mod speed;
pub mod stats;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /webhook                 receive a camera delivery (POST)
/// /webhooks                captured deliveries, newest first (GET)
/// /webhooks/raw            last raw JSONL lines (GET)
///
/// /detections              recorded speed detections, newest first (GET)
///
/// /speed/derive            derive a reading from two posted triggers (POST)
///
/// /stats                   detection, trigger, and webhook summary (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(webhook::router())
        .merge(detections::router())
        .nest("/speed", speed::router())
        .merge(stats::router())
}
