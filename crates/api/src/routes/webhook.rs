//! Route definitions for webhook intake and the capture log.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// ```text
/// POST /webhook          -> receive_webhook
/// GET  /webhooks         -> list_webhooks
/// GET  /webhooks/raw     -> list_raw_webhooks
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::receive_webhook))
        .route("/webhooks", get(webhook::list_webhooks))
        .route("/webhooks/raw", get(webhook::list_raw_webhooks))
}
