//! Handlers for webhook intake and the capture log.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use speedtrap_core::correlation::CorrelatorStats;
use speedtrap_store::models::detection::Detection;
use speedtrap_store::models::webhook_log::{CreateWebhookLogEntry, WebhookLogEntry};
use speedtrap_store::repositories::WebhookLogRepo;

use crate::error::{AppError, AppResult};
use crate::intake;
use crate::query::LimitParams;
use crate::response::Success;
use crate::state::AppState;

/// Default number of lines returned by `/webhooks/raw`.
const DEFAULT_RAW_LINES: usize = 100;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// The detection completed by this delivery, if any.
    pub detection: Option<Detection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookList {
    pub count: usize,
    pub file_path: String,
    pub size_bytes: Option<u64>,
    pub trigger_stats: CorrelatorStats,
    pub webhooks: Vec<WebhookLogEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWebhookLines {
    pub file_path: String,
    pub lines: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/webhook
///
/// Capture the request verbatim, then feed it to the correlator. Only a
/// failure to capture is an error; everything after is best effort.
pub async fn receive_webhook(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<Success<WebhookAck>>> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, state.config.body_limit_bytes)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {e}")))?;

    let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();
    let capture = CreateWebhookLogEntry {
        remote_ip: remote_ip(&parts),
        method: parts.method.to_string(),
        path: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string()),
        headers: header_map(&parts.headers),
        query: Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default(),
        raw_body: String::from_utf8_lossy(&bytes).into_owned(),
        parsed,
    };

    WebhookLogRepo::append(&state.store, &capture).await?;
    tracing::info!(
        remote_ip = %capture.remote_ip,
        bytes = bytes.len(),
        json = capture.parsed.is_some(),
        "Webhook captured"
    );

    let detection = match capture.parsed.as_ref() {
        Some(body) => intake::process_delivery(&state, body).await,
        None => None,
    };

    Ok(Json(Success::new(WebhookAck { detection })))
}

/// GET /api/webhooks?limit=N
///
/// Captured deliveries, newest first, plus the correlator's pending stats.
pub async fn list_webhooks(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<Success<WebhookList>>> {
    let mut webhooks = WebhookLogRepo::list(&state.store).await?;
    webhooks.reverse();
    if let Some(limit) = params.limit() {
        webhooks.truncate(limit);
    }

    let size_bytes = WebhookLogRepo::file_size(&state.store).await.ok().flatten();

    Ok(Json(Success::new(WebhookList {
        count: webhooks.len(),
        file_path: state.store.webhooks_path().display().to_string(),
        size_bytes,
        trigger_stats: state.correlator.stats().await,
        webhooks,
    })))
}

/// GET /api/webhooks/raw?limit=N
///
/// The last N lines of the JSONL log as stored (default 100).
pub async fn list_raw_webhooks(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<Success<RawWebhookLines>>> {
    let lines =
        WebhookLogRepo::tail_raw(&state.store, params.limit_or(DEFAULT_RAW_LINES)).await?;
    Ok(Json(Success::new(RawWebhookLines {
        file_path: state.store.webhooks_path().display().to_string(),
        lines,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Client address: first `X-Forwarded-For` hop when behind a proxy, else the
/// socket peer, else `unknown`.
fn remote_ip(parts: &Parts) -> String {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Header values that are not valid UTF-8 are stored lossily.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
