//! Summary of recorded detections, pending triggers, and captured webhooks.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use speedtrap_core::correlation::CorrelatorStats;
use speedtrap_store::models::detection::Detection;
use speedtrap_store::models::webhook_log::WebhookLogEntry;
use speedtrap_store::repositories::{DetectionRepo, WebhookLogRepo};

use crate::error::AppResult;
use crate::response::Success;
use crate::state::AppState;

/// Captures included in `webhooks.recent`.
const RECENT_WEBHOOKS: usize = 5;

#[derive(Debug, Serialize)]
pub struct DetectionSummary {
    pub total: usize,
    pub latest: Option<Detection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentWebhook {
    pub received_at: DateTime<Utc>,
    pub remote_ip: String,
    pub alarm_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookSummary {
    pub total: usize,
    pub latest: Option<DateTime<Utc>>,
    pub recent: Vec<RecentWebhook>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub detections: DetectionSummary,
    pub triggers: CorrelatorStats,
    pub webhooks: WebhookSummary,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<Success<StatsResponse>>> {
    let detections = DetectionRepo::list(&state.store, None).await?;
    let webhooks = WebhookLogRepo::list(&state.store).await?;

    let recent = webhooks
        .iter()
        .rev()
        .take(RECENT_WEBHOOKS)
        .map(|entry| RecentWebhook {
            received_at: entry.received_at,
            remote_ip: entry.remote_ip.clone(),
            alarm_name: alarm_name(entry),
        })
        .collect();

    Ok(Json(Success::new(StatsResponse {
        detections: DetectionSummary {
            total: detections.len(),
            latest: detections.into_iter().next(),
        },
        triggers: state.correlator.stats().await,
        webhooks: WebhookSummary {
            total: webhooks.len(),
            latest: webhooks.last().map(|w| w.received_at),
            recent,
        },
    })))
}

fn alarm_name(entry: &WebhookLogEntry) -> Option<String> {
    entry
        .parsed
        .as_ref()?
        .get("alarm")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}
