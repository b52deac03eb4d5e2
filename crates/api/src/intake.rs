//! Turns a captured webhook body into a detection.
//!
//! Runs after the raw capture has been logged: decode the payload, hand the
//! delivery to the correlator, derive a speed from any matched pair, and
//! record it. Nothing here fails the request. An undecodable body, an
//! unmatched crossing, or an unusable pair all end as "no detection yet".

use serde_json::Value;
use speedtrap_core::error::CoreError;
use speedtrap_core::payload::WebhookPayload;
use speedtrap_store::models::detection::{CreateDetection, Detection};
use speedtrap_store::repositories::DetectionRepo;

use crate::state::AppState;

/// Correlate one delivery and record a detection if it completes a pair.
pub async fn process_delivery(state: &AppState, body: &Value) -> Option<Detection> {
    let payload = match WebhookPayload::from_json(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Webhook body is not a camera delivery");
            return None;
        }
    };
    let Some(delivery) = payload.into_delivery() else {
        tracing::debug!("Webhook body has no alarm");
        return None;
    };

    // The correlator lock is released before anything below touches disk.
    let pair = state.correlator.submit(&delivery).await?;

    let reading = match pair.derive_speed(state.config.line_distance_meters) {
        Ok(reading) => reading,
        Err(e @ CoreError::InvalidInterval { .. }) => {
            tracing::warn!(
                error = %e,
                first = %pair.first.trigger_key(),
                second = %pair.second.trigger_key(),
                "Discarding matched pair"
            );
            return None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Speed derivation failed");
            return None;
        }
    };

    let input = CreateDetection {
        alarm_name: delivery.alarm.name.clone(),
        image: delivery.thumbnail.clone(),
        reading,
    };
    match DetectionRepo::insert(&state.store, &input).await {
        Ok(detection) => Some(detection),
        Err(e) => {
            tracing::error!(
                error = %e,
                speed_kmh = input.reading.speed_kmh,
                "Failed to record detection"
            );
            None
        }
    }
}
