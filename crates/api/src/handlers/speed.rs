//! Stateless speed derivation from two posted triggers.
//!
//! Useful for replaying captured deliveries: the pending table is not
//! touched and nothing is recorded.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use speedtrap_core::error::CoreError;
use speedtrap_core::payload::RawTrigger;
use speedtrap_core::speed::{self, SpeedReading};

use crate::error::AppResult;
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeriveSpeedRequest {
    #[serde(default)]
    pub triggers: Vec<RawTrigger>,
}

#[derive(Debug, Serialize)]
pub struct DeriveSpeedResponse {
    pub reading: SpeedReading,
}

/// POST /api/speed/derive
///
/// Uses the line distance configured at startup. Exactly two line crossings
/// are required. Anything else is rejected as a malformed event, and
/// identical timestamps as an invalid interval.
pub async fn derive_speed(
    State(state): State<AppState>,
    Json(input): Json<DeriveSpeedRequest>,
) -> AppResult<Json<Success<DeriveSpeedResponse>>> {
    let events = input
        .triggers
        .iter()
        .map(RawTrigger::line_crossing)
        .collect::<Result<Vec<_>, _>>()?;

    let [a, b] = events.as_slice() else {
        return Err(CoreError::MalformedEvent(format!(
            "expected exactly 2 line crossings, got {}",
            events.len()
        ))
        .into());
    };

    let reading = speed::derive(a, b, state.config.line_distance_meters)?;
    Ok(Json(Success::new(DeriveSpeedResponse { reading })))
}
