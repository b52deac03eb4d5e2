//! Speed derivation from a pair of line crossings.
//!
//! The two detection lines sit a fixed distance apart. The time between the
//! two crossings gives the average speed over that stretch.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::trigger::{EventSummary, LineCrossingEvent};
use crate::types::EpochMillis;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Distance between the two detection lines when none is configured.
pub const DEFAULT_LINE_DISTANCE_METERS: f64 = 10.0;

/// Metres per second to kilometres per hour.
pub const MS_TO_KMH: f64 = 3.6;

/// Readings outside `[MIN_PLAUSIBLE_KMH, MAX_PLAUSIBLE_KMH]` are flagged.
pub const MIN_PLAUSIBLE_KMH: f64 = 0.0;
pub const MAX_PLAUSIBLE_KMH: f64 = 300.0;

// ---------------------------------------------------------------------------
// SpeedReading
// ---------------------------------------------------------------------------

/// Speed measured between two line crossings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedReading {
    /// km/h, two decimals.
    pub speed_kmh: f64,
    /// m/s, two decimals.
    pub speed_ms: f64,
    /// Seconds, three decimals.
    pub time_diff_seconds: f64,
    /// Always strictly positive.
    pub time_diff_ms: EpochMillis,
    pub line_distance_meters: f64,
    pub first_event: EventSummary,
    pub second_event: EventSummary,
    /// Set when the speed falls outside the plausible range. The reading is
    /// still reported.
    #[serde(default)]
    pub out_of_range: bool,
}

/// Derive the speed of a vehicle from its two line crossings.
///
/// The events may be passed in either order; they are sorted by timestamp
/// first. Fails with [`CoreError::InvalidInterval`] when both crossings share
/// a timestamp or the gap between them does not fit in an `i64`.
pub fn derive(
    a: &LineCrossingEvent,
    b: &LineCrossingEvent,
    line_distance_meters: f64,
) -> Result<SpeedReading, CoreError> {
    let (first, second) = if b.timestamp < a.timestamp { (b, a) } else { (a, b) };

    let time_diff_ms = match second.timestamp.checked_sub(first.timestamp) {
        Some(diff) if diff > 0 => diff,
        Some(diff) => return Err(CoreError::InvalidInterval { time_diff_ms: diff }),
        None => return Err(CoreError::InvalidInterval { time_diff_ms: EpochMillis::MAX }),
    };

    let time_diff_seconds = time_diff_ms as f64 / 1000.0;
    let speed_ms = line_distance_meters / time_diff_seconds;
    let speed_kmh = speed_ms * MS_TO_KMH;

    let out_of_range = !(MIN_PLAUSIBLE_KMH..=MAX_PLAUSIBLE_KMH).contains(&speed_kmh);
    if out_of_range {
        tracing::warn!(
            speed_kmh = round_to(speed_kmh, 2),
            time_diff_ms,
            first_device = %first.device,
            second_device = %second.device,
            "Calculated speed is outside the plausible range"
        );
    }

    Ok(SpeedReading {
        speed_kmh: round_to(speed_kmh, 2),
        speed_ms: round_to(speed_ms, 2),
        time_diff_seconds: round_to(time_diff_seconds, 3),
        time_diff_ms,
        line_distance_meters,
        first_event: EventSummary::from(first),
        second_event: EventSummary::from(second),
        out_of_range,
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
