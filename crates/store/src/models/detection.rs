use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use speedtrap_core::speed::SpeedReading;

/// A persisted speed measurement.
///
/// The reading's fields are flattened into the record so the file reads as
/// one flat object per detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: String,
    /// When the detection was recorded (not when the vehicle passed).
    pub timestamp: DateTime<Utc>,
    pub alarm_name: String,
    /// Camera snapshot attached to the delivery, usually a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub reading: SpeedReading,
}

/// DTO for recording a new detection.
#[derive(Debug, Clone)]
pub struct CreateDetection {
    pub alarm_name: String,
    pub image: Option<String>,
    pub reading: SpeedReading,
}
