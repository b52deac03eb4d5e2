//! Line-crossing events and the alarm metadata that groups them.

use serde::{Deserialize, Serialize};

use crate::types::EpochMillis;

/// Trigger type tag of a line-crossing event. All other tags are ignored.
pub const LINE_CROSSED_KEY: &str = "line_crossed";

/// Alarm name used when a delivery carries none.
pub const UNKNOWN_ALARM_NAME: &str = "Unknown";

// ---------------------------------------------------------------------------
// LineCrossingEvent
// ---------------------------------------------------------------------------

/// One validated sensor firing: a vehicle crossed one of the two lines.
///
/// Built from a [`RawTrigger`](crate::payload::RawTrigger) only when the
/// trigger is tagged [`LINE_CROSSED_KEY`] and carries a usable timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCrossingEvent {
    pub device: String,
    pub key: String,
    pub timestamp: EpochMillis,
    /// First entry of the trigger's `zones.line` list, if any.
    pub line: Option<String>,
    pub event_id: Option<String>,
}

impl LineCrossingEvent {
    /// Identity of this exact firing: `device:eventId:timestamp`.
    ///
    /// Two deliveries of the same event produce the same key.
    pub fn trigger_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.device,
            self.event_id.as_deref().unwrap_or_default(),
            self.timestamp
        )
    }
}

// ---------------------------------------------------------------------------
// EventSummary
// ---------------------------------------------------------------------------

/// The parts of a [`LineCrossingEvent`] kept in a speed reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub device: String,
    pub line: Option<String>,
    pub timestamp: EpochMillis,
    pub event_id: Option<String>,
}

impl From<&LineCrossingEvent> for EventSummary {
    fn from(event: &LineCrossingEvent) -> Self {
        Self {
            device: event.device.clone(),
            line: event.line.clone(),
            timestamp: event.timestamp,
            event_id: event.event_id.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// AlarmContext
// ---------------------------------------------------------------------------

/// Alarm metadata accompanying a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlarmContext {
    pub name: String,
    /// Device identifiers of the alarm's sources, in delivery order.
    pub sources: Vec<String>,
}

impl AlarmContext {
    pub fn new(name: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    /// Grouping identity: `name:` followed by the sorted source devices
    /// joined with commas.
    ///
    /// Events are only ever paired when their group keys are equal. The
    /// key does not depend on the order sources were listed in.
    pub fn group_key(&self) -> String {
        let mut sources: Vec<&str> = self.sources.iter().map(String::as_str).collect();
        sources.sort_unstable();
        format!("{}:{}", self.name, sources.join(","))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn event(device: &str, event_id: Option<&str>, timestamp: EpochMillis) -> LineCrossingEvent {
        LineCrossingEvent {
            device: device.to_string(),
            key: LINE_CROSSED_KEY.to_string(),
            timestamp,
            line: Some("1".to_string()),
            event_id: event_id.map(str::to_string),
        }
    }

    #[test]
    fn trigger_key_joins_device_event_id_and_timestamp() {
        assert_eq!(event("cam-1", Some("ev-9"), 1500).trigger_key(), "cam-1:ev-9:1500");
    }

    #[test]
    fn trigger_key_with_missing_event_id_leaves_slot_empty() {
        assert_eq!(event("cam-1", None, 1500).trigger_key(), "cam-1::1500");
    }

    #[test]
    fn group_key_sorts_sources() {
        let ctx = AlarmContext::new(
            "Speed trap",
            vec!["cam-b".to_string(), "cam-a".to_string()],
        );
        assert_eq!(ctx.group_key(), "Speed trap:cam-a,cam-b");
    }

    #[test]
    fn group_key_is_independent_of_source_order() {
        let a = AlarmContext::new("A", vec!["x".into(), "y".into(), "z".into()]);
        let b = AlarmContext::new("A", vec!["z".into(), "x".into(), "y".into()]);
        assert_eq!(a.group_key(), b.group_key());
    }

    #[test]
    fn group_key_without_sources_ends_with_colon() {
        assert_eq!(AlarmContext::new("A", Vec::new()).group_key(), "A:");
    }

    #[test]
    fn summary_keeps_identity_fields() {
        let summary = EventSummary::from(&event("cam-1", Some("ev-1"), 42));
        assert_eq!(summary.device, "cam-1");
        assert_eq!(summary.line.as_deref(), Some("1"));
        assert_eq!(summary.timestamp, 42);
        assert_eq!(summary.event_id.as_deref(), Some("ev-1"));
    }
}
