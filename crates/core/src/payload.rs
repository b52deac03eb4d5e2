//! Serde model of an inbound webhook delivery.
//!
//! Camera systems post a JSON body of the shape
//!
//! ```text
//! { "alarm": {
//!     "name": "...",
//!     "sources":  [ { "device": "..." } ],
//!     "triggers": [ { "key": "line_crossed", "device": "...", "timestamp": 1700000000000,
//!                     "zones": { "line": ["1"] }, "eventId": "..." } ],
//!     "thumbnail": "data:image/jpeg;base64,..." } }
//! ```
//!
//! Every field is optional on the wire. Identifiers may arrive as strings
//! or numbers, so they are decoded as raw JSON values and normalised when
//! a [`RawTrigger`] is turned into a [`LineCrossingEvent`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::trigger::{AlarmContext, LineCrossingEvent, LINE_CROSSED_KEY, UNKNOWN_ALARM_NAME};
use crate::types::EpochMillis;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Top-level webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub alarm: Option<RawAlarm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlarm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<RawSource>>,
    #[serde(default)]
    pub triggers: Option<Vec<RawTrigger>>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub device: Option<Value>,
}

/// One trigger exactly as delivered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrigger {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub device: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub zones: Option<RawZones>,
    #[serde(default, rename = "eventId")]
    pub event_id: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawZones {
    #[serde(default)]
    pub line: Option<Vec<Value>>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

impl WebhookPayload {
    /// Decode a webhook body that has already been parsed as JSON.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        Self::deserialize(value).map_err(|e| CoreError::MalformedEvent(e.to_string()))
    }

    /// Split the payload into the alarm context and its raw triggers.
    ///
    /// Returns `None` when the body carries no `alarm` object.
    pub fn into_delivery(self) -> Option<Delivery> {
        let alarm = self.alarm?;
        let name = alarm
            .name
            .unwrap_or_else(|| UNKNOWN_ALARM_NAME.to_string());
        let sources = alarm
            .sources
            .unwrap_or_default()
            .iter()
            .map(|s| s.device.as_ref().and_then(value_as_string).unwrap_or_default())
            .collect();

        Some(Delivery {
            alarm: AlarmContext::new(name, sources),
            triggers: alarm.triggers.unwrap_or_default(),
            thumbnail: alarm.thumbnail,
        })
    }
}

impl RawTrigger {
    /// Validate this trigger as a line-crossing event.
    ///
    /// Fails with [`CoreError::MalformedEvent`] when the tag is not
    /// [`LINE_CROSSED_KEY`] or the timestamp is missing, zero, or not a
    /// number.
    pub fn line_crossing(&self) -> Result<LineCrossingEvent, CoreError> {
        let key = self.key.as_deref().unwrap_or_default();
        if key != LINE_CROSSED_KEY {
            return Err(CoreError::MalformedEvent(format!(
                "trigger key '{key}' is not {LINE_CROSSED_KEY}"
            )));
        }

        let timestamp = self
            .timestamp
            .as_ref()
            .and_then(value_as_millis)
            .filter(|ts| *ts != 0)
            .ok_or_else(|| CoreError::MalformedEvent("missing or non-numeric timestamp".into()))?;

        let line = self
            .zones
            .as_ref()
            .and_then(|z| z.line.as_ref())
            .and_then(|lines| lines.first())
            .and_then(value_as_string);

        Ok(LineCrossingEvent {
            device: self
                .device
                .as_ref()
                .and_then(value_as_string)
                .unwrap_or_default(),
            key: key.to_string(),
            timestamp,
            line,
            event_id: self.event_id.as_ref().and_then(value_as_string),
        })
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// One webhook delivery: alarm metadata plus zero or more raw triggers.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub alarm: AlarmContext,
    pub triggers: Vec<RawTrigger>,
    /// Snapshot attached by the camera, kept for the detection record.
    pub thumbnail: Option<String>,
}

impl Delivery {
    /// The triggers that qualify as line-crossing events, in delivery order.
    ///
    /// Anything else is dropped here and never reaches the pending table.
    pub fn candidates(&self) -> Vec<LineCrossingEvent> {
        self.triggers
            .iter()
            .filter_map(|raw| match raw.line_crossing() {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::debug!(alarm = %self.alarm.name, error = %e, "Skipping trigger");
                    None
                }
            })
            .collect()
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_as_millis(value: &Value) -> Option<EpochMillis> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as EpochMillis)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn delivery(body: Value) -> Delivery {
        WebhookPayload::from_json(&body)
            .expect("payload should decode")
            .into_delivery()
            .expect("payload should carry an alarm")
    }

    #[test]
    fn decodes_alarm_context_and_triggers() {
        let d = delivery(json!({
            "alarm": {
                "name": "Gate",
                "sources": [{ "device": "cam-2" }, { "device": "cam-1" }],
                "triggers": [{
                    "key": "line_crossed",
                    "device": "cam-1",
                    "timestamp": 1000,
                    "zones": { "line": ["A"] },
                    "eventId": "ev-1"
                }],
                "thumbnail": "data:image/png;base64,AAAA"
            }
        }));

        assert_eq!(d.alarm.name, "Gate");
        assert_eq!(d.alarm.sources, vec!["cam-2", "cam-1"]);
        assert_eq!(d.thumbnail.as_deref(), Some("data:image/png;base64,AAAA"));

        let events = d.candidates();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device, "cam-1");
        assert_eq!(events[0].timestamp, 1000);
        assert_eq!(events[0].line.as_deref(), Some("A"));
        assert_eq!(events[0].event_id.as_deref(), Some("ev-1"));
    }

    #[test]
    fn missing_alarm_yields_no_delivery() {
        let payload = WebhookPayload::from_json(&json!({ "hello": "world" })).unwrap();
        assert!(payload.into_delivery().is_none());
    }

    #[test]
    fn missing_name_defaults_to_unknown() {
        let d = delivery(json!({ "alarm": { "triggers": [] } }));
        assert_eq!(d.alarm.name, UNKNOWN_ALARM_NAME);
        assert!(d.alarm.sources.is_empty());
    }

    #[test]
    fn source_without_device_becomes_empty_string() {
        let d = delivery(json!({ "alarm": { "name": "A", "sources": [{}, { "device": "x" }] } }));
        assert_eq!(d.alarm.sources, vec!["", "x"]);
    }

    #[test]
    fn numeric_identifiers_are_stringified() {
        let raw: RawTrigger = serde_json::from_value(json!({
            "key": "line_crossed",
            "device": 7,
            "timestamp": 2000,
            "zones": { "line": [2] },
            "eventId": 99
        }))
        .unwrap();
        let event = raw.line_crossing().unwrap();
        assert_eq!(event.device, "7");
        assert_eq!(event.line.as_deref(), Some("2"));
        assert_eq!(event.event_id.as_deref(), Some("99"));
    }

    #[test]
    fn other_trigger_keys_are_malformed() {
        let raw: RawTrigger =
            serde_json::from_value(json!({ "key": "motion", "timestamp": 1000 })).unwrap();
        assert_matches!(raw.line_crossing(), Err(CoreError::MalformedEvent(_)));
    }

    #[test]
    fn missing_zero_or_textual_timestamps_are_malformed() {
        for ts in [Value::Null, json!(0), json!("1000")] {
            let raw: RawTrigger =
                serde_json::from_value(json!({ "key": "line_crossed", "timestamp": ts })).unwrap();
            assert_matches!(raw.line_crossing(), Err(CoreError::MalformedEvent(_)));
        }
    }

    #[test]
    fn fractional_timestamp_is_truncated() {
        let raw: RawTrigger =
            serde_json::from_value(json!({ "key": "line_crossed", "timestamp": 1500.7 })).unwrap();
        assert_eq!(raw.line_crossing().unwrap().timestamp, 1500);
    }

    #[test]
    fn trigger_without_zones_has_no_line() {
        let raw: RawTrigger =
            serde_json::from_value(json!({ "key": "line_crossed", "timestamp": 1 })).unwrap();
        assert_eq!(raw.line_crossing().unwrap().line, None);
    }

    #[test]
    fn candidates_filter_out_non_crossings() {
        let d = delivery(json!({
            "alarm": {
                "name": "A",
                "triggers": [
                    { "key": "line_crossed", "timestamp": 2000, "zones": { "line": ["1"] } },
                    { "key": "object_detected", "timestamp": 2100 },
                    { "key": "line_crossed" }
                ]
            }
        }));
        let events = d.candidates();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 2000);
    }

    #[test]
    fn wrongly_typed_alarm_is_malformed() {
        assert_matches!(
            WebhookPayload::from_json(&json!({ "alarm": "not an object" })),
            Err(CoreError::MalformedEvent(_))
        );
    }
}
