use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of characters of the raw body echoed back as `rawPreview`.
pub const RAW_PREVIEW_CHARS: usize = 200;

/// One captured webhook request, as stored in the JSONL log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLogEntry {
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub remote_ip: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub raw_body: String,
    /// The body parsed as JSON, or `null` when it was not JSON.
    #[serde(default)]
    pub parsed: Option<Value>,
    /// First [`RAW_PREVIEW_CHARS`] characters of `raw_body`. Filled on read,
    /// never written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_preview: Option<String>,
}

/// DTO for appending a webhook capture.
#[derive(Debug, Clone, Default)]
pub struct CreateWebhookLogEntry {
    pub remote_ip: String,
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub raw_body: String,
    pub parsed: Option<Value>,
}
