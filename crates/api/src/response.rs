//! Shared response envelope for API handlers.
//!
//! Successful responses are flat JSON objects carrying `"success": true`
//! next to the payload fields. Use [`Success`] instead of ad-hoc
//! `serde_json::json!` bodies.

use serde::Serialize;

/// `{ "success": true, ...T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(Success::new(DetectionList { count, detections })))
/// ```
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}
