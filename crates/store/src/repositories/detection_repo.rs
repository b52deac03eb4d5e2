//! Repository for `detections.json` (newest first, capped).

use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::detection::{CreateDetection, Detection};
use crate::FileStore;

/// Provides read and append operations for detections.
pub struct DetectionRepo;

impl DetectionRepo {
    /// Record a new detection at the head of the list.
    ///
    /// The list is trimmed to the store's `max_detections` and rewritten
    /// through a temporary file so a crash never leaves a half-written array.
    pub async fn insert(store: &FileStore, input: &CreateDetection) -> Result<Detection, StoreError> {
        let _guard = store.detections_lock().lock().await;

        let mut detections = Self::read_all(store).await?;
        let detection = Detection {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            alarm_name: input.alarm_name.clone(),
            image: input.image.clone(),
            reading: input.reading.clone(),
        };

        detections.insert(0, detection.clone());
        let max = store.config().max_detections;
        if detections.len() > max {
            detections.truncate(max);
            tracing::debug!(max, "Trimmed stored detections");
        }

        Self::write_all(store, &detections).await?;
        tracing::info!(
            id = %detection.id,
            speed_kmh = detection.reading.speed_kmh,
            alarm = %detection.alarm_name,
            total = detections.len(),
            "Detection recorded"
        );
        Ok(detection)
    }

    /// List detections, newest first. `limit` of `None` or `0` returns all.
    pub async fn list(store: &FileStore, limit: Option<usize>) -> Result<Vec<Detection>, StoreError> {
        let mut detections = Self::read_all(store).await?;
        if let Some(limit) = limit.filter(|l| *l > 0) {
            detections.truncate(limit);
        }
        Ok(detections)
    }

    async fn read_all(store: &FileStore) -> Result<Vec<Detection>, StoreError> {
        let path = store.detections_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::json(&path, e))
    }

    async fn write_all(store: &FileStore, detections: &[Detection]) -> Result<(), StoreError> {
        let path = store.detections_path();
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(detections).map_err(|e| StoreError::json(&path, e))?;

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }
}
