//! Repository for the append-only `webhooks.jsonl` capture log.

use std::path::PathBuf;

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::models::webhook_log::{CreateWebhookLogEntry, WebhookLogEntry, RAW_PREVIEW_CHARS};
use crate::FileStore;

/// Provides append and read operations for captured webhooks.
pub struct WebhookLogRepo;

impl WebhookLogRepo {
    /// Append one capture as a JSON line, rotating the log first if it has
    /// reached the size threshold.
    pub async fn append(
        store: &FileStore,
        input: &CreateWebhookLogEntry,
    ) -> Result<WebhookLogEntry, StoreError> {
        let _guard = store.webhooks_lock().lock().await;

        if let Err(e) = Self::rotate_if_needed(store).await {
            // A failed rotation only means the log keeps growing.
            tracing::error!(error = %e, "Failed to rotate webhook log");
        }

        let entry = WebhookLogEntry {
            received_at: Utc::now(),
            remote_ip: input.remote_ip.clone(),
            method: input.method.clone(),
            path: input.path.clone(),
            headers: input.headers.clone(),
            query: input.query.clone(),
            raw_body: input.raw_body.clone(),
            parsed: input.parsed.clone(),
            raw_preview: None,
        };

        let path = store.webhooks_path();
        let mut line = serde_json::to_vec(&entry).map_err(|e| StoreError::json(&path, e))?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(&line)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!(path = %path.display(), bytes = line.len(), "Webhook logged");
        Ok(entry)
    }

    /// Rename the log to `webhooks-YYYYMMDDHHMMSS.jsonl` when it has reached
    /// `max_webhook_log_bytes`. Returns the rotated path, if any.
    ///
    /// A second rotation within the same second gets a `-N` suffix instead
    /// of replacing the earlier file.
    pub async fn rotate_if_needed(store: &FileStore) -> Result<Option<PathBuf>, StoreError> {
        let Some(size) = Self::file_size(store).await? else {
            return Ok(None);
        };
        if size < store.config().max_webhook_log_bytes {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let rotated = Self::free_rotation_path(store, &stamp).await?;
        let path = store.webhooks_path();
        tokio::fs::rename(&path, &rotated)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        tracing::info!(rotated = %rotated.display(), size, "Rotated webhook log");
        Ok(Some(rotated))
    }

    async fn free_rotation_path(store: &FileStore, stamp: &str) -> Result<PathBuf, StoreError> {
        let mut candidate = store.data_dir().join(format!("webhooks-{stamp}.jsonl"));
        let mut suffix = 1u32;
        while tokio::fs::try_exists(&candidate)
            .await
            .map_err(|e| StoreError::io(&candidate, e))?
        {
            candidate = store
                .data_dir()
                .join(format!("webhooks-{stamp}-{suffix}.jsonl"));
            suffix += 1;
        }
        Ok(candidate)
    }

    /// All captures in the current log, oldest first.
    ///
    /// Lines that do not parse are skipped. Each entry gets a `raw_preview`.
    pub async fn list(store: &FileStore) -> Result<Vec<WebhookLogEntry>, StoreError> {
        let content = Self::read_content(store).await?;

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<WebhookLogEntry>(line) {
                Ok(mut entry) => {
                    entry.raw_preview =
                        Some(entry.raw_body.chars().take(RAW_PREVIEW_CHARS).collect());
                    Some(entry)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unparseable webhook log line");
                    None
                }
            })
            .collect())
    }

    /// The last `limit` raw lines of the log, oldest first.
    pub async fn tail_raw(store: &FileStore, limit: usize) -> Result<Vec<String>, StoreError> {
        let content = Self::read_content(store).await?;
        let lines: Vec<&str> = content.trim().lines().filter(|l| !l.is_empty()).collect();
        let skip = lines.len().saturating_sub(limit);
        Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
    }

    /// Size of the current log in bytes, or `None` when it does not exist.
    pub async fn file_size(store: &FileStore) -> Result<Option<u64>, StoreError> {
        let path = store.webhooks_path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn read_content(store: &FileStore) -> Result<String, StoreError> {
        let path = store.webhooks_path();
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}
