//! File-backed persistence for webhook captures and speed detections.
//!
//! Everything lives in one data directory:
//!
//! - `webhooks.jsonl`: one JSON object per received webhook, append-only,
//!   rotated to `webhooks-YYYYMMDDHHMMSS.jsonl` once it grows past a size
//!   threshold.
//! - `detections.json`: a JSON array of detections, newest first, capped.
//!
//! [`FileStore`] plays the role a connection pool would: a cheap cloneable
//! handle passed as the first argument to the repositories in
//! [`repositories`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;

pub const DETECTIONS_FILE: &str = "detections.json";
pub const WEBHOOKS_FILE: &str = "webhooks.jsonl";

/// Rotate the webhook log once it reaches 50 MiB.
pub const DEFAULT_MAX_WEBHOOK_LOG_BYTES: u64 = 50 * 1024 * 1024;

/// Keep at most this many detections on disk.
pub const DEFAULT_MAX_DETECTIONS: usize = 1000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub max_webhook_log_bytes: u64,
    pub max_detections: usize,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_webhook_log_bytes: DEFAULT_MAX_WEBHOOK_LOG_BYTES,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// Shared handle to the data directory.
///
/// Writers to each file are serialized through their own mutex so that
/// concurrent read-modify-write cycles on `detections.json` cannot lose
/// records.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    detections_lock: Mutex<()>,
    webhooks_lock: Mutex<()>,
}

impl FileStore {
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.config.data_dir
    }

    pub fn detections_path(&self) -> PathBuf {
        self.data_dir().join(DETECTIONS_FILE)
    }

    pub fn webhooks_path(&self) -> PathBuf {
        self.data_dir().join(WEBHOOKS_FILE)
    }

    pub(crate) fn detections_lock(&self) -> &Mutex<()> {
        &self.inner.detections_lock
    }

    pub(crate) fn webhooks_lock(&self) -> &Mutex<()> {
        &self.inner.webhooks_lock
    }
}

/// Open the store, creating the data directory if needed.
pub async fn open(config: StoreConfig) -> Result<FileStore, StoreError> {
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .map_err(|e| StoreError::io(&config.data_dir, e))?;

    Ok(FileStore {
        inner: Arc::new(Inner {
            config,
            detections_lock: Mutex::new(()),
            webhooks_lock: Mutex::new(()),
        }),
    })
}

/// Verify that the data directory still exists and is a directory.
pub async fn health_check(store: &FileStore) -> Result<(), StoreError> {
    let dir = store.data_dir();
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))?;
    if !meta.is_dir() {
        return Err(StoreError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::Other, "data dir is not a directory"),
        ));
    }
    Ok(())
}
