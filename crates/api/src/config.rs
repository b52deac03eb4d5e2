use std::path::PathBuf;
use std::time::Duration;

use speedtrap_core::correlation::CorrelatorConfig;
use speedtrap_core::error::CoreError;
use speedtrap_core::speed::DEFAULT_LINE_DISTANCE_METERS;
use speedtrap_store::{StoreConfig, DEFAULT_MAX_DETECTIONS, DEFAULT_MAX_WEBHOOK_LOG_BYTES};

/// Server configuration loaded from environment variables.
///
/// All values are read once at startup and never change afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins from comma-separated `CORS_ORIGINS`. `*` allows any.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Largest accepted webhook body (default: 50 MiB).
    pub body_limit_bytes: usize,
    /// Directory holding `webhooks.jsonl` and `detections.json`.
    pub data_dir: PathBuf,
    /// Dashboard assets served for unknown paths, if set.
    pub static_dir: Option<PathBuf>,
    /// Distance between the two detection lines (default: `10`).
    pub line_distance_meters: f64,
    /// Seconds a lone crossing waits for its partner (default: `30`).
    pub match_window_secs: u64,
    /// Seconds between expiry sweeps (default: `60`).
    pub sweep_interval_secs: u64,
    pub max_webhook_log_bytes: u64,
    pub max_detections: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default        |
    /// |-------------------------|----------------|
    /// | `HOST`                  | `0.0.0.0`      |
    /// | `PORT`                  | `3001`         |
    /// | `CORS_ORIGINS`          | `*`            |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`           |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`           |
    /// | `BODY_LIMIT_BYTES`      | `52428800`     |
    /// | `DATA_DIR`              | `data`         |
    /// | `STATIC_DIR`            | unset          |
    /// | `LINE_DISTANCE_METERS`  | `10`           |
    /// | `MATCH_WINDOW_SECS`     | `30`           |
    /// | `SWEEP_INTERVAL_SECS`   | `60`           |
    /// | `MAX_WEBHOOK_LOG_BYTES` | `52428800`     |
    /// | `MAX_DETECTIONS`        | `1000`         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", 30u64);
        let shutdown_timeout_secs = env_parse("SHUTDOWN_TIMEOUT_SECS", 30u64);
        let body_limit_bytes = env_parse("BODY_LIMIT_BYTES", 50 * 1024 * 1024usize);

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            body_limit_bytes,
            data_dir,
            static_dir,
            line_distance_meters: env_parse("LINE_DISTANCE_METERS", DEFAULT_LINE_DISTANCE_METERS),
            match_window_secs: env_parse("MATCH_WINDOW_SECS", 30u64),
            sweep_interval_secs: env_parse("SWEEP_INTERVAL_SECS", 60u64),
            max_webhook_log_bytes: env_parse("MAX_WEBHOOK_LOG_BYTES", DEFAULT_MAX_WEBHOOK_LOG_BYTES),
            max_detections: env_parse("MAX_DETECTIONS", DEFAULT_MAX_DETECTIONS),
        }
    }

    /// Timing constants for the trigger correlator.
    pub fn correlator_config(&self) -> Result<CorrelatorConfig, CoreError> {
        CorrelatorConfig::new(
            Duration::from_secs(self.match_window_secs),
            Duration::from_secs(self.sweep_interval_secs),
        )
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            max_webhook_log_bytes: self.max_webhook_log_bytes,
            max_detections: self.max_detections,
        }
    }

    /// Reject values that would make every reading meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.line_distance_meters.is_finite() || self.line_distance_meters <= 0.0 {
            return Err(CoreError::Validation(format!(
                "LINE_DISTANCE_METERS must be a positive number, got {}",
                self.line_distance_meters
            )));
        }
        if self.max_detections == 0 {
            return Err(CoreError::Validation(
                "MAX_DETECTIONS must be at least 1".to_string(),
            ));
        }
        self.correlator_config().map(|_| ())
    }
}

/// Parse an env var, falling back to `default` when unset.
///
/// Panics on an unparseable value so misconfiguration fails at startup.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
