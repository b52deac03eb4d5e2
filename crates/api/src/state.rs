use std::sync::Arc;

use speedtrap_core::correlation::TriggerCorrelator;
use speedtrap_store::FileStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Webhook log and detection store.
    pub store: FileStore,
    /// Pending-trigger table, shared with the expiry task.
    pub correlator: Arc<TriggerCorrelator>,
    pub config: Arc<ServerConfig>,
}
