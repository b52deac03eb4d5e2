use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speedtrap_api::background;
use speedtrap_api::config::ServerConfig;
use speedtrap_api::router::build_app_router;
use speedtrap_api::state::AppState;
use speedtrap_core::correlation::TriggerCorrelator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "speedtrap_api=debug,speedtrap_core=debug,speedtrap_store=debug,tower_http=debug".into()
    });
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    config.validate().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_dir = %config.data_dir.display(),
        line_distance_meters = config.line_distance_meters,
        match_window_secs = config.match_window_secs,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = speedtrap_store::open(config.store_config())
        .await
        .expect("Failed to open data directory");
    speedtrap_store::health_check(&store)
        .await
        .expect("Data directory health check failed");
    tracing::info!(path = %store.data_dir().display(), "Data directory ready");

    // --- Trigger correlator ---
    let correlator = Arc::new(TriggerCorrelator::new(
        config
            .correlator_config()
            .expect("Invalid correlator configuration"),
    ));

    // Spawn the expiry sweep for unmatched crossings.
    let expiry_cancel = CancellationToken::new();
    let expiry_handle = tokio::spawn(background::trigger_expiry::run(
        Arc::clone(&correlator),
        expiry_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        store,
        correlator: Arc::clone(&correlator),
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    expiry_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(shutdown_timeout, expiry_handle).await.is_err() {
        tracing::warn!("Trigger expiry job did not stop in time");
    }

    let unmatched = correlator.pending_count().await;
    if unmatched > 0 {
        tracing::info!(unmatched, "Discarding unmatched line crossings");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
