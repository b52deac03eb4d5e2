//! Periodic eviction of lone line crossings.
//!
//! A crossing whose partner never arrives would otherwise sit in the pending
//! table forever. This job sweeps records older than the match window on the
//! correlator's sweep interval.

use std::sync::Arc;

use speedtrap_core::correlation::TriggerCorrelator;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the expiry sweep loop until `cancel` is triggered.
pub async fn run(correlator: Arc<TriggerCorrelator>, cancel: CancellationToken) {
    let config = *correlator.config();
    tracing::info!(
        match_window_secs = config.match_window.as_secs(),
        interval_secs = config.sweep_interval.as_secs(),
        "Trigger expiry job started"
    );

    let mut interval = tokio::time::interval(config.sweep_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can have expired yet.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Trigger expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = correlator.sweep_expired().await;
                if evicted == 0 {
                    tracing::debug!("Trigger expiry: nothing to evict");
                }
            }
        }
    }
}
