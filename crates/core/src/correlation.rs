//! Pairing of line-crossing events that arrive in separate deliveries.
//!
//! Cameras often report the two crossings of one vehicle in two webhooks,
//! sometimes out of order and sometimes not at all. [`TriggerCorrelator`]
//! keeps every lone crossing in a pending table until a crossing of the
//! *other* line arrives for the same alarm group, or until it ages out of the
//! match window.
//!
//! Matching rule: the first pending record (in insertion order) with the
//! same group key, a different trigger key, and a different line wins. No
//! ranking by recency or timestamp distance is applied, so three vehicles
//! overlapping inside one window can be paired across vehicles.

use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::CoreError;
use crate::payload::Delivery;
use crate::speed::{self, SpeedReading};
use crate::trigger::LineCrossingEvent;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How long a lone crossing waits for its partner.
pub const DEFAULT_MATCH_WINDOW: Duration = Duration::from_secs(30);

/// How often the expiry sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Engine-level timing constants, fixed for the lifetime of a correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatorConfig {
    pub match_window: Duration,
    pub sweep_interval: Duration,
}

impl CorrelatorConfig {
    pub fn new(match_window: Duration, sweep_interval: Duration) -> Result<Self, CoreError> {
        if match_window.is_zero() {
            return Err(CoreError::Validation(
                "match window must be greater than zero".to_string(),
            ));
        }
        if sweep_interval.is_zero() {
            return Err(CoreError::Validation(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            match_window,
            sweep_interval,
        })
    }
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            match_window: DEFAULT_MATCH_WINDOW,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Table entries and results
// ---------------------------------------------------------------------------

/// A crossing waiting for its partner.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub event: LineCrossingEvent,
    pub group_key: String,
    pub trigger_key: String,
    /// When the record entered the table. Expiry is measured from here, not
    /// from the event's own timestamp.
    pub received_at: Instant,
}

/// Two crossings of one vehicle, earliest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub first: LineCrossingEvent,
    pub second: LineCrossingEvent,
}

impl MatchedPair {
    /// Order two events by timestamp. Ties keep argument order.
    pub fn ordered(a: LineCrossingEvent, b: LineCrossingEvent) -> Self {
        if b.timestamp < a.timestamp {
            Self { first: b, second: a }
        } else {
            Self { first: a, second: b }
        }
    }

    pub fn derive_speed(&self, line_distance_meters: f64) -> Result<SpeedReading, CoreError> {
        speed::derive(&self.first, &self.second, line_distance_meters)
    }
}

/// Snapshot of the pending table for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelatorStats {
    pub pending_count: usize,
    /// Pending records per group key, in first-seen order.
    pub groups: IndexMap<String, usize>,
}

// ---------------------------------------------------------------------------
// TriggerCorrelator
// ---------------------------------------------------------------------------

/// Owns the pending-trigger table.
///
/// Every read-scan-mutate sequence runs under one mutex, so concurrent
/// deliveries cannot both claim the same pending record and the sweep never
/// races a match. Nothing awaits while the lock is held.
///
/// Designed to be wrapped in `Arc` and shared between request handlers and
/// the expiry task.
pub struct TriggerCorrelator {
    config: CorrelatorConfig,
    pending: Mutex<IndexMap<String, PendingRecord>>,
}

impl TriggerCorrelator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self {
            config,
            pending: Mutex::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Process one delivery. See [`submit_at`](Self::submit_at).
    pub async fn submit(&self, delivery: &Delivery) -> Option<MatchedPair> {
        self.submit_at(delivery, Instant::now()).await
    }

    /// Process one delivery received at `now`.
    ///
    /// - Two or more line crossings in the delivery: the earliest two are
    ///   returned directly and the table is not touched.
    /// - Exactly one: matched against the table, or stored to wait.
    /// - None: nothing happens.
    pub async fn submit_at(&self, delivery: &Delivery, now: Instant) -> Option<MatchedPair> {
        let mut candidates = delivery.candidates();

        match candidates.len() {
            0 => {
                tracing::debug!(
                    alarm = %delivery.alarm.name,
                    triggers = delivery.triggers.len(),
                    "Delivery has no line crossings"
                );
                None
            }
            1 => {
                let event = candidates.pop()?;
                self.match_or_store(event, delivery.alarm.group_key(), now)
                    .await
            }
            count => {
                candidates.sort_by_key(|e| e.timestamp);
                tracing::info!(
                    alarm = %delivery.alarm.name,
                    count,
                    "Delivery contains multiple line crossings, pairing directly"
                );
                let mut earliest = candidates.into_iter();
                let first = earliest.next()?;
                let second = earliest.next()?;
                Some(MatchedPair { first, second })
            }
        }
    }

    async fn match_or_store(
        &self,
        event: LineCrossingEvent,
        group_key: String,
        now: Instant,
    ) -> Option<MatchedPair> {
        let trigger_key = event.trigger_key();
        let mut pending = self.pending.lock().await;

        // A record past the window must never match, even if the periodic
        // sweep has not reached it yet.
        evict_expired(&mut pending, now, self.config.match_window);

        let partner_key = pending
            .values()
            .filter(|r| r.group_key == group_key && r.trigger_key != trigger_key)
            .find(|r| r.event.line != event.line)
            .map(|r| r.trigger_key.clone());

        match partner_key.and_then(|key| pending.shift_remove(&key)) {
            Some(partner) => {
                tracing::info!(
                    trigger_key = %trigger_key,
                    matched_key = %partner.trigger_key,
                    group_key = %group_key,
                    remaining = pending.len(),
                    "Matched line crossings"
                );
                Some(MatchedPair::ordered(partner.event, event))
            }
            None => {
                let line = event.line.clone();
                pending.insert(
                    trigger_key.clone(),
                    PendingRecord {
                        event,
                        group_key: group_key.clone(),
                        trigger_key: trigger_key.clone(),
                        received_at: now,
                    },
                );
                tracing::info!(
                    trigger_key = %trigger_key,
                    group_key = %group_key,
                    line = line.as_deref().unwrap_or("-"),
                    pending = pending.len(),
                    "Stored line crossing, waiting for partner"
                );
                None
            }
        }
    }

    /// Evict every record older than the match window. Returns how many
    /// were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now()).await
    }

    pub async fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut pending = self.pending.lock().await;
        let evicted = evict_expired(&mut pending, now, self.config.match_window);
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = pending.len(),
                "Cleaned up unmatched line crossings"
            );
        }
        evicted
    }

    /// Read-only view of the table.
    pub async fn stats(&self) -> CorrelatorStats {
        let pending = self.pending.lock().await;
        let mut groups: IndexMap<String, usize> = IndexMap::new();
        for record in pending.values() {
            *groups.entry(record.group_key.clone()).or_default() += 1;
        }
        CorrelatorStats {
            pending_count: pending.len(),
            groups,
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn evict_expired(
    pending: &mut IndexMap<String, PendingRecord>,
    now: Instant,
    window: Duration,
) -> usize {
    let before = pending.len();
    pending.retain(|key, record| {
        let age = now.saturating_duration_since(record.received_at);
        if age > window {
            tracing::debug!(trigger_key = %key, age_secs = age.as_secs(), "Evicting unmatched line crossing");
            false
        } else {
            true
        }
    });
    before - pending.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
