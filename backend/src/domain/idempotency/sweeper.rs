//! Periodic deletion of expired leases.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::IdempotencyLeaseStore;
use crate::domain::ports::{LeaseRepository, LeaseRepositoryError};

/// Background task deleting leases whose expiry has passed.
///
/// Runs on a single timer, so cycles never overlap. A failed cycle is logged
/// and retried on the next tick.
pub struct ExpiredLeaseSweeper<R> {
    store: IdempotencyLeaseStore<R>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl<R> ExpiredLeaseSweeper<R>
where
    R: LeaseRepository,
{
    /// Default period between sweeps: 15 minutes.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);

    /// Create a sweeper running every `interval`.
    pub fn new(store: IdempotencyLeaseStore<R>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Period between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one sweep at the clock's current time.
    pub async fn sweep_once(&self) -> Result<u64, LeaseRepositoryError> {
        let now = self.clock.utc();
        let removed = self.store.sweep_expired(now).await?;
        if removed > 0 {
            info!(removed, cutoff = %now, "swept expired idempotency leases");
        } else {
            debug!(cutoff = %now, "no expired idempotency leases");
        }
        Ok(removed)
    }

    /// Sweep every interval until `shutdown` turns `true` or its sender is
    /// dropped. The first sweep happens one interval after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.sweep_once().await {
                        warn!(%error, "idempotency lease sweep failed; retrying next tick");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("idempotency lease sweeper stopped");
    }
}
