//! The idempotency lease protocol.
//!
//! [`IdempotencyLeaseStore`] decides, for an `(operation, key, payload hash)`
//! triple, whether the caller is the first attempt, is racing an in-flight
//! attempt, is retrying a completed attempt, or reused the key with a
//! different payload. It holds no locks of its own: every decision rests on
//! the atomic primitives of a [`LeaseRepository`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::lease::elapsed_since;
use super::{
    AcquireOutcome, AcquisitionPath, IdempotencyConfig, IdempotencyLease, LeaseClaim, LeaseScope,
    LeaseState, RecordedResponse,
};
use crate::domain::ports::{LeaseRepository, LeaseRepositoryError};

/// Floor for every `retry_after` handed to callers.
pub const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Delay suggested after losing a stale-lease takeover race.
pub const LOST_TAKEOVER_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Delay suggested after losing a failed-lease reclaim race.
pub const FAILED_RECLAIM_RETRY_AFTER: Duration = Duration::from_secs(3);

/// Delay suggested when the row vanished between insert and read.
pub const VANISHED_LEASE_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Lease protocol over a storage adapter.
///
/// Cheap to clone; clones share the repository.
pub struct IdempotencyLeaseStore<R> {
    repository: Arc<R>,
    config: IdempotencyConfig,
}

impl<R> Clone for IdempotencyLeaseStore<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: self.config,
        }
    }
}

impl<R> IdempotencyLeaseStore<R>
where
    R: LeaseRepository,
{
    /// Create a store over `repository` using `config` timings.
    pub fn new(repository: Arc<R>, config: IdempotencyConfig) -> Self {
        Self { repository, config }
    }

    /// Timing configuration in effect.
    pub fn config(&self) -> &IdempotencyConfig {
        &self.config
    }

    /// Try to become the attempt that performs the effect for `scope`.
    ///
    /// Contention and lost races are reported as
    /// [`AcquireOutcome::ExistsProcessing`]; only storage failures are errors.
    pub async fn acquire(
        &self,
        scope: &LeaseScope,
        now: DateTime<Utc>,
    ) -> Result<AcquireOutcome, LeaseRepositoryError> {
        let claim = LeaseClaim::new(scope.clone(), now, self.config.ttl());
        if self.repository.insert_processing(&claim).await? {
            return Ok(AcquireOutcome::FirstProcessing(AcquisitionPath::Fresh));
        }

        let Some(existing) = self.repository.find(scope.operation, &scope.key).await? else {
            debug!(
                operation = %scope.operation,
                key = %scope.key,
                "lease vanished between insert and read"
            );
            return Ok(AcquireOutcome::ExistsProcessing {
                retry_after: VANISHED_LEASE_RETRY_AFTER,
            });
        };

        if existing.payload_hash != scope.payload_hash {
            return Ok(AcquireOutcome::ConflictDifferentPayload(existing));
        }

        let observed_updated_at = existing.updated_at;
        match existing.state {
            LeaseState::Succeeded(response) => Ok(AcquireOutcome::ExistsSucceeded {
                response,
                recorded_at: observed_updated_at,
            }),
            LeaseState::Processing => self.resolve_processing(&claim, observed_updated_at).await,
            LeaseState::Failed => self.reclaim_failed(&claim).await,
        }
    }

    async fn resolve_processing(
        &self,
        claim: &LeaseClaim,
        observed_updated_at: DateTime<Utc>,
    ) -> Result<AcquireOutcome, LeaseRepositoryError> {
        let timeout = self.config.processing_timeout();
        let age = elapsed_since(observed_updated_at, claim.now);
        if age <= timeout {
            return Ok(AcquireOutcome::ExistsProcessing {
                retry_after: timeout.saturating_sub(age).max(MIN_RETRY_AFTER),
            });
        }

        if self
            .repository
            .take_over_stale(claim, observed_updated_at)
            .await?
        {
            info!(
                operation = %claim.scope.operation,
                key = %claim.scope.key,
                stale_for_secs = age.as_secs(),
                "took over stale lease"
            );
            return Ok(AcquireOutcome::FirstProcessing(
                AcquisitionPath::TookOverStale,
            ));
        }

        debug!(
            operation = %claim.scope.operation,
            key = %claim.scope.key,
            "lost stale lease takeover race"
        );
        Ok(AcquireOutcome::ExistsProcessing {
            retry_after: LOST_TAKEOVER_RETRY_AFTER,
        })
    }

    async fn reclaim_failed(
        &self,
        claim: &LeaseClaim,
    ) -> Result<AcquireOutcome, LeaseRepositoryError> {
        if self.repository.reclaim_failed(claim).await? {
            info!(
                operation = %claim.scope.operation,
                key = %claim.scope.key,
                "reclaimed failed lease"
            );
            return Ok(AcquireOutcome::FirstProcessing(
                AcquisitionPath::ReclaimedFailed,
            ));
        }

        debug!(
            operation = %claim.scope.operation,
            key = %claim.scope.key,
            "lost failed lease reclaim race"
        );
        Ok(AcquireOutcome::ExistsProcessing {
            retry_after: FAILED_RECLAIM_RETRY_AFTER,
        })
    }

    /// Record a successful effect for `scope`.
    ///
    /// Only a `Processing` lease is updated. A holder whose lease was taken
    /// over and already settled leaves the recorded response untouched.
    pub async fn commit_succeeded(
        &self,
        scope: &LeaseScope,
        response: &RecordedResponse,
        now: DateTime<Utc>,
    ) -> Result<(), LeaseRepositoryError> {
        let updated = self
            .repository
            .mark_succeeded(scope, response, now)
            .await?;
        if updated == 0 {
            debug!(
                operation = %scope.operation,
                key = %scope.key,
                "successful commit found no processing lease; outcome already settled"
            );
        }
        Ok(())
    }

    /// Record a failed effect for `scope`, leaving it open to retries.
    pub async fn commit_failed(
        &self,
        scope: &LeaseScope,
        now: DateTime<Utc>,
    ) -> Result<(), LeaseRepositoryError> {
        let updated = self.repository.mark_failed(scope, now).await?;
        if updated == 0 {
            debug!(
                operation = %scope.operation,
                key = %scope.key,
                "failed commit found no processing lease; outcome already settled"
            );
        }
        Ok(())
    }

    /// Delete every lease whose expiry is at or before `now`.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, LeaseRepositoryError> {
        self.repository.delete_expired(now).await
    }

    /// Read the current lease for `scope`, if any.
    pub async fn find(
        &self,
        scope: &LeaseScope,
    ) -> Result<Option<IdempotencyLease>, LeaseRepositoryError> {
        self.repository.find(scope.operation, &scope.key).await
    }
}

#[cfg(test)]
#[path = "lease_store_tests.rs"]
mod tests;
