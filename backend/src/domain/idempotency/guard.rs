//! Guarded execution of a side effect under an idempotency lease.
//!
//! [`IdempotencyGuard`] acquires a lease for a request, runs the effect only
//! when the caller is the first attempt, and records the outcome so retries
//! replay it. The effect is any async closure producing a
//! [`RecordedResponse`]; the guard knows nothing about orders.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

use super::{AcquireOutcome, IdempotencyLeaseStore, LeaseScope, RecordedResponse};
use crate::domain::ports::{
    IdempotencyMetricLabels, IdempotencyMetrics, LeaseRepository, LeaseRepositoryError,
    NoOpIdempotencyMetrics,
};

/// What a guarded request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedOutcome {
    /// The effect ran in this attempt and produced this response.
    Completed(RecordedResponse),
    /// A previous attempt completed; this is its recorded response.
    Replayed(RecordedResponse),
    /// Another attempt holds the lease.
    InProgress {
        /// Suggested delay before retrying.
        retry_after: Duration,
    },
    /// The key was already used with a different payload.
    PayloadConflict,
}

/// Failures of a guarded request.
#[derive(Debug, thiserror::Error)]
pub enum GuardError<E> {
    /// The lease store failed.
    #[error(transparent)]
    Lease(#[from] LeaseRepositoryError),
    /// The effect itself failed; the lease has been marked failed.
    #[error("guarded effect failed: {0}")]
    Effect(E),
}

enum Observation {
    Miss,
    Hit(DateTime<Utc>),
    InProgress,
    Conflict(DateTime<Utc>),
}

/// Runs effects at most once per lease scope.
pub struct IdempotencyGuard<R, M = NoOpIdempotencyMetrics> {
    store: IdempotencyLeaseStore<R>,
    metrics: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<R, M> Clone for IdempotencyGuard<R, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            metrics: Arc::clone(&self.metrics),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R> IdempotencyGuard<R, NoOpIdempotencyMetrics>
where
    R: LeaseRepository,
{
    /// Create a guard that records no metrics.
    pub fn with_noop_metrics(store: IdempotencyLeaseStore<R>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, Arc::new(NoOpIdempotencyMetrics), clock)
    }
}

impl<R, M> IdempotencyGuard<R, M>
where
    R: LeaseRepository,
    M: IdempotencyMetrics,
{
    /// Create a guard over `store`, reporting to `metrics` and reading `now`
    /// from `clock`.
    pub fn new(store: IdempotencyLeaseStore<R>, metrics: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            metrics,
            clock,
        }
    }

    /// Run `effect` for `scope` unless a lease says otherwise.
    ///
    /// When the effect fails the lease is marked failed before the error is
    /// returned, so a retry may reclaim it. If marking fails as well the lease
    /// stays `Processing` and heals through takeover.
    pub async fn run<F, Fut, E>(
        &self,
        scope: &LeaseScope,
        effect: F,
    ) -> Result<GuardedOutcome, GuardError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<RecordedResponse, E>> + Send,
        E: std::fmt::Display + Send,
    {
        let now = self.clock.utc();
        match self.store.acquire(scope, now).await? {
            AcquireOutcome::FirstProcessing(path) => {
                debug!(
                    operation = %scope.operation,
                    key = %scope.key,
                    path = path.as_str(),
                    "lease acquired"
                );
                self.record(Observation::Miss, scope, now).await;
                self.perform(scope, effect).await
            }
            AcquireOutcome::ExistsSucceeded {
                response,
                recorded_at,
            } => {
                self.record(Observation::Hit(recorded_at), scope, now).await;
                Ok(GuardedOutcome::Replayed(response))
            }
            AcquireOutcome::ExistsProcessing { retry_after } => {
                debug!(
                    operation = %scope.operation,
                    key = %scope.key,
                    retry_after_secs = retry_after.as_secs(),
                    "lease held by another attempt"
                );
                self.record(Observation::InProgress, scope, now).await;
                Ok(GuardedOutcome::InProgress { retry_after })
            }
            AcquireOutcome::ConflictDifferentPayload(existing) => {
                info!(
                    operation = %scope.operation,
                    key = %scope.key,
                    stored_hash = %existing.payload_hash,
                    "idempotency key reused with a different payload"
                );
                self.record(Observation::Conflict(existing.created_at), scope, now)
                    .await;
                Ok(GuardedOutcome::PayloadConflict)
            }
        }
    }

    async fn perform<F, Fut, E>(
        &self,
        scope: &LeaseScope,
        effect: F,
    ) -> Result<GuardedOutcome, GuardError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<RecordedResponse, E>> + Send,
        E: std::fmt::Display + Send,
    {
        match effect().await {
            Ok(response) => {
                self.store
                    .commit_succeeded(scope, &response, self.clock.utc())
                    .await?;
                Ok(GuardedOutcome::Completed(response))
            }
            Err(error) => {
                warn!(
                    operation = %scope.operation,
                    key = %scope.key,
                    %error,
                    "guarded effect failed"
                );
                if let Err(commit_error) = self.store.commit_failed(scope, self.clock.utc()).await {
                    warn!(
                        operation = %scope.operation,
                        key = %scope.key,
                        error = %commit_error,
                        "failed to mark lease as failed"
                    );
                }
                Err(GuardError::Effect(error))
            }
        }
    }

    /// Record an outcome metric. Failures are ignored so metrics never affect
    /// the request.
    async fn record(&self, observation: Observation, scope: &LeaseScope, now: DateTime<Utc>) {
        let age_bucket = match &observation {
            Observation::Miss | Observation::InProgress => None,
            Observation::Hit(at) | Observation::Conflict(at) => {
                Some(calculate_age_bucket(*at, now).to_owned())
            }
        };
        let labels = IdempotencyMetricLabels {
            operation: scope.operation.as_str().to_owned(),
            age_bucket,
        };

        let result = match observation {
            Observation::Miss => self.metrics.record_miss(&labels).await,
            Observation::Hit(_) => self.metrics.record_hit(&labels).await,
            Observation::InProgress => self.metrics.record_in_progress(&labels).await,
            Observation::Conflict(_) => self.metrics.record_conflict(&labels).await,
        };
        if let Err(error) = result {
            debug!(%error, "idempotency metric dropped");
        }
    }
}

/// Bucket the age of a lease for metric labels.
///
/// Buckets follow typical retry patterns over the default 48 hour retention.
/// Negative ages (clock skew) fall into the first bucket.
fn calculate_age_bucket(recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> &'static str {
    match (now - recorded_at).num_minutes().max(0) {
        0 => "0-1m",
        1..=4 => "1-5m",
        5..=29 => "5-30m",
        30..=119 => "30m-2h",
        120..=359 => "2h-6h",
        360..=1439 => "6h-24h",
        1440..=2879 => "24h-48h",
        _ => ">48h",
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
