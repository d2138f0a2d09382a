//! Port abstraction for lease persistence.
//!
//! [`LeaseRepository`] exposes the atomic storage primitives the lease
//! protocol is built on: a unique insert, a point read, two conditional
//! updates, two owner commits and a bulk expiry delete. Every method must be a
//! single atomic statement so that cancelling a caller never leaves a torn
//! row. The protocol itself lives in
//! [`IdempotencyLeaseStore`](crate::domain::idempotency::IdempotencyLeaseStore).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::idempotency::{
    GuardedOperation, IdempotencyKey, IdempotencyLease, LeaseClaim, LeaseScope, RecordedResponse,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by lease repository adapters.
    pub enum LeaseRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } => "lease store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "lease store query failed: {message}",
        /// A stored row could not be mapped back to a lease.
        Corrupt { message: String } => "lease store returned a corrupt row: {message}",
    }
}

/// Storage primitives for idempotency leases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaseRepository: Send + Sync {
    /// Insert a `Processing` row for the claim.
    ///
    /// Returns `false` without error when a row for `(operation, key)`
    /// already exists.
    async fn insert_processing(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError>;

    /// Read the lease for `(operation, key)`.
    async fn find(
        &self,
        operation: GuardedOperation,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyLease>, LeaseRepositoryError>;

    /// Take over an abandoned `Processing` lease.
    ///
    /// Applies only when the row still matches the claim's payload hash, is
    /// `Processing` and its `updated_at` equals `observed_updated_at`. Sets
    /// `expires_at` from the claim and moves `updated_at` to the claim time.
    /// Returns whether a row changed.
    async fn take_over_stale(
        &self,
        claim: &LeaseClaim,
        observed_updated_at: DateTime<Utc>,
    ) -> Result<bool, LeaseRepositoryError>;

    /// Move a `Failed` lease with a matching payload hash back to
    /// `Processing`, refreshing `expires_at` and moving `updated_at` forward
    /// (see [`next_updated_at`](crate::domain::idempotency::next_updated_at)).
    /// Returns whether a row changed.
    async fn reclaim_failed(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError>;

    /// Mark the `Processing` lease matching `scope` as `Succeeded` with
    /// `response`.
    ///
    /// Rows in any other status are left alone, so a holder that lost its
    /// lease to a takeover can never overwrite the recorded outcome.
    /// `updated_at` moves forward per
    /// [`next_updated_at`](crate::domain::idempotency::next_updated_at).
    /// Returns the number of rows changed; zero is not an error.
    async fn mark_succeeded(
        &self,
        scope: &LeaseScope,
        response: &RecordedResponse,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError>;

    /// Mark the `Processing` lease matching `scope` as `Failed`.
    ///
    /// Same matching rules as [`LeaseRepository::mark_succeeded`]. Returns the
    /// number of rows changed; zero is not an error.
    async fn mark_failed(
        &self,
        scope: &LeaseScope,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError>;

    /// Delete every lease with `expires_at <= now`, returning the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LeaseRepositoryError>;
}
