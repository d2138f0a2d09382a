//! In-process lease storage.
//!
//! Every method holds the map lock for the whole operation, which gives the
//! same atomicity the PostgreSQL adapter gets from single statements.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::idempotency::{
    GuardedOperation, IdempotencyKey, IdempotencyLease, LeaseClaim, LeaseScope, LeaseState,
    LeaseStatus, RecordedResponse, next_updated_at,
};
use crate::domain::ports::{LeaseRepository, LeaseRepositoryError};

type LeaseId = (GuardedOperation, IdempotencyKey);

/// [`LeaseRepository`] backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryLeaseRepository {
    leases: Mutex<HashMap<LeaseId, IdempotencyLease>>,
}

impl InMemoryLeaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leases.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LeaseId, IdempotencyLease>> {
        match self.leases.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Apply `mutate` to the lease for `scope` when it carries the same
    /// payload hash and is currently in `status`. Returns the rows changed.
    fn with_owned_lease<F>(&self, scope: &LeaseScope, status: LeaseStatus, mutate: F) -> u64
    where
        F: FnOnce(&mut IdempotencyLease),
    {
        let mut leases = self.lock();
        match leases.get_mut(&(scope.operation, scope.key.clone())) {
            Some(lease) if lease.payload_hash == scope.payload_hash && lease.status() == status => {
                mutate(lease);
                1
            }
            _ => 0,
        }
    }
}

#[async_trait]
impl LeaseRepository for InMemoryLeaseRepository {
    async fn insert_processing(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError> {
        let mut leases = self.lock();
        let id = (claim.scope.operation, claim.scope.key.clone());
        if leases.contains_key(&id) {
            return Ok(false);
        }
        leases.insert(
            id,
            IdempotencyLease {
                operation: claim.scope.operation,
                key: claim.scope.key.clone(),
                payload_hash: claim.scope.payload_hash.clone(),
                state: LeaseState::Processing,
                created_at: claim.now,
                updated_at: claim.now,
                expires_at: claim.expires_at,
            },
        );
        Ok(true)
    }

    async fn find(
        &self,
        operation: GuardedOperation,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyLease>, LeaseRepositoryError> {
        Ok(self.lock().get(&(operation, key.clone())).cloned())
    }

    async fn take_over_stale(
        &self,
        claim: &LeaseClaim,
        observed_updated_at: DateTime<Utc>,
    ) -> Result<bool, LeaseRepositoryError> {
        let mut taken = false;
        self.with_owned_lease(&claim.scope, LeaseStatus::Processing, |lease| {
            if lease.updated_at == observed_updated_at {
                lease.updated_at = next_updated_at(lease.updated_at, claim.now);
                lease.expires_at = claim.expires_at;
                taken = true;
            }
        });
        Ok(taken)
    }

    async fn reclaim_failed(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError> {
        let reclaimed = self.with_owned_lease(&claim.scope, LeaseStatus::Failed, |lease| {
            lease.state = LeaseState::Processing;
            lease.updated_at = next_updated_at(lease.updated_at, claim.now);
            lease.expires_at = claim.expires_at;
        });
        Ok(reclaimed == 1)
    }

    async fn mark_succeeded(
        &self,
        scope: &LeaseScope,
        response: &RecordedResponse,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError> {
        Ok(self.with_owned_lease(scope, LeaseStatus::Processing, |lease| {
            lease.state = LeaseState::Succeeded(response.clone());
            lease.updated_at = next_updated_at(lease.updated_at, now);
        }))
    }

    async fn mark_failed(
        &self,
        scope: &LeaseScope,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError> {
        Ok(self.with_owned_lease(scope, LeaseStatus::Processing, |lease| {
            lease.state = LeaseState::Failed;
            lease.updated_at = next_updated_at(lease.updated_at, now);
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LeaseRepositoryError> {
        let mut leases = self.lock();
        let before = leases.len();
        leases.retain(|_, lease| lease.expires_at > now);
        Ok((before - leases.len()) as u64)
    }
}
