//! PostgreSQL-backed `LeaseRepository` implementation using Diesel ORM.
//!
//! Every port method is a single SQL statement, so each transition is atomic
//! and a cancelled caller never leaves a torn row:
//!
//! - claim: `INSERT ... ON CONFLICT (operation, idempotency_key) DO NOTHING`
//! - takeover: `UPDATE ... WHERE status = 0 AND updated_at = $observed`
//! - reclaim: `UPDATE ... WHERE status = 2`
//! - commits: `UPDATE ... WHERE status = 0`, so a settled row never changes
//! - sweep: `DELETE ... WHERE expires_at <= $now`
//!
//! Transitions write `GREATEST($now, updated_at + interval '1 microsecond')`
//! so `updated_at` strictly increases even when the caller's clock lags.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::IntervalDsl;
use diesel::prelude::*;
use diesel::sql_types::Timestamptz;
use diesel_async::RunQueryDsl;

use crate::domain::idempotency::{
    GuardedOperation, IdempotencyKey, IdempotencyLease, LeaseClaim, LeaseScope, LeaseState,
    LeaseStatus, PayloadHash, RecordedResponse,
};
use crate::domain::ports::{LeaseRepository, LeaseRepositoryError};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LeaseRow, NewLeaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_leases;

diesel::define_sql_function! {
    /// PostgreSQL `GREATEST` over two timestamps.
    fn greatest(a: Timestamptz, b: Timestamptz) -> Timestamptz;
}

/// Diesel-backed implementation of the lease repository port.
#[derive(Clone)]
pub struct DieselLeaseRepository {
    pool: DbPool,
}

impl DieselLeaseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LeaseRepositoryError {
    map_basic_pool_error(error, LeaseRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LeaseRepositoryError {
    map_basic_diesel_error(
        error,
        LeaseRepositoryError::query,
        LeaseRepositoryError::connection,
    )
}

/// Convert a database row into a domain lease, rejecting rows the domain
/// could not have written.
fn row_to_lease(row: LeaseRow) -> Result<IdempotencyLease, LeaseRepositoryError> {
    let LeaseRow {
        operation,
        idempotency_key,
        payload_hash,
        status,
        response_status_code,
        response_body,
        created_at,
        updated_at,
        expires_at,
    } = row;

    let operation = operation
        .parse::<GuardedOperation>()
        .map_err(|err| LeaseRepositoryError::corrupt(err.to_string()))?;
    let key = IdempotencyKey::new(&idempotency_key)
        .map_err(|err| LeaseRepositoryError::corrupt(format!("idempotency key: {err}")))?;
    let payload_hash = PayloadHash::try_from_bytes(&payload_hash)
        .map_err(|err| LeaseRepositoryError::corrupt(err.to_string()))?;
    let status = LeaseStatus::try_from(status)
        .map_err(|err| LeaseRepositoryError::corrupt(err.to_string()))?;

    let state = match status {
        LeaseStatus::Processing => LeaseState::Processing,
        LeaseStatus::Failed => LeaseState::Failed,
        LeaseStatus::Succeeded => {
            let (Some(code), Some(body)) = (response_status_code, response_body) else {
                return Err(LeaseRepositoryError::corrupt(
                    "succeeded lease without a recorded response",
                ));
            };
            let code = u16::try_from(code).map_err(|_| {
                LeaseRepositoryError::corrupt(format!("response status code {code} out of range"))
            })?;
            LeaseState::Succeeded(RecordedResponse::new(code, body))
        }
    };

    Ok(IdempotencyLease {
        operation,
        key,
        payload_hash,
        state,
        created_at,
        updated_at,
        expires_at,
    })
}

#[async_trait]
impl LeaseRepository for DieselLeaseRepository {
    async fn insert_processing(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewLeaseRow {
            operation: claim.scope.operation.as_str(),
            idempotency_key: claim.scope.key.as_str(),
            payload_hash: claim.scope.payload_hash.as_bytes().as_slice(),
            status: LeaseStatus::Processing.as_i16(),
            created_at: claim.now,
            updated_at: claim.now,
            expires_at: claim.expires_at,
        };

        let inserted = diesel::insert_into(idempotency_leases::table)
            .values(&row)
            .on_conflict((
                idempotency_leases::operation,
                idempotency_leases::idempotency_key,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted == 1)
    }

    async fn find(
        &self,
        operation: GuardedOperation,
        key: &IdempotencyKey,
    ) -> Result<Option<IdempotencyLease>, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<LeaseRow> = idempotency_leases::table
            .find((operation.as_str(), key.as_str()))
            .select(LeaseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_lease).transpose()
    }

    async fn take_over_stale(
        &self,
        claim: &LeaseClaim,
        observed_updated_at: DateTime<Utc>,
    ) -> Result<bool, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scope = &claim.scope;

        let updated = diesel::update(
            idempotency_leases::table
                .find((scope.operation.as_str(), scope.key.as_str()))
                .filter(idempotency_leases::payload_hash.eq(scope.payload_hash.as_bytes().as_slice()))
                .filter(idempotency_leases::status.eq(LeaseStatus::Processing.as_i16()))
                .filter(idempotency_leases::updated_at.eq(observed_updated_at)),
        )
        .set((
            idempotency_leases::updated_at.eq(greatest(
                claim.now,
                idempotency_leases::updated_at + 1.microseconds(),
            )),
            idempotency_leases::expires_at.eq(claim.expires_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn reclaim_failed(&self, claim: &LeaseClaim) -> Result<bool, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let scope = &claim.scope;

        let updated = diesel::update(
            idempotency_leases::table
                .find((scope.operation.as_str(), scope.key.as_str()))
                .filter(idempotency_leases::payload_hash.eq(scope.payload_hash.as_bytes().as_slice()))
                .filter(idempotency_leases::status.eq(LeaseStatus::Failed.as_i16())),
        )
        .set((
            idempotency_leases::status.eq(LeaseStatus::Processing.as_i16()),
            idempotency_leases::updated_at.eq(greatest(
                claim.now,
                idempotency_leases::updated_at + 1.microseconds(),
            )),
            idempotency_leases::expires_at.eq(claim.expires_at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn mark_succeeded(
        &self,
        scope: &LeaseScope,
        response: &RecordedResponse,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            idempotency_leases::table
                .find((scope.operation.as_str(), scope.key.as_str()))
                .filter(idempotency_leases::payload_hash.eq(scope.payload_hash.as_bytes().as_slice()))
                .filter(idempotency_leases::status.eq(LeaseStatus::Processing.as_i16())),
        )
        .set((
            idempotency_leases::status.eq(LeaseStatus::Succeeded.as_i16()),
            idempotency_leases::response_status_code.eq(Some(i32::from(response.status_code))),
            idempotency_leases::response_body.eq(Some(response.body.as_str())),
            idempotency_leases::updated_at
                .eq(greatest(now, idempotency_leases::updated_at + 1.microseconds())),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }

    async fn mark_failed(
        &self,
        scope: &LeaseScope,
        now: DateTime<Utc>,
    ) -> Result<u64, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            idempotency_leases::table
                .find((scope.operation.as_str(), scope.key.as_str()))
                .filter(idempotency_leases::payload_hash.eq(scope.payload_hash.as_bytes().as_slice()))
                .filter(idempotency_leases::status.eq(LeaseStatus::Processing.as_i16())),
        )
        .set((
            idempotency_leases::status.eq(LeaseStatus::Failed.as_i16()),
            idempotency_leases::updated_at
                .eq(greatest(now, idempotency_leases::updated_at + 1.microseconds())),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LeaseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted =
            diesel::delete(idempotency_leases::table.filter(idempotency_leases::expires_at.le(now)))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    //! Row mapping coverage; SQL behaviour is exercised against embedded
    //! PostgreSQL in `tests/diesel_lease_repository.rs`.

    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn row() -> LeaseRow {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .expect("valid fixed timestamp");
        LeaseRow {
            operation: "CreateOrder".to_owned(),
            idempotency_key: "key-1".to_owned(),
            payload_hash: vec![7; 32],
            status: 1,
            response_status_code: Some(201),
            response_body: Some(r#"{"id":1}"#.to_owned()),
            created_at: at,
            updated_at: at,
            expires_at: at,
        }
    }

    #[rstest]
    fn succeeded_row_maps_to_recorded_response(row: LeaseRow) {
        let lease = row_to_lease(row).expect("valid row");
        assert_eq!(lease.operation, GuardedOperation::CreateOrder);
        assert_eq!(
            lease.state,
            LeaseState::Succeeded(RecordedResponse::new(201, r#"{"id":1}"#))
        );
    }

    #[rstest]
    fn processing_row_ignores_response_columns(mut row: LeaseRow) {
        row.status = 0;
        row.response_status_code = None;
        row.response_body = None;
        assert_eq!(
            row_to_lease(row).expect("valid row").state,
            LeaseState::Processing
        );
    }

    #[rstest]
    #[case::unknown_status(|row: &mut LeaseRow| row.status = 9)]
    #[case::short_hash(|row: &mut LeaseRow| row.payload_hash = vec![1; 8])]
    #[case::unknown_operation(|row: &mut LeaseRow| row.operation = "Refund".to_owned())]
    #[case::blank_key(|row: &mut LeaseRow| row.idempotency_key = " ".to_owned())]
    #[case::missing_body(|row: &mut LeaseRow| row.response_body = None)]
    #[case::negative_status_code(|row: &mut LeaseRow| row.response_status_code = Some(-1))]
    fn corrupt_rows_are_rejected(mut row: LeaseRow, #[case] corrupt: fn(&mut LeaseRow)) {
        corrupt(&mut row);
        assert!(matches!(
            row_to_lease(row),
            Err(LeaseRepositoryError::Corrupt { .. })
        ));
    }

    #[test]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(error, LeaseRepositoryError::Connection { .. }));
        assert!(error.to_string().contains("connection refused"));
    }
}
