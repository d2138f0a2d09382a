//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{idempotency_leases, orders};

/// Row struct for reading from the idempotency_leases table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_leases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LeaseRow {
    pub operation: String,
    pub idempotency_key: String,
    pub payload_hash: Vec<u8>,
    pub status: i16,
    pub response_status_code: Option<i32>,
    pub response_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Insertable struct for a freshly claimed lease.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = idempotency_leases)]
pub(crate) struct NewLeaseRow<'a> {
    pub operation: &'a str,
    pub idempotency_key: &'a str,
    pub payload_hash: &'a [u8],
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating orders.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}
