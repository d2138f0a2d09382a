//! Idempotency leases: exactly-once effects under at-least-once delivery.
//!
//! - [`IdempotencyKey`]: client-supplied key from the `Idempotency-Key`
//!   header.
//! - [`GuardedOperation`]: namespace separating keys per guarded action.
//! - [`PayloadHash`]: SHA-256 digest of the canonical request payload.
//! - [`IdempotencyLease`]: stored lease, unique per `(operation, key)`.
//! - [`IdempotencyLeaseStore`]: the acquire / commit / sweep protocol.
//! - [`IdempotencyGuard`]: runs an effect at most once per lease.
//! - [`ExpiredLeaseSweeper`]: periodic expiry task.
//!
//! # Lease lifecycle
//!
//! ```text
//! (absent)   --acquire (first)--------------> Processing
//! Processing --commit succeeded-------------> Succeeded  (terminal until expiry)
//! Processing --commit failed----------------> Failed
//! Processing --takeover after timeout-------> Processing (updated_at refreshed)
//! Failed     --reclaim----------------------> Processing
//! any        --expiry-----------------------> (absent)
//! ```

mod config;
mod guard;
mod key;
mod lease;
mod lease_store;
mod operation;
mod payload;
mod sweeper;

pub use config::{IdempotencyConfig, IdempotencyConfigError};
pub use guard::{GuardError, GuardedOutcome, IdempotencyGuard};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError};
pub use lease::{
    AcquireOutcome, AcquisitionPath, IdempotencyLease, LeaseClaim, LeaseScope, LeaseState,
    LeaseStatus, RecordedResponse, UnknownLeaseStatus, next_updated_at,
};
pub use lease_store::{
    FAILED_RECLAIM_RETRY_AFTER, IdempotencyLeaseStore, LOST_TAKEOVER_RETRY_AFTER, MIN_RETRY_AFTER,
    VANISHED_LEASE_RETRY_AFTER,
};
pub use operation::{GuardedOperation, ParseGuardedOperationError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash, hash_payload};
pub use sweeper::ExpiredLeaseSweeper;

#[cfg(test)]
mod tests;
