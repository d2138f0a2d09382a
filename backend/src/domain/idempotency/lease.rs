//! Lease records and the outcomes of acquiring one.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::{GuardedOperation, IdempotencyKey, PayloadHash};

/// Stored lifecycle status of a lease.
///
/// Persisted as a small integer; adapters convert with
/// [`LeaseStatus::as_i16`] and `TryFrom<i16>` so raw codes never reach the
/// domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseStatus {
    /// An attempt owns the right to perform the effect.
    Processing,
    /// The effect completed and its response is recorded.
    Succeeded,
    /// The effect failed; a later attempt may reclaim the lease.
    Failed,
}

impl LeaseStatus {
    /// Storage code for this status.
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::Processing => 0,
            Self::Succeeded => 1,
            Self::Failed => 2,
        }
    }
}

/// A stored status code that maps to no [`LeaseStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown lease status code {0}")]
pub struct UnknownLeaseStatus(pub i16);

impl TryFrom<i16> for LeaseStatus {
    type Error = UnknownLeaseStatus;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Processing),
            1 => Ok(Self::Succeeded),
            2 => Ok(Self::Failed),
            other => Err(UnknownLeaseStatus(other)),
        }
    }
}

/// Response captured when an effect succeeds, replayed verbatim afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResponse {
    /// HTTP-style status code of the original response.
    pub status_code: u16,
    /// Serialised response body.
    pub body: String,
}

impl RecordedResponse {
    /// Record a response from raw parts.
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Record a response by serialising `body` as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error when `body` cannot be encoded.
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status_code, serde_json::to_string(body)?))
    }
}

/// Lease state with the data that only exists in that state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseState {
    /// Held by an in-flight attempt.
    Processing,
    /// Terminal until expiry; carries the response to replay.
    Succeeded(RecordedResponse),
    /// Retryable through the failed-lease reclaim path.
    Failed,
}

impl LeaseState {
    /// Status discriminator of this state.
    pub fn status(&self) -> LeaseStatus {
        match self {
            Self::Processing => LeaseStatus::Processing,
            Self::Succeeded(_) => LeaseStatus::Succeeded,
            Self::Failed => LeaseStatus::Failed,
        }
    }
}

/// A stored lease, unique per `(operation, key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyLease {
    /// Guarded operation namespace.
    pub operation: GuardedOperation,
    /// Client-supplied key.
    pub key: IdempotencyKey,
    /// Digest of the payload that created or last took over the lease.
    pub payload_hash: PayloadHash,
    /// Current state.
    pub state: LeaseState,
    /// When the lease row was first written.
    pub created_at: DateTime<Utc>,
    /// When the lease last changed state.
    pub updated_at: DateTime<Utc>,
    /// When the sweeper may delete the lease.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyLease {
    /// Status discriminator of the lease.
    pub fn status(&self) -> LeaseStatus {
        self.state.status()
    }
}

/// Identity of a guarded request: operation, key and payload digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseScope {
    /// Guarded operation namespace.
    pub operation: GuardedOperation,
    /// Client-supplied key.
    pub key: IdempotencyKey,
    /// Digest of the canonical request payload.
    pub payload_hash: PayloadHash,
}

impl LeaseScope {
    /// Bundle the identity of a guarded request.
    pub fn new(operation: GuardedOperation, key: IdempotencyKey, payload_hash: PayloadHash) -> Self {
        Self {
            operation,
            key,
            payload_hash,
        }
    }
}

/// A request to hold a lease in `Processing` from `now` until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseClaim {
    /// The request identity.
    pub scope: LeaseScope,
    /// Time of the claim; becomes `updated_at` (and `created_at` on insert).
    pub now: DateTime<Utc>,
    /// Expiry written with the claim.
    pub expires_at: DateTime<Utc>,
}

impl LeaseClaim {
    /// Claim `scope` at `now` for `ttl`.
    pub fn new(scope: LeaseScope, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            scope,
            now,
            expires_at: saturating_add(now, ttl),
        }
    }
}

/// `updated_at` for a transition of a lease last touched at `previous`.
///
/// Returns `now` unless it does not lie after `previous`, in which case the
/// timestamp advances by one microsecond, the finest step PostgreSQL stores.
/// Every state transition therefore strictly increases `updated_at`, even
/// under a frozen or skewed clock.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous
        .checked_add_signed(TimeDelta::microseconds(1))
        .map_or(now, |step| now.max(step))
}

/// How the caller came to hold a `Processing` lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionPath {
    /// No lease existed; a new row was inserted.
    Fresh,
    /// An abandoned `Processing` lease was taken over.
    TookOverStale,
    /// A `Failed` lease was moved back to `Processing`.
    ReclaimedFailed,
}

impl AcquisitionPath {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::TookOverStale => "took_over_stale",
            Self::ReclaimedFailed => "reclaimed_failed",
        }
    }
}

/// Result of acquiring a lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller must perform the effect and then commit or fail the lease.
    FirstProcessing(AcquisitionPath),
    /// The effect already completed; replay `response`.
    ExistsSucceeded {
        /// The recorded response.
        response: RecordedResponse,
        /// When the response was recorded.
        recorded_at: DateTime<Utc>,
    },
    /// Another attempt holds the lease; try again after `retry_after`.
    ExistsProcessing {
        /// Suggested delay before retrying.
        retry_after: Duration,
    },
    /// The key was already used with a different payload.
    ConflictDifferentPayload(IdempotencyLease),
}

/// Add a std duration to a timestamp, clamping at the representable maximum.
pub(crate) fn saturating_add(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Elapsed time from `earlier` to `now`; clock skew counts as zero.
pub(crate) fn elapsed_since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
