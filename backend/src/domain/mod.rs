//! Domain primitives, the idempotency lease protocol and the order use case.
//!
//! Purpose: keep every rule about leases and orders transport agnostic. The
//! inbound HTTP adapter and the outbound persistence adapters depend on this
//! module, never the other way round.
//!
//! Public surface:
//! - Error / ErrorCode: error payload shared by every adapter.
//! - TraceId: request-scoped correlation identifier.
//! - idempotency: keys, payload hashing, leases, the lease store, the guard
//!   and the expiry sweeper.
//! - orders: order types and `CreateOrderService`.
//! - ports: traits implemented by adapters.

pub mod error;
pub mod idempotency;
pub mod orders;
pub mod ports;
pub mod trace_id;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use orders_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::invalid_request("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
