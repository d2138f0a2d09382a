//! Driving port for idempotent order creation.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::idempotency::GuardedOutcome;
use crate::domain::orders::CreateOrderRequest;

/// Create an order at most once per idempotency key.
///
/// `Completed` and `Replayed` outcomes carry the response to send verbatim:
/// status 201 for a new order, 200 when the order number already existed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreateOrderCommand: Send + Sync {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GuardedOutcome, Error>;
}
