//! Order creation use case.
//!
//! [`CreateOrderService`] implements the [`CreateOrderCommand`] driving port
//! by running the order insert inside an [`IdempotencyGuard`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use super::{CreateOrderRequest, Order, OrderResponse};
use crate::domain::Error;
use crate::domain::idempotency::{
    GuardError, GuardedOperation, GuardedOutcome, IdempotencyGuard, LeaseScope, RecordedResponse,
};
use crate::domain::ports::{
    CreateOrderCommand, IdempotencyMetrics, LeaseRepository, LeaseRepositoryError,
    OrderRepository, OrderRepositoryError,
};

const CREATED: u16 = 201;
const EXISTING: u16 = 200;

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
    }
}

fn map_lease_error(error: LeaseRepositoryError) -> Error {
    match error {
        LeaseRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("idempotency store unavailable: {message}"))
        }
        LeaseRepositoryError::Query { message } | LeaseRepositoryError::Corrupt { message } => {
            Error::internal(format!("idempotency store error: {message}"))
        }
    }
}

fn map_guard_error(error: GuardError<Error>) -> Error {
    match error {
        GuardError::Lease(error) => map_lease_error(error),
        GuardError::Effect(error) => error,
    }
}

/// Creates orders exactly once per idempotency key.
pub struct CreateOrderService<L, O, M> {
    guard: IdempotencyGuard<L, M>,
    orders: Arc<O>,
    clock: Arc<dyn Clock>,
}

impl<L, O, M> Clone for CreateOrderService<L, O, M> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            orders: Arc::clone(&self.orders),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<L, O, M> CreateOrderService<L, O, M> {
    pub fn new(guard: IdempotencyGuard<L, M>, orders: Arc<O>, clock: Arc<dyn Clock>) -> Self {
        Self {
            guard,
            orders,
            clock,
        }
    }
}

#[async_trait]
impl<L, O, M> CreateOrderCommand for CreateOrderService<L, O, M>
where
    L: LeaseRepository,
    O: OrderRepository,
    M: IdempotencyMetrics,
{
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GuardedOutcome, Error> {
        let payload_hash = request
            .payload_hash()
            .map_err(|err| Error::internal(format!("failed to fingerprint order: {err}")))?;
        let scope = LeaseScope::new(
            GuardedOperation::CreateOrder,
            request.idempotency_key,
            payload_hash,
        );
        let order = Order::new(
            Uuid::new_v4(),
            request.order_number,
            request.amount_cents,
            self.clock.utc(),
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;
        let orders = Arc::clone(&self.orders);

        self.guard
            .run(&scope, move || async move {
                let creation = orders.create_or_get(&order).await.map_err(map_order_error)?;
                let status = if creation.was_created() {
                    CREATED
                } else {
                    EXISTING
                };
                RecordedResponse::json(status, &OrderResponse::from(creation.order()))
                    .map_err(|err| Error::internal(format!("failed to encode order: {err}")))
            })
            .await
            .map_err(map_guard_error)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
