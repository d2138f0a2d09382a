//! Port for the guarded side effect: persisting orders.

use async_trait::async_trait;

use crate::domain::orders::{Order, OrderCreation, OrderNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
    }
}

/// Storage for orders, unique on the order number.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert `order`, or return the stored order with the same number.
    ///
    /// Must be atomic through the store's own uniqueness constraint: of two
    /// concurrent calls for one number exactly one reports
    /// [`OrderCreation::Created`].
    async fn create_or_get(&self, order: &Order) -> Result<OrderCreation, OrderRepositoryError>;

    /// Look up an order by its number.
    ///
    /// The read half of the contract: the PostgreSQL adapter resolves insert
    /// conflicts through it, and the in-memory adapter answers it for tests
    /// that assert on stored orders.
    async fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, OrderRepositoryError>;
}
