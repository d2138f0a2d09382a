//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::CreateOrderCommand;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub orders: Arc<dyn CreateOrderCommand>,
}

impl HttpState {
    /// Construct state from the order creation use-case.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use orders_backend::domain::idempotency::{
    ///     IdempotencyConfig, IdempotencyGuard, IdempotencyLeaseStore,
    /// };
    /// use orders_backend::domain::orders::CreateOrderService;
    /// use orders_backend::inbound::http::state::HttpState;
    /// use orders_backend::outbound::memory::{InMemoryLeaseRepository, InMemoryOrderRepository};
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let store = IdempotencyLeaseStore::new(
    ///     Arc::new(InMemoryLeaseRepository::new()),
    ///     IdempotencyConfig::default(),
    /// );
    /// let guard = IdempotencyGuard::with_noop_metrics(store, clock.clone());
    /// let service = CreateOrderService::new(guard, Arc::new(InMemoryOrderRepository::new()), clock);
    /// let state = HttpState::new(Arc::new(service));
    /// let _orders = state.orders.clone();
    /// ```
    pub fn new(orders: Arc<dyn CreateOrderCommand>) -> Self {
        Self { orders }
    }
}
