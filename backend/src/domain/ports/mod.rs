//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod create_order_command;
mod idempotency_metrics;
mod lease_repository;
mod order_repository;

#[cfg(test)]
pub use create_order_command::MockCreateOrderCommand;
pub use create_order_command::CreateOrderCommand;
#[cfg(test)]
pub use idempotency_metrics::MockIdempotencyMetrics;
pub use idempotency_metrics::{
    IdempotencyMetricLabels, IdempotencyMetrics, IdempotencyMetricsError, NoOpIdempotencyMetrics,
};
#[cfg(test)]
pub use lease_repository::MockLeaseRepository;
pub use lease_repository::{LeaseRepository, LeaseRepositoryError};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{OrderRepository, OrderRepositoryError};
