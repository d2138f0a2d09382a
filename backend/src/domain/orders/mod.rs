//! Orders: the side effect guarded by idempotency leases.

mod model;
mod service;

pub use model::{
    CreateOrderRequest, Order, OrderCreation, OrderNumber, OrderResponse, OrderValidationError,
};
pub use service::CreateOrderService;
