//! In-process adapters used when no database is configured, and by tests.
//!
//! Both adapters honour the atomic primitives their ports promise, so the
//! lease protocol behaves the same as against PostgreSQL within one process.

mod lease_repository;
mod order_repository;

pub use lease_repository::InMemoryLeaseRepository;
pub use order_repository::InMemoryOrderRepository;
