//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the lease and order repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types; the lease protocol lives in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: pool and Diesel failures map to port errors.
//!
//! # Example
//!
//! ```no_run
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! use orders_backend::outbound::persistence::{
//!     DbPool, DieselLeaseRepository, PoolConfig, run_pending_migrations_async,
//! };
//!
//! let url = "postgres://localhost/orders".to_owned();
//! run_pending_migrations_async(url.clone()).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let leases = DieselLeaseRepository::new(pool);
//! # let _ = leases;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_lease_repository;
mod diesel_order_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_lease_repository::DieselLeaseRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use migrations::{
    MIGRATIONS, MigrationError, run_pending_migrations, run_pending_migrations_async,
};
pub use pool::{DbPool, PoolConfig, PoolError};
