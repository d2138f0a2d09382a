//! Application settings loaded via OrthoConfig.
//!
//! Values are layered from CLI flags, `ORDERS_*` environment variables and an
//! optional configuration file. Unset values fall back to the defaults below.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use orders_backend::domain::idempotency::{
    ExpiredLeaseSweeper, IdempotencyConfig, IdempotencyConfigError,
};
use orders_backend::outbound::memory::InMemoryLeaseRepository;
use orders_backend::outbound::persistence::PoolConfig;

const DEFAULT_PORT: u16 = 8080;

/// Runtime settings for the orders server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ORDERS")]
pub struct AppSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection URL; in-memory storage is used when absent.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub db_pool_max_size: Option<u32>,
    /// Lease retention in seconds.
    pub idempotency_ttl_secs: Option<u64>,
    /// Seconds a lease may stay processing before it can be taken over.
    pub processing_timeout_secs: Option<u64>,
    /// Seconds between expired-lease sweeps.
    pub sweep_interval_secs: Option<u64>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool configuration when a database URL is set.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url().map(|url| {
            PoolConfig::new(url).with_max_size(
                self.db_pool_max_size
                    .unwrap_or(PoolConfig::DEFAULT_MAX_SIZE),
            )
        })
    }

    /// Validated lease timing.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyConfigError`] when either value is zero or the
    /// processing timeout is not shorter than the TTL.
    pub fn idempotency_config(&self) -> Result<IdempotencyConfig, IdempotencyConfigError> {
        IdempotencyConfig::try_new(
            self.idempotency_ttl_secs
                .map_or(IdempotencyConfig::DEFAULT_TTL, Duration::from_secs),
            self.processing_timeout_secs.map_or(
                IdempotencyConfig::DEFAULT_PROCESSING_TIMEOUT,
                Duration::from_secs,
            ),
        )
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval_secs.map_or(
            ExpiredLeaseSweeper::<InMemoryLeaseRepository>::DEFAULT_INTERVAL,
            Duration::from_secs,
        )
    }
}
