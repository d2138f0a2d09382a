//! Storage selection and use-case wiring.
//!
//! With a database URL the Diesel adapters are used after pending migrations
//! have run. Without one the in-memory adapters back the same protocol, which
//! suits local runs but loses every lease on restart.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use orders_backend::domain::idempotency::{
    ExpiredLeaseSweeper, IdempotencyConfig, IdempotencyGuard, IdempotencyLeaseStore,
};
use orders_backend::domain::orders::CreateOrderService;
use orders_backend::domain::ports::{CreateOrderCommand, LeaseRepository, OrderRepository};
#[cfg(not(feature = "metrics"))]
use orders_backend::domain::ports::NoOpIdempotencyMetrics;
use orders_backend::inbound::http::state::HttpState;
use orders_backend::outbound::memory::{InMemoryLeaseRepository, InMemoryOrderRepository};
#[cfg(feature = "metrics")]
use orders_backend::outbound::metrics::PrometheusIdempotencyMetrics;
use orders_backend::outbound::persistence::{
    DbPool, DieselLeaseRepository, DieselOrderRepository, PoolConfig,
    run_pending_migrations_async,
};

#[cfg(feature = "metrics")]
pub(crate) type Metrics = PrometheusIdempotencyMetrics;
#[cfg(not(feature = "metrics"))]
pub(crate) type Metrics = NoOpIdempotencyMetrics;

/// HTTP state plus the running expired-lease sweeper.
pub(crate) struct Wiring {
    pub(crate) http_state: HttpState,
    pub(crate) sweeper: SweeperHandle,
}

/// Handle used to stop the sweeper task during shutdown.
pub(crate) struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub(crate) async fn stop(self) {
        if self.shutdown.send(true).is_err() {
            warn!("sweeper already stopped before shutdown signal");
        }
        if let Err(error) = self.task.await {
            warn!(%error, "sweeper task ended abnormally");
        }
    }
}

fn spawn_sweeper<R>(sweeper: ExpiredLeaseSweeper<R>) -> SweeperHandle
where
    R: LeaseRepository + 'static,
{
    let (shutdown, receiver) = watch::channel(false);
    let task = tokio::spawn(sweeper.run(receiver));
    SweeperHandle { shutdown, task }
}

fn wire<L, O>(
    leases: Arc<L>,
    orders: Arc<O>,
    config: IdempotencyConfig,
    metrics: Arc<Metrics>,
    sweep_interval: Duration,
) -> Wiring
where
    L: LeaseRepository + 'static,
    O: OrderRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let store = IdempotencyLeaseStore::new(leases, config);
    let sweeper = ExpiredLeaseSweeper::new(store.clone(), Arc::clone(&clock), sweep_interval);
    let guard = IdempotencyGuard::new(store, metrics, Arc::clone(&clock));
    let service: Arc<dyn CreateOrderCommand> =
        Arc::new(CreateOrderService::new(guard, orders, clock));

    Wiring {
        http_state: HttpState::new(service),
        sweeper: spawn_sweeper(sweeper),
    }
}

/// Select storage, run migrations when needed and start the sweeper.
///
/// # Errors
///
/// Returns [`std::io::Error`] when migrations fail or the pool cannot be
/// built; the server must not start against an unmigrated database.
pub(crate) async fn build_wiring(
    pool_config: Option<PoolConfig>,
    config: IdempotencyConfig,
    metrics: Arc<Metrics>,
    sweep_interval: Duration,
) -> std::io::Result<Wiring> {
    let Some(pool_config) = pool_config else {
        warn!("no database URL configured; using in-memory lease and order storage");
        return Ok(wire(
            Arc::new(InMemoryLeaseRepository::new()),
            Arc::new(InMemoryOrderRepository::new()),
            config,
            metrics,
            sweep_interval,
        ));
    };

    let applied = run_pending_migrations_async(pool_config.database_url().to_owned())
        .await
        .map_err(std::io::Error::other)?;
    info!(applied, "database migrations complete");

    let pool = DbPool::new(pool_config)
        .await
        .map_err(std::io::Error::other)?;
    Ok(wire(
        Arc::new(DieselLeaseRepository::new(pool.clone())),
        Arc::new(DieselOrderRepository::new(pool)),
        config,
        metrics,
        sweep_interval,
    ))
}
