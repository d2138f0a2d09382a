//! Backend entry-point: loads settings, wires storage and serves the API.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use orders_backend::inbound::http::health::HealthState;
#[cfg(not(feature = "metrics"))]
use orders_backend::domain::ports::NoOpIdempotencyMetrics;
#[cfg(feature = "metrics")]
use orders_backend::outbound::metrics::PrometheusIdempotencyMetrics;
use server::{AppSettings, Metrics, ServerConfig, build_wiring, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;
    let idempotency = settings.idempotency_config().map_err(|err| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;

    #[cfg(feature = "metrics")]
    let prometheus = make_metrics()?;
    #[cfg(feature = "metrics")]
    let metrics = std::sync::Arc::new(build_idempotency_metrics(&prometheus)?);
    #[cfg(not(feature = "metrics"))]
    let metrics: std::sync::Arc<Metrics> = std::sync::Arc::new(NoOpIdempotencyMetrics);

    let wiring = build_wiring(
        settings.pool_config(),
        idempotency,
        metrics,
        settings.sweep_interval(),
    )
    .await?;

    let config = ServerConfig::new(
        settings.bind_addr(),
        wiring.http_state,
        #[cfg(feature = "metrics")]
        prometheus,
    );

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(bind_addr = %settings.bind_addr(), "orders backend listening");

    let result = server.await;
    health_state.mark_unhealthy();
    wiring.sweeper.stop().await;
    info!("orders backend stopped");
    result
}

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("orders")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

#[cfg(feature = "metrics")]
fn build_idempotency_metrics(prometheus: &PrometheusMetrics) -> std::io::Result<Metrics> {
    PrometheusIdempotencyMetrics::new(&prometheus.registry).map_err(|err| {
        std::io::Error::other(format!("idempotency metrics registration failed: {err}"))
    })
}
