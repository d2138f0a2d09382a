//! Prometheus exporter for lease outcomes (`metrics` feature only).
//!
//! [`PrometheusIdempotencyMetrics`] implements the `IdempotencyMetrics` port
//! against a registry shared with the `actix-web-prom` middleware, so lease
//! counters appear on the same `/metrics` endpoint as request metrics.

mod prometheus_idempotency;

pub use prometheus_idempotency::PrometheusIdempotencyMetrics;
