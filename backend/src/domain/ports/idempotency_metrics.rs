//! Domain port for recording lease acquisition outcomes.
//!
//! Lets the guarded use case report hits, misses, conflicts and contention
//! without depending on a metrics backend. Implementations may export to
//! Prometheus or discard everything.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording idempotency metrics.
    pub enum IdempotencyMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "idempotency metrics exporter failed: {message}",
    }
}

/// Labels attached to every idempotency metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyMetricLabels {
    /// Guarded operation name, e.g. `CreateOrder`.
    pub operation: String,
    /// Age bucket of the existing lease (e.g. `1-5m`); `None` for misses.
    pub age_bucket: Option<String>,
}

/// Metrics recording port for lease acquisition outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyMetrics: Send + Sync {
    /// The caller became the first attempt and ran the effect.
    async fn record_miss(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError>;

    /// A recorded response was replayed.
    async fn record_hit(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError>;

    /// The key was reused with a different payload.
    async fn record_conflict(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError>;

    /// Another attempt held the lease.
    async fn record_in_progress(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpIdempotencyMetrics;

#[async_trait]
impl IdempotencyMetrics for NoOpIdempotencyMetrics {
    async fn record_miss(
        &self,
        _labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        Ok(())
    }

    async fn record_hit(
        &self,
        _labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        Ok(())
    }

    async fn record_conflict(
        &self,
        _labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        Ok(())
    }

    async fn record_in_progress(
        &self,
        _labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        Ok(())
    }
}
