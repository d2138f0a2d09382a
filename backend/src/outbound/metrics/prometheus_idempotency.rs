//! Prometheus adapter for lease acquisition outcomes.
//!
//! Registers one counter with a provided registry; the `/metrics` endpoint
//! exposes it alongside the HTTP middleware metrics.

use async_trait::async_trait;
use prometheus::{CounterVec, Opts, Registry};

use crate::domain::ports::{IdempotencyMetricLabels, IdempotencyMetrics, IdempotencyMetricsError};

/// Prometheus-backed idempotency metrics recorder.
///
/// # Metric Specification
///
/// - **Name**: `orders_idempotency_requests_total`
/// - **Type**: Counter
/// - **Labels**:
///   - `operation`: guarded operation, e.g. `CreateOrder`
///   - `outcome`: `miss`, `hit`, `conflict` or `in_progress`
///   - `age_bucket`: age of the existing lease (`0-1m` .. `>48h`) or `n/a`
pub struct PrometheusIdempotencyMetrics {
    requests_total: CounterVec,
}

impl PrometheusIdempotencyMetrics {
    /// Create and register the counter with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_total = CounterVec::new(
            Opts::new(
                "orders_idempotency_requests_total",
                "Idempotent requests by lease acquisition outcome",
            ),
            &["operation", "outcome", "age_bucket"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        Ok(Self { requests_total })
    }

    fn record(&self, outcome: &str, labels: &IdempotencyMetricLabels) {
        let age_bucket = labels.age_bucket.as_deref().unwrap_or("n/a");
        self.requests_total
            .with_label_values(&[labels.operation.as_str(), outcome, age_bucket])
            .inc();
    }
}

#[async_trait]
impl IdempotencyMetrics for PrometheusIdempotencyMetrics {
    async fn record_miss(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        self.record("miss", labels);
        Ok(())
    }

    async fn record_hit(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        self.record("hit", labels);
        Ok(())
    }

    async fn record_conflict(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        self.record("conflict", labels);
        Ok(())
    }

    async fn record_in_progress(
        &self,
        labels: &IdempotencyMetricLabels,
    ) -> Result<(), IdempotencyMetricsError> {
        self.record("in_progress", labels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn metrics() -> PrometheusIdempotencyMetrics {
        PrometheusIdempotencyMetrics::new(&Registry::new())
            .expect("metric registration should succeed")
    }

    fn labels(age_bucket: Option<&str>) -> IdempotencyMetricLabels {
        IdempotencyMetricLabels {
            operation: "CreateOrder".to_owned(),
            age_bucket: age_bucket.map(str::to_owned),
        }
    }

    fn count(metrics: &PrometheusIdempotencyMetrics, outcome: &str, bucket: &str) -> u64 {
        metrics
            .requests_total
            .with_label_values(&["CreateOrder", outcome, bucket])
            .get() as u64
    }

    #[test]
    fn registers_metric_with_registry() {
        let registry = Registry::new();
        let metrics = PrometheusIdempotencyMetrics::new(&registry)
            .expect("metric registration should succeed");
        metrics.record("miss", &labels(None));

        assert!(
            registry
                .gather()
                .iter()
                .any(|family| family.name() == "orders_idempotency_requests_total")
        );
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        PrometheusIdempotencyMetrics::new(&registry).expect("first registration");
        assert!(PrometheusIdempotencyMetrics::new(&registry).is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn each_outcome_has_its_own_series(metrics: PrometheusIdempotencyMetrics) {
        metrics.record_miss(&labels(None)).await.expect("recorded");
        metrics
            .record_hit(&labels(Some("1-5m")))
            .await
            .expect("recorded");
        metrics
            .record_hit(&labels(Some("1-5m")))
            .await
            .expect("recorded");
        metrics
            .record_conflict(&labels(Some("0-1m")))
            .await
            .expect("recorded");
        metrics
            .record_in_progress(&labels(None))
            .await
            .expect("recorded");

        assert_eq!(count(&metrics, "miss", "n/a"), 1);
        assert_eq!(count(&metrics, "hit", "1-5m"), 2);
        assert_eq!(count(&metrics, "conflict", "0-1m"), 1);
        assert_eq!(count(&metrics, "in_progress", "n/a"), 1);
    }
}
