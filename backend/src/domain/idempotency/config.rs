//! Lease timing configuration.

use std::time::Duration;

/// Reasons an [`IdempotencyConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyConfigError {
    /// Lease retention must be positive.
    #[error("idempotency ttl must be greater than zero")]
    ZeroTtl,
    /// The processing timeout must be positive.
    #[error("processing timeout must be greater than zero")]
    ZeroProcessingTimeout,
    /// A lease must be reclaimable before it expires.
    #[error(
        "processing timeout ({processing_timeout:?}) must be shorter than the ttl ({ttl:?})"
    )]
    TimeoutNotBelowTtl {
        /// Configured processing timeout.
        processing_timeout: Duration,
        /// Configured ttl.
        ttl: Duration,
    },
}

/// Timing parameters for the lease protocol.
///
/// - `ttl`: how long a lease row is retained before the sweeper deletes it.
/// - `processing_timeout`: how long a `Processing` lease is honoured before
///   another caller may take it over.
///
/// # Example
///
/// ```
/// # use orders_backend::domain::idempotency::IdempotencyConfig;
/// # use std::time::Duration;
/// let config = IdempotencyConfig::default();
/// assert_eq!(config.ttl(), Duration::from_secs(48 * 3600));
/// assert_eq!(config.processing_timeout(), Duration::from_secs(600));
///
/// assert!(IdempotencyConfig::try_new(Duration::from_secs(60), Duration::from_secs(60)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
    processing_timeout: Duration,
}

impl IdempotencyConfig {
    /// Default retention: 48 hours.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(48 * 3600);

    /// Default processing timeout: 10 minutes.
    pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Validate and build a configuration.
    ///
    /// # Errors
    ///
    /// Rejects zero durations and a processing timeout that is not strictly
    /// shorter than the ttl.
    pub fn try_new(
        ttl: Duration,
        processing_timeout: Duration,
    ) -> Result<Self, IdempotencyConfigError> {
        if ttl.is_zero() {
            return Err(IdempotencyConfigError::ZeroTtl);
        }
        if processing_timeout.is_zero() {
            return Err(IdempotencyConfigError::ZeroProcessingTimeout);
        }
        if processing_timeout >= ttl {
            return Err(IdempotencyConfigError::TimeoutNotBelowTtl {
                processing_timeout,
                ttl,
            });
        }
        Ok(Self {
            ttl,
            processing_timeout,
        })
    }

    /// Build from whole seconds, as loaded from settings.
    ///
    /// # Errors
    ///
    /// Same as [`IdempotencyConfig::try_new`].
    pub fn from_secs(
        ttl_secs: u64,
        processing_timeout_secs: u64,
    ) -> Result<Self, IdempotencyConfigError> {
        Self::try_new(
            Duration::from_secs(ttl_secs),
            Duration::from_secs(processing_timeout_secs),
        )
    }

    /// Lease retention.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Maximum age of a `Processing` lease before takeover.
    pub fn processing_timeout(&self) -> Duration {
        self.processing_timeout
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            processing_timeout: Self::DEFAULT_PROCESSING_TIMEOUT,
        }
    }
}
