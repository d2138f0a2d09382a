//! Names of the operations guarded by idempotency leases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An operation whose side effect is protected by a lease.
///
/// The operation namespaces idempotency keys: the same client key used for
/// two different operations names two independent leases.
///
/// # Example
///
/// ```
/// # use orders_backend::domain::idempotency::GuardedOperation;
/// let operation: GuardedOperation = "CreateOrder".parse().expect("known operation");
/// assert_eq!(operation, GuardedOperation::CreateOrder);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardedOperation {
    /// Order creation (`POST /api/v1/orders`).
    CreateOrder,
}

impl GuardedOperation {
    /// All guarded operations.
    pub const ALL: [GuardedOperation; 1] = [GuardedOperation::CreateOrder];

    /// Returns the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateOrder => "CreateOrder",
        }
    }
}

impl fmt::Display for GuardedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operation name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown guarded operation '{input}'")]
pub struct ParseGuardedOperationError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for GuardedOperation {
    type Err = ParseGuardedOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|operation| operation.as_str() == s)
            .copied()
            .ok_or_else(|| ParseGuardedOperationError {
                input: s.to_owned(),
            })
    }
}
