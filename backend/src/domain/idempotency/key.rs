//! Idempotency key validation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key was empty once surrounding whitespace was removed.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// The key exceeds the storage column width.
    #[error("idempotency key must be at most {max} characters, got {actual}")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected key.
        actual: usize,
    },
}

/// Opaque client-provided idempotency key.
///
/// Clients send this via the `Idempotency-Key` HTTP header. Any printable
/// string is accepted; surrounding whitespace is trimmed before validation so
/// `" abc "` and `"abc"` name the same lease.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Maximum key length in characters.
    pub const MAX_LEN: usize = 255;

    /// Validate and construct an [`IdempotencyKey`].
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyKeyValidationError::EmptyKey`] for blank input and
    /// [`IdempotencyKeyValidationError::TooLong`] when the trimmed key exceeds
    /// [`IdempotencyKey::MAX_LEN`] characters.
    ///
    /// # Example
    ///
    /// ```
    /// # use orders_backend::domain::idempotency::IdempotencyKey;
    /// let key = IdempotencyKey::new("  order-42-attempt ").expect("valid key");
    /// assert_eq!(key.as_ref(), "order-42-attempt");
    /// ```
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        let trimmed = key.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LEN {
            return Err(IdempotencyKeyValidationError::TooLong {
                max: Self::MAX_LEN,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Access the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
