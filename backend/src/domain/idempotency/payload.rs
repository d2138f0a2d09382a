//! Payload canonicalisation and fingerprinting.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Errors raised while building a [`PayloadHash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    /// Stored bytes had the wrong length.
    #[error("payload hash must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        actual: usize,
    },
    /// The payload could not be turned into JSON.
    #[error("failed to serialise canonical JSON payload: {message}")]
    Serialization {
        /// Description of the serialisation failure.
        message: String,
    },
}

/// SHA-256 digest of a canonical request payload.
///
/// Two requests under the same key with equal digests are treated as the
/// same logical request; differing digests are a client conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Rebuild a hash from stored bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadHashError::InvalidLength`] unless the slice is exactly
    /// [`PayloadHash::LEN`] bytes.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        let digest: [u8; Self::LEN] =
            bytes
                .try_into()
                .map_err(|_| PayloadHashError::InvalidLength {
                    expected: Self::LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(digest))
    }

    /// Wrap an existing digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering, used in logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonicalise a JSON value and compute its SHA-256 digest.
///
/// Object keys are sorted recursively, arrays keep their order, and the
/// result is written as compact JSON before hashing, so whitespace and key
/// order never change the digest.
///
/// # Example
///
/// ```
/// # use orders_backend::domain::idempotency::canonicalize_and_hash;
/// # use serde_json::json;
/// let a = json!({"amountCents": 1250, "orderNumber": "A-1"});
/// let b = json!({"orderNumber": "A-1", "amountCents": 1250});
/// assert_eq!(
///     canonicalize_and_hash(&a).expect("hash a"),
///     canonicalize_and_hash(&b).expect("hash b"),
/// );
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let canonical = canonicalize(value);
    let bytes = serde_json::to_vec(&canonical).map_err(|err| PayloadHashError::Serialization {
        message: err.to_string(),
    })?;
    Ok(PayloadHash::from_bytes(Sha256::digest(&bytes).into()))
}

/// Serialise any payload to JSON and hash its canonical form.
///
/// # Errors
///
/// Returns [`PayloadHashError::Serialization`] when the payload cannot be
/// represented as JSON.
pub fn hash_payload<T: Serialize>(payload: &T) -> Result<PayloadHash, PayloadHashError> {
    let value = serde_json::to_value(payload).map_err(|err| PayloadHashError::Serialization {
        message: err.to_string(),
    })?;
    canonicalize_and_hash(&value)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(key, _)| key.as_str());
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, nested)| (key.clone(), canonicalize(nested)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
