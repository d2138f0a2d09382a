//! Helpers for parsing the `Idempotency-Key` header.

use actix_web::http::header::HeaderMap;

use crate::domain::Error;
use crate::domain::idempotency::{IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Extract and validate the mandatory idempotency key.
///
/// # Errors
///
/// Returns an `InvalidRequest` error when the header is missing, blank, not
/// visible ASCII, or longer than [`IdempotencyKey::MAX_LEN`].
pub fn require_idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, Error> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Err(Error::invalid_request("missing Idempotency-Key header"));
    };

    let raw = header_value
        .to_str()
        .map_err(|_| Error::invalid_request("Idempotency-Key header must be visible ASCII"))?;

    IdempotencyKey::new(raw).map_err(map_idempotency_key_error)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    match err {
        IdempotencyKeyValidationError::EmptyKey => {
            Error::invalid_request("empty Idempotency-Key header")
        }
        IdempotencyKeyValidationError::TooLong { max, .. } => Error::invalid_request(format!(
            "Idempotency-Key header must be at most {max} characters"
        )),
    }
}
