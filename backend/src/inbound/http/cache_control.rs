//! Cache-control policy for order responses.

/// Responses to idempotent writes must never be cached by intermediaries.
pub const NO_STORE: &str = "no-store";

/// Build the cache-control header tuple applied to every API response.
pub const fn no_store_header() -> (&'static str, &'static str) {
    ("Cache-Control", NO_STORE)
}
