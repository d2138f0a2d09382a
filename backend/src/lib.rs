//! Idempotent order creation backend.
//!
//! The crate is laid out hexagonally: [`domain`] owns the lease protocol and
//! the order use case, [`inbound`] adapts HTTP requests onto it and
//! [`outbound`] provides PostgreSQL and in-memory storage adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

#[doc(hidden)]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
