//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the order creation endpoint, the health checks and
//! the JSON shapes they exchange. The generated specification is served by
//! Swagger UI in debug builds and exported via `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::domain::orders::OrderResponse;
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::orders::CreateOrderBody;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orders backend API",
        description = "Idempotent order creation guarded by Idempotency-Key leases.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::orders::create_order,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(CreateOrderBody, OrderResponse, Error, ErrorCode)),
    tags(
        (name = "orders", description = "Idempotent order creation"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
