//! Order creation handler.
//!
//! ```text
//! POST /api/v1/orders  Create an order at most once per Idempotency-Key
//! ```

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::idempotency::{GuardedOutcome, RecordedResponse};
use crate::domain::Error;
use crate::domain::orders::{CreateOrderRequest, OrderNumber, OrderResponse, OrderValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::idempotency::require_idempotency_key;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/orders`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    /// Natural key of the order, unique across all orders.
    #[schema(example = "A-1001")]
    pub order_number: String,
    /// Order amount as an integer count of minor currency units (cents).
    ///
    /// There is no decimal `amount` field; `12.50` is sent as `1250`.
    #[schema(example = 1250, minimum = 1)]
    pub amount_cents: i64,
}

fn require_json_content_type(headers: &HeaderMap) -> Result<(), Error> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"));
    if is_json {
        Ok(())
    } else {
        Err(Error::unsupported_media_type(
            "request body must be application/json",
        ))
    }
}

fn map_order_validation_error(err: OrderValidationError) -> Error {
    let field = match err {
        OrderValidationError::EmptyOrderNumber | OrderValidationError::OrderNumberTooLong { .. } => {
            "orderNumber"
        }
        OrderValidationError::NonPositiveAmount { .. } => "amountCents",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn parse_body(body: &[u8]) -> Result<CreateOrderBody, Error> {
    serde_json::from_slice(body)
        .map_err(|err| Error::invalid_request(format!("invalid order body: {err}")))
}

/// Whole seconds for a `Retry-After` header, rounded up and never zero.
fn retry_after_secs(delay: Duration) -> u64 {
    let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
    secs.max(1)
}

fn recorded_response(recorded: RecordedResponse) -> ApiResult<HttpResponse> {
    let status = StatusCode::from_u16(recorded.status_code).map_err(|_| {
        Error::internal(format!(
            "recorded response has invalid status {}",
            recorded.status_code
        ))
    })?;
    Ok(HttpResponse::build(status)
        .insert_header(no_store_header())
        .content_type("application/json")
        .body(recorded.body))
}

fn outcome_response(outcome: GuardedOutcome) -> ApiResult<HttpResponse> {
    match outcome {
        GuardedOutcome::Completed(recorded) | GuardedOutcome::Replayed(recorded) => {
            recorded_response(recorded)
        }
        GuardedOutcome::InProgress { retry_after } => {
            let secs = retry_after_secs(retry_after);
            debug!(retry_after_secs = secs, "order request already in progress");
            Ok(HttpResponse::Conflict()
                .insert_header(no_store_header())
                .insert_header((header::RETRY_AFTER, secs.to_string()))
                .finish())
        }
        GuardedOutcome::PayloadConflict => Ok(HttpResponse::Conflict()
            .insert_header(no_store_header())
            .finish()),
    }
}

/// Create an order.
///
/// # Idempotency
///
/// The `Idempotency-Key` header is mandatory. Retrying with the same key and
/// body replays the first response verbatim. Reusing the key with a different
/// body yields `409 Conflict` without a body. While the first attempt is still
/// running, retries receive `409 Conflict` with a `Retry-After` header.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body(content = CreateOrderBody, content_type = "application/json"),
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 200, description = "Order number already existed", body = OrderResponse),
        (status = 400, description = "Invalid request", body = Error),
        (
            status = 409,
            description = "Request in progress (with Retry-After) or key reused with a different body",
            headers(("Retry-After" = u64, description = "Seconds to wait before retrying"))
        ),
        (status = 415, description = "Body is not JSON", body = Error),
        (status = 500, description = "Internal server error", body = Error),
        (status = 503, description = "Backing store unavailable", body = Error)
    ),
    params(
        ("Idempotency-Key" = String, Header, description = "Client-chosen key, at most 255 characters")
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let idempotency_key = require_idempotency_key(request.headers())?;
    require_json_content_type(request.headers())?;

    let CreateOrderBody {
        order_number,
        amount_cents,
    } = parse_body(&body)?;
    let order_number = OrderNumber::new(order_number).map_err(map_order_validation_error)?;
    let command = CreateOrderRequest::new(idempotency_key, order_number, amount_cents)
        .map_err(map_order_validation_error)?;

    let outcome = state.orders.create_order(command).await?;
    outcome_response(outcome)
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
