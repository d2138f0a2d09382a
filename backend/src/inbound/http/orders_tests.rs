//! Tests for the order creation handler.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE, RETRY_AFTER};
use actix_web::{App, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockCreateOrderCommand;

const CREATED_BODY: &str = r#"{"id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","orderNumber":"A-1","amountCents":100,"createdAt":"2026-01-05T09:00:00Z"}"#;

async fn call(
    command: MockCreateOrderCommand,
    request: actix_test::TestRequest,
) -> actix_web::dev::ServiceResponse {
    let state = HttpState::new(Arc::new(command));
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api/v1").service(create_order)),
    )
    .await;
    actix_test::call_service(&app, request.to_request()).await
}

fn order_request(key: Option<&str>, body: &str) -> actix_test::TestRequest {
    let mut request = actix_test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header((CONTENT_TYPE, "application/json"))
        .set_payload(body.to_owned());
    if let Some(key) = key {
        request = request.insert_header(("Idempotency-Key", key));
    }
    request
}

fn returning(outcome: GuardedOutcome) -> MockCreateOrderCommand {
    let mut command = MockCreateOrderCommand::new();
    command
        .expect_create_order()
        .times(1)
        .return_once(move |_| Ok(outcome));
    command
}

fn never_called() -> MockCreateOrderCommand {
    let mut command = MockCreateOrderCommand::new();
    command.expect_create_order().never();
    command
}

fn header(res: &actix_web::dev::ServiceResponse, name: actix_web::http::header::HeaderName) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

#[rstest]
#[case::completed(GuardedOutcome::Completed(RecordedResponse::new(201, CREATED_BODY)), StatusCode::CREATED)]
#[case::replayed(GuardedOutcome::Replayed(RecordedResponse::new(201, CREATED_BODY)), StatusCode::CREATED)]
#[case::existing_order(GuardedOutcome::Completed(RecordedResponse::new(200, CREATED_BODY)), StatusCode::OK)]
#[actix_web::test]
async fn recorded_responses_are_sent_verbatim(
    #[case] outcome: GuardedOutcome,
    #[case] expected: StatusCode,
) {
    let res = call(
        returning(outcome),
        order_request(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":100}"#),
    )
    .await;

    assert_eq!(res.status(), expected);
    assert_eq!(header(&res, CACHE_CONTROL).as_deref(), Some("no-store"));
    assert_eq!(header(&res, CONTENT_TYPE).as_deref(), Some("application/json"));
    let body = actix_test::read_body(res).await;
    assert_eq!(body.as_ref(), CREATED_BODY.as_bytes());
}

#[actix_web::test]
async fn command_receives_validated_request() {
    let mut command = MockCreateOrderCommand::new();
    command
        .expect_create_order()
        .withf(|request| {
            request.idempotency_key.as_str() == "key-1"
                && request.order_number.as_str() == "A-1"
                && request.amount_cents == 100
        })
        .times(1)
        .return_once(|_| Ok(GuardedOutcome::Completed(RecordedResponse::new(201, "{}"))));

    let res = call(
        command,
        order_request(Some(" key-1 "), r#"{"orderNumber":"  A-1 ","amountCents":100}"#),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[rstest]
#[case(Duration::from_secs(599), "599")]
#[case(Duration::from_millis(1500), "2")]
#[case(Duration::from_millis(200), "1")]
#[actix_web::test]
async fn in_progress_maps_to_conflict_with_retry_after(
    #[case] retry_after: Duration,
    #[case] expected: &str,
) {
    let res = call(
        returning(GuardedOutcome::InProgress { retry_after }),
        order_request(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":100}"#),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(header(&res, RETRY_AFTER).as_deref(), Some(expected));
    assert_eq!(header(&res, CACHE_CONTROL).as_deref(), Some("no-store"));
    assert!(actix_test::read_body(res).await.is_empty());
}

#[actix_web::test]
async fn payload_conflict_maps_to_bodiless_conflict() {
    let res = call(
        returning(GuardedOutcome::PayloadConflict),
        order_request(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":100}"#),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(header(&res, RETRY_AFTER).is_none());
    assert!(actix_test::read_body(res).await.is_empty());
}

#[rstest]
#[case::missing_key(None, r#"{"orderNumber":"A-1","amountCents":100}"#, "missing Idempotency-Key header")]
#[case::blank_key(Some("   "), r#"{"orderNumber":"A-1","amountCents":100}"#, "empty Idempotency-Key header")]
#[case::malformed_json(Some("key-1"), r#"{"orderNumber":"#, "invalid order body")]
#[case::missing_field(Some("key-1"), r#"{"orderNumber":"A-1"}"#, "invalid order body")]
#[case::blank_order_number(Some("key-1"), r#"{"orderNumber":" ","amountCents":100}"#, "order number must not be empty")]
#[case::zero_amount(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":0}"#, "amount must be a positive")]
#[actix_web::test]
async fn invalid_requests_are_rejected(
    #[case] key: Option<&str>,
    #[case] body: &str,
    #[case] message: &str,
) {
    let res = call(never_called(), order_request(key, body)).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&res, CACHE_CONTROL).as_deref(), Some("no-store"));
    let error: Error = actix_test::read_body_json(res).await;
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert!(
        error.message().contains(message),
        "unexpected message: {}",
        error.message()
    );
}

#[actix_web::test]
async fn validation_errors_name_the_field() {
    let res = call(
        never_called(),
        order_request(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":-5}"#),
    )
    .await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"], json!({"field": "amountCents"}));
}

#[rstest]
#[case(None)]
#[case(Some("text/plain"))]
#[actix_web::test]
async fn non_json_bodies_are_unsupported(#[case] content_type: Option<&str>) {
    let mut request = actix_test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(("Idempotency-Key", "key-1"))
        .set_payload(r#"{"orderNumber":"A-1","amountCents":100}"#);
    if let Some(content_type) = content_type {
        request = request.insert_header((CONTENT_TYPE, content_type));
    }

    let res = call(never_called(), request).await;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[actix_web::test]
async fn content_type_match_ignores_case_and_parameters() {
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(("Idempotency-Key", "key-1"))
        .insert_header((CONTENT_TYPE, "Application/JSON; charset=utf-8"))
        .set_payload(r#"{"orderNumber":"A-1","amountCents":100}"#);

    let res = call(
        returning(GuardedOutcome::Completed(RecordedResponse::new(201, "{}"))),
        request,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[rstest]
#[case(Error::service_unavailable("lease store unavailable"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("lease store query failed"), StatusCode::INTERNAL_SERVER_ERROR)]
#[actix_web::test]
async fn command_errors_map_to_server_errors(#[case] error: Error, #[case] expected: StatusCode) {
    let mut command = MockCreateOrderCommand::new();
    command
        .expect_create_order()
        .times(1)
        .return_once(move |_| Err(error));

    let res = call(
        command,
        order_request(Some("key-1"), r#"{"orderNumber":"A-1","amountCents":100}"#),
    )
    .await;
    assert_eq!(res.status(), expected);
}

#[rstest]
#[case(Duration::ZERO, 1)]
#[case(Duration::from_secs(3), 3)]
#[case(Duration::from_nanos(3_000_000_001), 4)]
fn retry_after_rounds_up(#[case] delay: Duration, #[case] expected: u64) {
    assert_eq!(retry_after_secs(delay), expected);
}
