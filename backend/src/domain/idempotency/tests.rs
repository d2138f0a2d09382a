//! Unit tests for idempotency primitives.

use super::*;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

// IdempotencyKey tests

#[test]
fn idempotency_key_trims_surrounding_whitespace() {
    let key = IdempotencyKey::new("  retry-1\t").expect("valid key");
    assert_eq!(key.as_ref(), "retry-1");
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
fn idempotency_key_rejects_blank_input(#[case] input: &str) {
    assert_eq!(
        IdempotencyKey::new(input),
        Err(IdempotencyKeyValidationError::EmptyKey)
    );
}

#[test]
fn idempotency_key_accepts_maximum_length() {
    let input = "k".repeat(IdempotencyKey::MAX_LEN);
    assert!(IdempotencyKey::new(&input).is_ok());
}

#[test]
fn idempotency_key_rejects_overlong_input() {
    let input = "k".repeat(IdempotencyKey::MAX_LEN + 1);
    assert_eq!(
        IdempotencyKey::new(&input),
        Err(IdempotencyKeyValidationError::TooLong {
            max: IdempotencyKey::MAX_LEN,
            actual: IdempotencyKey::MAX_LEN + 1,
        })
    );
}

#[test]
fn idempotency_key_deserialisation_validates() {
    let parsed: Result<IdempotencyKey, _> = serde_json::from_str("\"  \"");
    assert!(parsed.is_err());
}

// GuardedOperation tests

#[test]
fn guarded_operation_parses_its_own_name() {
    for operation in GuardedOperation::ALL {
        assert_eq!(operation.as_str().parse::<GuardedOperation>(), Ok(operation));
    }
}

#[test]
fn guarded_operation_rejects_unknown_names() {
    let error = "DeleteOrder"
        .parse::<GuardedOperation>()
        .expect_err("unknown operation");
    assert_eq!(error.input, "DeleteOrder");
}

// PayloadHash tests

#[test]
fn payload_hash_rejects_wrong_length() {
    assert_eq!(
        PayloadHash::try_from_bytes(&[0u8; 31]),
        Err(PayloadHashError::InvalidLength {
            expected: 32,
            actual: 31,
        })
    );
}

#[test]
fn payload_hash_display_is_lowercase_hex() {
    let hash = PayloadHash::from_bytes([0xab; 32]);
    assert_eq!(hash.to_string(), "ab".repeat(32));
}

// Canonicalisation tests

#[test]
fn canonicalize_and_hash_ignores_key_order_at_every_depth() {
    let a = json!({"z": 1, "outer": {"b": [1, {"y": 2, "x": 1}], "a": null}});
    let b = json!({"outer": {"a": null, "b": [1, {"x": 1, "y": 2}]}, "z": 1});
    assert_eq!(canonicalize_and_hash(&a), canonicalize_and_hash(&b));
}

#[test]
fn canonicalize_and_hash_preserves_array_order() {
    let a = json!({"arr": [1, 2, 3]});
    let b = json!({"arr": [3, 2, 1]});
    assert_ne!(canonicalize_and_hash(&a), canonicalize_and_hash(&b));
}

#[test]
fn canonicalize_and_hash_matches_known_digest() {
    // sha256 of the compact form `{"a":1,"b":2}`
    let hash = canonicalize_and_hash(&json!({"b": 2, "a": 1})).expect("hash");
    assert_eq!(
        hash.to_hex(),
        "43258cff783fe7036d8a43033f830adfc60ec037382473548ac742b888292777"
    );
}

#[test]
fn hash_payload_agrees_with_value_hash() {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Body {
        order_number: &'static str,
        amount_cents: i64,
    }

    let typed = hash_payload(&Body {
        order_number: "A-1",
        amount_cents: 1250,
    })
    .expect("hash typed");
    let untyped =
        canonicalize_and_hash(&json!({"amountCents": 1250, "orderNumber": "A-1"})).expect("hash");
    assert_eq!(typed, untyped);
}

// IdempotencyConfig tests

#[rstest]
#[case(0, 60, IdempotencyConfigError::ZeroTtl)]
#[case(60, 0, IdempotencyConfigError::ZeroProcessingTimeout)]
#[case(60, 60, IdempotencyConfigError::TimeoutNotBelowTtl {
    processing_timeout: Duration::from_secs(60),
    ttl: Duration::from_secs(60),
})]
fn idempotency_config_rejects_invalid_timings(
    #[case] ttl: u64,
    #[case] timeout: u64,
    #[case] expected: IdempotencyConfigError,
) {
    assert_eq!(IdempotencyConfig::from_secs(ttl, timeout), Err(expected));
}

#[test]
fn idempotency_config_accepts_timeout_below_ttl() {
    let config = IdempotencyConfig::from_secs(3600, 30).expect("valid config");
    assert_eq!(config.ttl(), Duration::from_secs(3600));
    assert_eq!(config.processing_timeout(), Duration::from_secs(30));
}

// Lease helpers

#[test]
fn lease_claim_expiry_saturates() {
    let now = chrono::DateTime::<chrono::Utc>::MAX_UTC - chrono::Duration::seconds(10);
    let scope = LeaseScope::new(
        GuardedOperation::CreateOrder,
        IdempotencyKey::new("k").expect("valid key"),
        PayloadHash::from_bytes([0; 32]),
    );
    let claim = LeaseClaim::new(scope, now, Duration::from_secs(3600));
    assert_eq!(claim.expires_at, chrono::DateTime::<chrono::Utc>::MAX_UTC);
}

#[test]
fn recorded_response_json_is_compact() {
    let response =
        RecordedResponse::json(201, &json!({"orderNumber": "A-1"})).expect("serialises");
    assert_eq!(response.body, r#"{"orderNumber":"A-1"}"#);
    assert_eq!(response.status_code, 201);
}

#[rstest]
#[case::clock_ahead(0, 5_000_000, 5_000_000)]
#[case::frozen_clock(0, 0, 1)]
#[case::clock_behind(0, -3_000_000, 1)]
fn next_updated_at_always_moves_forward(
    #[case] previous_us: i64,
    #[case] now_us: i64,
    #[case] expected_us: i64,
) {
    let base = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + chrono::Duration::days(20_000);
    let at = |micros: i64| base + chrono::Duration::microseconds(micros);
    assert_eq!(
        next_updated_at(at(previous_us), at(now_us)),
        at(expected_us)
    );
}
