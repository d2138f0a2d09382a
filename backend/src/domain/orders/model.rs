//! Order entity and the request/response shapes of order creation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::idempotency::{IdempotencyKey, PayloadHash, PayloadHashError, hash_payload};

/// Validation errors for order input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    #[error("order number must not be empty")]
    EmptyOrderNumber,
    #[error("order number must be at most {max} characters, got {actual}")]
    OrderNumberTooLong { max: usize, actual: usize },
    #[error("amount must be a positive number of cents, got {actual}")]
    NonPositiveAmount { actual: i64 },
}

/// Natural key of an order, unique across the order table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Maximum order number length in characters.
    pub const MAX_LEN: usize = 64;

    /// Validate and construct an [`OrderNumber`] from trimmed input.
    ///
    /// # Example
    ///
    /// ```
    /// # use orders_backend::domain::orders::OrderNumber;
    /// let number = OrderNumber::new(" A-1001 ").expect("valid order number");
    /// assert_eq!(number.as_str(), "A-1001");
    /// ```
    pub fn new(value: impl AsRef<str>) -> Result<Self, OrderValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(OrderValidationError::EmptyOrderNumber);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LEN {
            return Err(OrderValidationError::OrderNumberTooLong {
                max: Self::MAX_LEN,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_amount(amount_cents: i64) -> Result<i64, OrderValidationError> {
    if amount_cents <= 0 {
        return Err(OrderValidationError::NonPositiveAmount {
            actual: amount_cents,
        });
    }
    Ok(amount_cents)
}

/// A persisted order.
///
/// ## Invariants
/// - `amount_cents` is strictly positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: Uuid,
    order_number: OrderNumber,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: Uuid,
        order_number: OrderNumber,
        amount_cents: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderValidationError> {
        Ok(Self {
            id,
            order_number,
            amount_cents: validate_amount(amount_cents)?,
            created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn amount_cents(&self) -> i64 {
        self.amount_cents
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Result of "create or return existing" on the order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCreation {
    /// The order was inserted by this call.
    Created(Order),
    /// An order with the same number already existed.
    Existing(Order),
}

impl OrderCreation {
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::Created(order) | Self::Existing(order) => order,
        }
    }
}

/// Validated order creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub idempotency_key: IdempotencyKey,
    pub order_number: OrderNumber,
    pub amount_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload<'a> {
    order_number: &'a str,
    amount_cents: i64,
}

impl CreateOrderRequest {
    /// Build a request, rejecting non-positive amounts.
    pub fn new(
        idempotency_key: IdempotencyKey,
        order_number: OrderNumber,
        amount_cents: i64,
    ) -> Result<Self, OrderValidationError> {
        Ok(Self {
            idempotency_key,
            order_number,
            amount_cents: validate_amount(amount_cents)?,
        })
    }

    /// Fingerprint of the request body, independent of the key.
    ///
    /// Hashes `{"amountCents":..,"orderNumber":..}` in canonical form, so two
    /// requests differing only in whitespace around the order number share a
    /// fingerprint.
    pub fn payload_hash(&self) -> Result<PayloadHash, PayloadHashError> {
        hash_payload(&OrderPayload {
            order_number: self.order_number.as_str(),
            amount_cents: self.amount_cents,
        })
    }
}

/// JSON representation of an order returned by the API and recorded in the
/// lease for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    #[schema(example = "A-1001")]
    pub order_number: String,
    #[schema(example = 1250)]
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().to_string(),
            amount_cents: order.amount_cents(),
            created_at: order.created_at(),
        }
    }
}
