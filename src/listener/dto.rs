use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::order::{CustomerId, OrderError, OrderId, OrderItem};

// ============================================================================
// Order Created Event - wire schema of the order-created queue
// ============================================================================
//
// {
//   "orderId": 1001,             optional, integer
//   "customerId": 7,             required, integer
//   "total": 5.00,               required, number or string, exact decimal
//   "items": [                   required, may be empty
//     { "product": "pen", "quantity": 2, "price": 2.50 }
//   ]
// }
//
// Decimals are read from the literal JSON token, never through f64, and a
// value that does not fit a Decimal without rounding is rejected. Unknown
// fields are ignored.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub customer_id: CustomerId,
    #[serde(
        serialize_with = "rust_decimal::serde::arbitrary_precision::serialize",
        deserialize_with = "exact_decimal"
    )]
    pub total: Decimal,
    pub items: Vec<OrderItemEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItemEvent {
    pub product: String,
    pub quantity: i32,
    #[serde(
        serialize_with = "rust_decimal::serde::arbitrary_precision::serialize",
        deserialize_with = "exact_decimal"
    )]
    pub price: Decimal,
}

/// Decimal from a JSON number or string, failing instead of rounding
fn exact_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let literal = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text,
        other => return Err(D::Error::custom(format!("expected a decimal, found {other}"))),
    };

    if literal.contains(['e', 'E']) {
        return Decimal::from_scientific(&literal).map_err(D::Error::custom);
    }
    Decimal::from_str_exact(&literal).map_err(D::Error::custom)
}

impl OrderCreatedEvent {
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items.iter().map(OrderItem::from).collect()
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if self.total < Decimal::ZERO {
            return Err(OrderError::NegativeTotal(self.total));
        }

        self.items
            .iter()
            .try_for_each(|item| OrderItem::from(item).validate())
    }
}

impl From<&OrderItemEvent> for OrderItem {
    fn from(event: &OrderItemEvent) -> Self {
        OrderItem::new(event.product.clone(), event.quantity, event.price)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Message payload is empty")]
    EmptyPayload,

    #[error("Malformed order-created payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid order-created payload: {0}")]
    Invalid(#[from] OrderError),
}

/// Decode and validate an order-created message body
pub fn decode_order_created(payload: &[u8]) -> Result<OrderCreatedEvent, DecodeError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyPayload);
    }

    let event: OrderCreatedEvent = serde_json::from_slice(payload)?;
    event.validate()?;

    Ok(event)
}
