use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Order identifier
pub type OrderId = i64;

/// Customer identifier
pub type CustomerId = i64;

/// One product line embedded in an order. Has no identity of its own.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    product: String,
    quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

impl OrderItem {
    pub fn new(product: impl Into<String>, quantity: i32, price: Decimal) -> Self {
        Self {
            product: product.into(),
            quantity,
            price,
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn set_product(&mut self, product: impl Into<String>) {
        self.product = product.into();
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: i32) {
        self.quantity = quantity;
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if self.product.trim().is_empty() {
            return Err(OrderError::EmptyProduct);
        }
        if self.quantity < 0 {
            return Err(OrderError::NegativeQuantity(self.quantity));
        }
        if self.price < Decimal::ZERO {
            return Err(OrderError::NegativePrice(self.price));
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
