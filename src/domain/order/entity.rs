use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::{CustomerId, OrderId, OrderItem};

// ============================================================================
// Order Entity - Persisted Aggregate
// ============================================================================
//
// Created by OrderService::save and mutated only through it. One writer per
// order id; concurrent writers to the same id resolve as last-write-wins in
// the store.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEntity {
    order_id: OrderId,
    customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::str")]
    total: Decimal,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
}

impl OrderEntity {
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        total: Decimal,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            total,
            items,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn set_order_id(&mut self, order_id: OrderId) {
        self.order_id = order_id;
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn set_customer_id(&mut self, customer_id: CustomerId) {
        self.customer_id = customer_id;
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn set_total(&mut self, total: Decimal) {
        self.total = total;
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<OrderItem>) {
        self.items = items;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamps keep millisecond precision, matching what the store holds
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at.trunc_subsecs(3);
        self
    }

    /// Validate business rules before the entity reaches the store
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.total < Decimal::ZERO {
            return Err(OrderError::NegativeTotal(self.total));
        }

        for item in &self.items {
            item.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn pen() -> OrderItem {
        OrderItem::new("pen", 2, Decimal::from_str("2.50").unwrap())
    }

    #[test]
    fn test_entity_accessors() {
        let entity = OrderEntity::new(1, 42, Decimal::from_str("19.99").unwrap(), vec![pen()]);

        assert_eq!(entity.order_id(), 1);
        assert_eq!(entity.customer_id(), 42);
        assert_eq!(entity.total().to_string(), "19.99");
        assert_eq!(entity.items(), &[pen()]);
    }

    #[test]
    fn test_entity_setters() {
        let mut entity = OrderEntity::new(1, 42, Decimal::ONE, vec![]);
        entity.set_order_id(2);
        entity.set_customer_id(43);
        entity.set_total(Decimal::TEN);
        entity.set_items(vec![pen()]);

        assert_eq!(entity.order_id(), 2);
        assert_eq!(entity.customer_id(), 43);
        assert_eq!(entity.total(), Decimal::TEN);
        assert_eq!(entity.items().len(), 1);
    }

    #[test]
    fn test_validate_rejects_negative_total() {
        let total = Decimal::new(-500, 2);
        let entity = OrderEntity::new(1, 7, total, vec![pen()]);
        assert_eq!(entity.validate(), Err(OrderError::NegativeTotal(total)));
    }

    #[test]
    fn test_validate_checks_every_item() {
        let entity = OrderEntity::new(
            1,
            7,
            Decimal::ONE,
            vec![pen(), OrderItem::new("", 1, Decimal::ONE)],
        );
        assert_eq!(entity.validate(), Err(OrderError::EmptyProduct));
    }

    #[test]
    fn test_created_at_has_millisecond_precision() {
        let entity = OrderEntity::new(1, 7, Decimal::ONE, vec![]);
        assert_eq!(entity.created_at().timestamp_subsec_nanos() % 1_000_000, 0);

        let stamped = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let entity = entity.with_created_at(stamped);
        assert_eq!(entity.created_at().timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_empty_item_list_is_valid() {
        let entity = OrderEntity::new(1, 7, Decimal::ZERO, vec![]);
        assert!(entity.validate().is_ok());
    }
}
