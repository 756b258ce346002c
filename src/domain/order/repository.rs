use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::entity::OrderEntity;
use super::value_objects::{CustomerId, OrderId};

// ============================================================================
// Order Repository - storage seam for OrderEntity
// ============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert or overwrite the order with the entity's order id
    async fn save(&self, order: &OrderEntity) -> Result<()>;

    /// All orders of a customer, ascending by order id
    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<OrderEntity>>;
}

/// Process-local store used for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<OrderId, OrderEntity>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl InMemoryOrderRepository {
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &OrderEntity) -> Result<()> {
        self.orders
            .write()
            .await
            .insert(order.order_id(), order.clone());
        Ok(())
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<OrderEntity>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect())
    }
}
