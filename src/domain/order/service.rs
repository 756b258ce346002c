use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;

use crate::listener::dto::OrderCreatedEvent;
use crate::metrics::Metrics;

use super::entity::OrderEntity;
use super::errors::OrderError;
use super::repository::OrderRepository;
use super::value_objects::CustomerId;

// ============================================================================
// Order Service
// ============================================================================
//
// Write side: OrderCreatedEvent -> OrderEntity -> repository
// Read side:  customer orders, paged, plus their exact total
//
// ============================================================================

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid order: {0}")]
    Invalid(#[from] OrderError),

    #[error("Order storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("Order totals of customer {0} exceed the decimal range")]
    TotalOverflow(CustomerId),
}

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, OrderError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(OrderError::InvalidPageSize {
                requested: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn offset(&self) -> usize {
        self.page as usize * self.page_size as usize
    }
}

/// One page of a customer's orders. `total_elements` and `total_on_orders`
/// cover every order of the customer and come from the same read as `orders`.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderEntity>,
    pub request: PageRequest,
    pub total_elements: u64,
    pub total_on_orders: Decimal,
}

impl OrderPage {
    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.request.page_size()))
    }
}

/// Exact sum of the order totals, or None if it leaves the decimal range
fn sum_totals(orders: &[OrderEntity]) -> Option<Decimal> {
    orders
        .iter()
        .try_fold(Decimal::ZERO, |sum, order| sum.checked_add(order.total()))
}

pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Build, validate and persist the order described by the event.
    ///
    /// The event must carry its orderId; saving the same id again overwrites
    /// the order, so a retried or redelivered event never creates a second one.
    pub async fn save(&self, event: OrderCreatedEvent) -> Result<OrderEntity, ServiceError> {
        let started = Instant::now();
        let order_id = event.order_id.ok_or(OrderError::MissingOrderId)?;

        let entity = OrderEntity::new(order_id, event.customer_id, event.total, event.order_items());
        entity.validate()?;

        tracing::debug!(
            order_id = order_id,
            customer_id = entity.customer_id(),
            "Persisting order"
        );

        self.repository
            .save(&entity)
            .await
            .map_err(ServiceError::Storage)?;

        self.metrics
            .record_order_saved(started.elapsed().as_secs_f64());

        tracing::info!(
            order_id = entity.order_id(),
            customer_id = entity.customer_id(),
            total = %entity.total(),
            item_count = entity.items().len(),
            "Order saved"
        );

        Ok(entity)
    }

    /// One page of the customer's orders with the count and exact total of all of them
    pub async fn find_by_customer(
        &self,
        customer_id: CustomerId,
        request: PageRequest,
    ) -> Result<OrderPage, ServiceError> {
        let orders = self
            .repository
            .find_by_customer(customer_id)
            .await
            .map_err(ServiceError::Storage)?;

        let total_on_orders =
            sum_totals(&orders).ok_or(ServiceError::TotalOverflow(customer_id))?;
        let total_elements = orders.len() as u64;
        let orders = orders
            .into_iter()
            .skip(request.offset())
            .take(request.page_size() as usize)
            .collect();

        Ok(OrderPage {
            orders,
            request,
            total_elements,
            total_on_orders,
        })
    }
}
