use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::order::{CustomerId, OrderEntity, OrderId, OrderPage};

// ============================================================================
// Read-side DTOs
// ============================================================================
//
// {
//   "summary":    { "totalOnOrders": 19.99 },
//   "data":       [ { "orderId": 1, "customerId": 42, "total": 19.99 } ],
//   "pagination": { "page": 0, "pageSize": 10, "totalElements": 1, "totalPages": 1 }
// }
//
// Decimals are written as JSON numbers with every digit kept.
//
// ============================================================================

/// Projection of one order for API clients
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total: Decimal,
}

impl OrderResponse {
    pub fn from_entity(entity: &OrderEntity) -> Self {
        Self {
            order_id: entity.order_id(),
            customer_id: entity.customer_id(),
            total: entity.total(),
        }
    }
}

impl From<&OrderEntity> for OrderResponse {
    fn from(entity: &OrderEntity) -> Self {
        Self::from_entity(entity)
    }
}

impl From<OrderEntity> for OrderResponse {
    fn from(entity: OrderEntity) -> Self {
        Self::from_entity(&entity)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub page: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<&OrderPage> for PaginationResponse {
    fn from(page: &OrderPage) -> Self {
        Self {
            page: page.request.page(),
            page_size: page.request.page_size(),
            total_elements: page.total_elements,
            total_pages: page.total_pages(),
        }
    }
}

/// Envelope returned by list endpoints
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
    summary: BTreeMap<String, Value>,
    data: Vec<T>,
    pagination: PaginationResponse,
}

impl<T> ApiResponse<T> {
    pub fn new(summary: BTreeMap<String, Value>, data: Vec<T>, pagination: PaginationResponse) -> Self {
        Self {
            summary,
            data,
            pagination,
        }
    }

    pub fn summary(&self) -> &BTreeMap<String, Value> {
        &self.summary
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn pagination(&self) -> &PaginationResponse {
        &self.pagination
    }

    /// Convert every data element, keeping summary and pagination
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            summary: self.summary,
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl ApiResponse<OrderEntity> {
    pub fn from_page(summary: BTreeMap<String, Value>, page: OrderPage) -> Self {
        let pagination = PaginationResponse::from(&page);
        Self::new(summary, page.orders, pagination)
    }
}

/// A decimal as an exact JSON number
pub fn decimal_value(value: Decimal) -> Result<Value, serde_json::Error> {
    rust_decimal::serde::arbitrary_precision::serialize(&value, serde_json::value::Serializer)
}
