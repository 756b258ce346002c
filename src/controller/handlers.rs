use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::{http::StatusCode, web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::order::{CustomerId, OrderService, PageRequest};
use crate::metrics::Metrics;

use super::dto::{decimal_value, ApiResponse, OrderResponse};
use super::errors::ApiError;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

pub async fn list_customer_orders(
    state: web::Data<AppState>,
    path: web::Path<CustomerId>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let customer_id = path.into_inner();
    let result = load_customer_orders(&state.service, customer_id, query.into_inner()).await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    state.metrics.record_order_query(status.as_u16());

    let body = result?;
    tracing::debug!(
        customer_id = customer_id,
        returned = body.data().len(),
        total_elements = body.pagination().total_elements,
        "Served customer orders"
    );
    Ok(HttpResponse::Ok().json(body))
}

async fn load_customer_orders(
    service: &OrderService,
    customer_id: CustomerId,
    query: PageQuery,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let request = PageRequest::new(query.page, query.page_size)?;

    let page = service.find_by_customer(customer_id, request).await?;

    let total_value =
        decimal_value(page.total_on_orders).map_err(|e| ApiError::Internal(e.to_string()))?;
    let summary = BTreeMap::from([("totalOnOrders".to_string(), total_value)]);

    Ok(ApiResponse::from_page(summary, page).map(OrderResponse::from))
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "orderms",
        "checkTime": Utc::now().to_rfc3339(),
    }))
}

pub async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let text = state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(text))
}
