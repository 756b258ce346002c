use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::order::{OrderError, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request: {0}")]
    Invalid(#[from] OrderError),

    #[error("Order storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Invalid(e) => ApiError::Invalid(e),
            ServiceError::Storage(e) => ApiError::Storage(e),
            e @ ServiceError::TotalOverflow(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::BadRequest(m) => {
                tracing::warn!(error = %m, "Rejecting request");
                HttpResponse::BadRequest().json(json!({ "error": m }))
            }
            ApiError::Invalid(e) => {
                tracing::warn!(error = %e, "Rejecting request");
                HttpResponse::BadRequest().json(json!({ "error": e.to_string() }))
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %format!("{e:#}"), "Responding with storage error");
                HttpResponse::InternalServerError().json(json!({ "error": "Order storage unavailable" }))
            }
            ApiError::Internal(m) => {
                tracing::error!(error = %m, "Responding with internal error");
                HttpResponse::InternalServerError().json(json!({ "error": "An internal error occurred" }))
            }
        }
    }
}
