use rust_decimal::Decimal;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order id is missing")]
    MissingOrderId,

    #[error("Order item product cannot be empty")]
    EmptyProduct,

    #[error("Invalid item quantity: {0}")]
    NegativeQuantity(i32),

    #[error("Invalid item price: {0}")]
    NegativePrice(Decimal),

    #[error("Invalid order total: {0}")]
    NegativeTotal(Decimal),

    #[error("Page size must be between 1 and {max}, got {requested}")]
    InvalidPageSize { requested: u32, max: u32 },
}
