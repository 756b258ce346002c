// ============================================================================
// Listener Module
// ============================================================================
//
// - dto/           - order-created wire schema and its codec
// - message/       - delivery and message envelopes
// - order_created/ - the listener that forwards events to the order service
//
// ============================================================================

pub mod dto;
pub mod message;
pub mod order_created;

pub use message::Delivery;
pub use order_created::OrderCreatedListener;
