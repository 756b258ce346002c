// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderItem, identifiers)
// - Entity (OrderEntity)
// - Errors (OrderError)
// - Identifier derivation for queued orders
// - Repository seam and in-memory store
// - Service (save + customer queries)
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod errors;
pub mod ids;
pub mod repository;
pub mod service;

pub use value_objects::*;
pub use entity::*;
pub use errors::*;
pub use ids::*;
pub use repository::*;
pub use service::*;
