// ============================================================================
// Domain Layer
// ============================================================================
//
// Order model, validation rules, storage seam and the order service.
// Transport concerns (queue consumption, HTTP) live outside this module.
//
// ============================================================================

pub mod order;
