// ============================================================================
// Persistence Module
// ============================================================================
//
// - decimal/      - rust_decimal <-> CQL decimal codec
// - scylla_store/ - ScyllaDB-backed OrderRepository
//
// The in-memory store lives next to the repository trait in the domain.
//
// ============================================================================

pub mod decimal;
mod scylla_store;

pub use scylla_store::ScyllaOrderRepository;
