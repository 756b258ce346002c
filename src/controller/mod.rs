// ============================================================================
// Controller Module - HTTP read side
// ============================================================================
//
// - dto/      - OrderResponse, ApiResponse<T>, PaginationResponse
// - errors/   - ApiError -> HTTP status and JSON body
// - handlers/ - customer orders, health, metrics
// - server/   - routes and the actix-web server
//
// ============================================================================

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::start_http_server;
