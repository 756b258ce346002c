use actix_web::{web, App, HttpServer};

use super::errors::ApiError;
use super::handlers::{self, AppState};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route(
        "/customers/{customer_id}/orders",
        web::get().to(handlers::list_customer_orders),
    )
    .route("/health", web::get().to(handlers::health))
    .route("/metrics", web::get().to(handlers::metrics));
}

/// Serve the order API, health and metrics until the server is stopped
pub async fn start_http_server(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    tracing::info!("Starting HTTP server on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await
}
