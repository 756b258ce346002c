use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod controller;
mod domain;
mod listener;
mod messaging;
mod metrics;
mod persistence;
mod utils;

use config::{AppConfig, LogFormat, StorageKind};
use controller::AppState;
use domain::order::{InMemoryOrderRepository, OrderRepository, OrderService};
use listener::OrderCreatedListener;
use messaging::RedpandaConsumer;
use persistence::ScyllaOrderRepository;

fn init_tracing(config: &AppConfig) {
    // RUST_LOG is read by clap too, so the parsed value already reflects it
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info,orderms=debug"));

    match config.logging.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(fmt::layer().compact().with_target(true).with_thread_ids(true))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .with(filter)
            .init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    tracing::info!("🚀 Starting order service");

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Order store ===
    let repository: Arc<dyn OrderRepository> = match config.storage.storage {
        StorageKind::Memory => {
            tracing::warn!("Using in-memory order store; orders are lost on restart");
            Arc::new(InMemoryOrderRepository::new())
        }
        StorageKind::Scylla => Arc::new(
            ScyllaOrderRepository::connect(&config.storage.scylla_node, &config.storage.keyspace)
                .await?,
        ),
    };

    let service = Arc::new(OrderService::new(repository, metrics.clone()));

    // === 3. Order-created consumer ===
    let listener = Arc::new(OrderCreatedListener::new(service.clone()));
    let consumer = RedpandaConsumer::new(&config.kafka, listener, metrics.clone())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(async move {
        if let Err(e) = consumer.run(shutdown_rx).await {
            tracing::error!("Consumer error: {:#}", e);
        }
    });

    // === 4. HTTP API (runs until SIGINT/SIGTERM) ===
    let state = AppState {
        service,
        metrics: metrics.clone(),
    };
    let served = controller::start_http_server(state, &config.http.http_host, config.http.http_port).await;

    tracing::info!("Shutting down order-created consumer");
    _ = shutdown_tx.send(true);
    if let Err(e) = consumer_task.await {
        tracing::error!("Consumer task failed: {}", e);
    }

    served?;
    tracing::info!("👋 Order service stopped");
    Ok(())
}
