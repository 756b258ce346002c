use clap::{Args, Parser, ValueEnum};

// ============================================================================
// Configuration - CLI flags with environment fallbacks
// ============================================================================
//
// A .env file in the working directory is loaded first when present. Flags
// win over environment variables, which win over defaults.
//
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "orderms", about = "Order management service", long_about = None)]
pub struct AppConfig {
    #[command(flatten)]
    pub http: HttpConfig,

    #[command(flatten)]
    pub kafka: KafkaConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Args)]
pub struct HttpConfig {
    /// HTTP bind address
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub http_host: String,

    /// HTTP port
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,
}

#[derive(Debug, Args)]
pub struct KafkaConfig {
    /// Kafka/Redpanda bootstrap servers
    #[arg(long, env = "KAFKA_BROKERS", default_value = "127.0.0.1:9092")]
    pub brokers: String,

    /// Consumer group id
    #[arg(long, env = "KAFKA_GROUP_ID", default_value = "orderms")]
    pub group_id: String,

    /// Topic carrying order-created events
    #[arg(long, env = "ORDER_CREATED_TOPIC", default_value = "order-created")]
    pub order_created_topic: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Process-local store, lost on restart
    Memory,

    /// ScyllaDB
    Scylla,
}

#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Order store backend
    #[arg(long, env = "ORDER_STORAGE", value_enum, default_value_t = StorageKind::Memory)]
    pub storage: StorageKind,

    /// ScyllaDB contact point
    #[arg(long, env = "SCYLLA_NODE", default_value = "127.0.0.1:9042")]
    pub scylla_node: String,

    /// ScyllaDB keyspace
    #[arg(long, env = "SCYLLA_KEYSPACE", default_value = "orders_ks")]
    pub keyspace: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Compact,

    /// One JSON object per line
    Json,
}

#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log filter directives (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info,orderms=debug")]
    pub log_level: String,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
