use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// - Order-created message consumption (outcome, latency)
// - Retry attempts and redeliveries
// - Order saves
// - Order queries served over HTTP
//
// Exposed in text format on /metrics
// ============================================================================

/// Outcome label of a consumed message
pub mod outcome {
    pub const SAVED: &str = "saved";
    pub const SKIPPED: &str = "skipped";
    pub const REDELIVERED: &str = "redelivered";
}

pub struct Metrics {
    registry: Registry,

    // Consumption Metrics
    pub messages_consumed: IntCounterVec,
    pub message_processing_duration: HistogramVec,
    pub retry_attempts_total: IntCounter,

    // Order Metrics
    pub orders_saved: IntCounter,
    pub order_save_duration: Histogram,
    pub order_queries: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let messages_consumed = IntCounterVec::new(
            Opts::new("order_created_messages_total", "Order-created messages consumed"),
            &["outcome"],
        )?;
        registry.register(Box::new(messages_consumed.clone()))?;

        let message_processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "order_created_processing_duration_seconds",
                "Time from delivery to acknowledgement decision",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(message_processing_duration.clone()))?;

        let retry_attempts_total = IntCounter::new(
            "order_created_retry_attempts_total",
            "Delivery attempts beyond the first",
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let orders_saved = IntCounter::new("orders_saved_total", "Orders persisted")?;
        registry.register(Box::new(orders_saved.clone()))?;

        let order_save_duration = Histogram::with_opts(
            HistogramOpts::new("order_save_duration_seconds", "Order save latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(order_save_duration.clone()))?;

        let order_queries = IntCounterVec::new(
            Opts::new("order_queries_total", "Customer order queries served"),
            &["status"],
        )?;
        registry.register(Box::new(order_queries.clone()))?;

        Ok(Self {
            registry,
            messages_consumed,
            message_processing_duration,
            retry_attempts_total,
            orders_saved,
            order_save_duration,
            order_queries,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_message(&self, outcome: &str, duration_secs: f64) {
        self.messages_consumed.with_label_values(&[outcome]).inc();
        self.message_processing_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    pub fn record_retry_attempt(&self) {
        self.retry_attempts_total.inc();
    }

    pub fn record_order_saved(&self, duration_secs: f64) {
        self.orders_saved.inc();
        self.order_save_duration.observe(duration_secs);
    }

    pub fn record_order_query(&self, status: u16) {
        self.order_queries
            .with_label_values(&[&status.to_string()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_saved(0.01);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_message_by_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.record_message(outcome::SAVED, 0.05);
        metrics.record_message(outcome::SAVED, 0.02);
        metrics.record_message(outcome::SKIPPED, 0.01);

        assert_eq!(metrics.messages_consumed.with_label_values(&[outcome::SAVED]).get(), 2);
        assert_eq!(metrics.messages_consumed.with_label_values(&[outcome::SKIPPED]).get(), 1);
        assert_eq!(
            metrics.messages_consumed.with_label_values(&[outcome::REDELIVERED]).get(),
            0
        );
    }

    #[test]
    fn test_record_order_saved() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_saved(0.003);
        metrics.record_order_saved(0.004);

        assert_eq!(metrics.orders_saved.get(), 2);
        assert_eq!(metrics.order_save_duration.get_sample_count(), 2);
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_retry_attempt();
        metrics.record_order_query(200);

        let text = metrics.encode().unwrap();

        assert!(text.contains("order_created_retry_attempts_total 1"));
        assert!(text.contains(r#"order_queries_total{status="200"} 1"#));
    }
}
