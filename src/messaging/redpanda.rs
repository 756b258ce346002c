use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::OwnedMessage,
    Message as _, Offset, TopicPartitionList,
};
use tokio::sync::watch;

use crate::config::KafkaConfig;
use crate::listener::{Delivery, OrderCreatedListener};
use crate::metrics::{outcome, Metrics};
use crate::utils::{retry_on_transient, RetryConfig, RetryResult};

// ============================================================================
// Order-Created Consumer
// ============================================================================
//
// Pulls deliveries from the order-created topic and runs each one through the
// listener. Offsets are committed by hand:
//
// - saved                        -> commit
// - permanent failure            -> log, commit (the message is skipped)
// - transient failure, exhausted -> no commit, seek back so the broker
//                                   delivers the same offset again
//
// ============================================================================

const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// What happens to a delivery's offset once processing has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Commit,
    Rewind,
}

/// Offset action and outcome label for a processing result
fn settle<T, E>(result: &RetryResult<T, E>) -> (Settlement, &'static str) {
    match result {
        RetryResult::Success(_) => (Settlement::Commit, outcome::SAVED),
        RetryResult::PermanentFailure(_) => (Settlement::Commit, outcome::SKIPPED),
        RetryResult::Failed(_) => (Settlement::Rewind, outcome::REDELIVERED),
    }
}

pub struct RedpandaConsumer {
    consumer: StreamConsumer,
    topic: String,
    listener: Arc<OrderCreatedListener>,
    metrics: Arc<Metrics>,
    retry_config: RetryConfig,
}

impl RedpandaConsumer {
    pub fn new(
        config: &KafkaConfig,
        listener: Arc<OrderCreatedListener>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .context("Failed to create Redpanda consumer")?;

        consumer
            .subscribe(&[config.order_created_topic.as_str()])
            .with_context(|| format!("Failed to subscribe to {}", config.order_created_topic))?;

        tracing::info!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            topic = %config.order_created_topic,
            "Subscribed to order-created queue"
        );

        Ok(Self {
            consumer,
            topic: config.order_created_topic.clone(),
            listener,
            metrics,
            retry_config: RetryConfig::default(),
        })
    }

    /// Consume until `shutdown` flips to true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            let message = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                received = self.consumer.recv() => match received {
                    Ok(message) => message.detach(),
                    Err(e) => {
                        tracing::warn!(error = %e, topic = %self.topic, "Failed to receive message");
                        continue;
                    }
                },
            };

            self.process(message).await;
        }

        tracing::info!(topic = %self.topic, "Order-created consumer stopped");
        Ok(())
    }

    async fn process(&self, message: OwnedMessage) {
        let started = Instant::now();
        let delivery = Delivery {
            topic: message.topic(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key(),
            payload: message.payload(),
        };

        let listener = self.listener.as_ref();
        let metrics = self.metrics.as_ref();
        let delivery_ref = &delivery;

        let result = retry_on_transient(&self.retry_config, move |attempt| {
            if attempt > 1 {
                metrics.record_retry_attempt();
            }
            listener.on_delivery(delivery_ref)
        })
        .await;

        let (settlement, outcome) = settle(&result);
        match &result {
            RetryResult::Success(order) => tracing::debug!(
                order_id = order.order_id(),
                partition = delivery.partition,
                offset = delivery.offset,
                "Delivery processed"
            ),
            RetryResult::PermanentFailure(error) => tracing::error!(
                error = %error,
                partition = delivery.partition,
                offset = delivery.offset,
                "Skipping order-created message that cannot be processed"
            ),
            RetryResult::Failed(error) => tracing::error!(
                error = %error,
                partition = delivery.partition,
                offset = delivery.offset,
                "Order-created message failed, leaving it for redelivery"
            ),
        }

        match settlement {
            Settlement::Commit => self.commit(&delivery),
            Settlement::Rewind => self.rewind(&delivery).await,
        }

        self.metrics
            .record_message(outcome, started.elapsed().as_secs_f64());
    }

    fn commit(&self, delivery: &Delivery<'_>) {
        let mut offsets = TopicPartitionList::new();
        let next = Offset::Offset(delivery.offset + 1);

        let committed = offsets
            .add_partition_offset(delivery.topic, delivery.partition, next)
            .and_then(|_| self.consumer.commit(&offsets, CommitMode::Async));

        if let Err(e) = committed {
            // The next successful commit on this partition covers this offset
            tracing::warn!(
                error = %e,
                partition = delivery.partition,
                offset = delivery.offset,
                "Failed to commit offset"
            );
        }
    }

    async fn rewind(&self, delivery: &Delivery<'_>) {
        if let Err(e) = self.consumer.seek(
            delivery.topic,
            delivery.partition,
            Offset::Offset(delivery.offset),
            SEEK_TIMEOUT,
        ) {
            tracing::error!(
                error = %e,
                partition = delivery.partition,
                offset = delivery.offset,
                "Failed to seek back for redelivery"
            );
        }

        // Give the store time to recover before the same offset comes back
        tokio::time::sleep(self.retry_config.max_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{InMemoryOrderRepository, OrderService};

    fn unreachable_broker() -> KafkaConfig {
        KafkaConfig {
            brokers: "127.0.0.1:1".to_string(),
            group_id: "orderms-test".to_string(),
            order_created_topic: "order-created".to_string(),
        }
    }

    fn consumer() -> RedpandaConsumer {
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()), metrics.clone());
        let listener = Arc::new(OrderCreatedListener::new(Arc::new(service)));

        RedpandaConsumer::new(&unreachable_broker(), listener, metrics).unwrap()
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let consumer = consumer();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let stopped = tokio::time::timeout(Duration::from_secs(10), consumer.run(shutdown_rx)).await;

        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_is_dropped() {
        let consumer = consumer();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        let stopped = tokio::time::timeout(Duration::from_secs(10), consumer.run(shutdown_rx)).await;

        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[test]
    fn test_saved_delivery_is_committed() {
        let result: RetryResult<u32, &str> = RetryResult::Success(1);
        assert_eq!(settle(&result), (Settlement::Commit, outcome::SAVED));
    }

    #[test]
    fn test_poison_delivery_is_committed_and_skipped() {
        let result: RetryResult<u32, &str> = RetryResult::PermanentFailure("malformed");
        assert_eq!(settle(&result), (Settlement::Commit, outcome::SKIPPED));
    }

    #[test]
    fn test_exhausted_delivery_is_rewound() {
        let result: RetryResult<u32, &str> = RetryResult::Failed("timeout");
        assert_eq!(settle(&result), (Settlement::Rewind, outcome::REDELIVERED));
    }
}
