use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::order::{order_id_for_delivery, OrderEntity, OrderService, ServiceError};
use crate::utils::IsTransient;

use super::dto::{decode_order_created, DecodeError, OrderCreatedEvent};
use super::message::{Delivery, Message};

// ============================================================================
// Order Created Listener
// ============================================================================
//
// Bridges the order-created queue and the save operation. One log line and
// one save call per message; errors propagate to the consumer loop, which
// owns acknowledgement and redelivery.
//
// Events without an orderId get one derived from their partition and offset
// before the save, so repeated handling of one message writes one order.
//
// ============================================================================

/// The save operation the listener forwards events to
#[async_trait]
pub trait OrderSaver: Send + Sync {
    async fn save(&self, event: OrderCreatedEvent) -> Result<OrderEntity, ServiceError>;
}

#[async_trait]
impl OrderSaver for OrderService {
    async fn save(&self, event: OrderCreatedEvent) -> Result<OrderEntity, ServiceError> {
        OrderService::save(self, event).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Save(#[from] ServiceError),

    #[error("No order id can be derived for partition {partition} offset {offset}")]
    Unaddressable { partition: i32, offset: i64 },
}

impl IsTransient for ListenerError {
    fn is_transient(&self) -> bool {
        // Only the store can recover on its own; a bad payload stays bad
        matches!(self, ListenerError::Save(ServiceError::Storage(_)))
    }
}

pub struct OrderCreatedListener {
    saver: Arc<dyn OrderSaver>,
}

impl OrderCreatedListener {
    pub fn new(saver: Arc<dyn OrderSaver>) -> Self {
        Self { saver }
    }

    /// Decode a raw delivery and hand it to `listen`
    pub async fn on_delivery(&self, delivery: &Delivery<'_>) -> Result<OrderEntity, ListenerError> {
        let event = decode_order_created(delivery.payload.unwrap_or_default())?;
        self.listen(Message::from_delivery(delivery, event)).await
    }

    pub async fn listen(
        &self,
        message: Message<OrderCreatedEvent>,
    ) -> Result<OrderEntity, ListenerError> {
        tracing::info!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Message consumed: {}",
            message
        );

        let (partition, offset) = (message.partition, message.offset);
        let mut event = message.into_payload();
        if event.order_id.is_none() {
            let order_id = order_id_for_delivery(partition, offset)
                .ok_or(ListenerError::Unaddressable { partition, offset })?;
            event.order_id = Some(order_id);
        }

        let order = self.saver.save(event).await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{InMemoryOrderRepository, OrderError, OrderRepository};
    use crate::metrics::Metrics;
    use crate::utils::{retry_on_transient, RetryConfig, RetryResult};
    use anyhow::anyhow;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Records every event it is asked to save
    #[derive(Default)]
    struct RecordingSaver {
        saved: Mutex<Vec<OrderCreatedEvent>>,
        fail_with_storage_error: bool,
    }

    #[async_trait]
    impl OrderSaver for RecordingSaver {
        async fn save(&self, event: OrderCreatedEvent) -> Result<OrderEntity, ServiceError> {
            self.saved.lock().await.push(event.clone());
            if self.fail_with_storage_error {
                return Err(ServiceError::Storage(anyhow!("connection reset")));
            }
            Ok(OrderEntity::new(
                event.order_id.unwrap_or_default(),
                event.customer_id,
                event.total,
                event.order_items(),
            ))
        }
    }

    /// Applies the write, then reports a timeout for it once
    #[derive(Default)]
    struct WriteAppliedThenTimeout {
        inner: InMemoryOrderRepository,
        timed_out: AtomicBool,
    }

    #[async_trait]
    impl OrderRepository for WriteAppliedThenTimeout {
        async fn save(&self, order: &OrderEntity) -> anyhow::Result<()> {
            self.inner.save(order).await?;
            if !self.timed_out.swap(true, Ordering::SeqCst) {
                return Err(anyhow!("write timeout"));
            }
            Ok(())
        }

        async fn find_by_customer(&self, customer_id: i64) -> anyhow::Result<Vec<OrderEntity>> {
            self.inner.find_by_customer(customer_id).await
        }
    }

    fn delivery(payload: &[u8]) -> Delivery<'_> {
        Delivery {
            topic: "order-created",
            partition: 0,
            offset: 42,
            key: Some(b"7".as_slice()),
            payload: Some(payload),
        }
    }

    fn listener_over(repository: Arc<dyn OrderRepository>) -> OrderCreatedListener {
        let service = OrderService::new(repository, Arc::new(Metrics::new().unwrap()));
        OrderCreatedListener::new(Arc::new(service))
    }

    const PEN_ORDER: &[u8] =
        br#"{"customerId":7,"total":5.00,"items":[{"product":"pen","quantity":2,"price":2.50}]}"#;

    #[tokio::test]
    async fn test_listener_saves_each_message_exactly_once() {
        let saver = Arc::new(RecordingSaver::default());
        let listener = OrderCreatedListener::new(saver.clone());

        listener.on_delivery(&delivery(PEN_ORDER)).await.unwrap();

        let saved = saver.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].customer_id, 7);
        assert_eq!(saved[0].total, Decimal::from_str("5.00").unwrap());
        assert_eq!(saved[0].items[0].product, "pen");
        assert_eq!(saved[0].items[0].quantity, 2);
        assert_eq!(saved[0].items[0].price, Decimal::from_str("2.50").unwrap());
    }

    #[tokio::test]
    async fn test_missing_order_id_is_derived_from_delivery() {
        let saver = Arc::new(RecordingSaver::default());
        let listener = OrderCreatedListener::new(saver.clone());

        listener.on_delivery(&delivery(PEN_ORDER)).await.unwrap();

        let saved = saver.saved.lock().await;
        assert_eq!(saved[0].order_id, order_id_for_delivery(0, 42));
    }

    #[tokio::test]
    async fn test_supplied_order_id_is_kept() {
        let saver = Arc::new(RecordingSaver::default());
        let listener = OrderCreatedListener::new(saver.clone());

        let payload = br#"{"orderId":1001,"customerId":7,"total":0,"items":[]}"#;
        listener.on_delivery(&delivery(payload)).await.unwrap();

        assert_eq!(saver.saved.lock().await[0].order_id, Some(1001));
    }

    #[tokio::test]
    async fn test_retry_after_applied_write_keeps_one_order() {
        let repository = Arc::new(WriteAppliedThenTimeout::default());
        let listener = listener_over(repository.clone());
        let message = delivery(PEN_ORDER);
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        };

        let result = retry_on_transient(&config, |_| listener.on_delivery(&message)).await;
        assert!(matches!(result, RetryResult::Success(_)));

        // Broker redelivery of the same offset
        listener.on_delivery(&message).await.unwrap();

        let stored = repository.find_by_customer(7).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(Some(stored[0].order_id()), order_id_for_delivery(0, 42));
    }

    #[tokio::test]
    async fn test_unaddressable_delivery_is_permanent() {
        let saver = Arc::new(RecordingSaver::default());
        let listener = OrderCreatedListener::new(saver.clone());

        let mut odd = delivery(PEN_ORDER);
        odd.offset = -1;

        let error = listener.on_delivery(&odd).await.unwrap_err();

        assert!(matches!(error, ListenerError::Unaddressable { partition: 0, offset: -1 }));
        assert!(!error.is_transient());
        assert!(saver.saved.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_listener_does_not_save_undecodable_messages() {
        let saver = Arc::new(RecordingSaver::default());
        let listener = OrderCreatedListener::new(saver.clone());

        let result = listener.on_delivery(&delivery(b"not json")).await;

        assert!(matches!(result, Err(ListenerError::Decode(DecodeError::Malformed(_)))));
        assert!(!result.unwrap_err().is_transient());
        assert!(saver.saved.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_listener_treats_missing_payload_as_empty() {
        let listener = OrderCreatedListener::new(Arc::new(RecordingSaver::default()));

        let mut tombstone = delivery(b"");
        tombstone.payload = None;

        let result = listener.on_delivery(&tombstone).await;
        assert!(matches!(result, Err(ListenerError::Decode(DecodeError::EmptyPayload))));
    }

    #[tokio::test]
    async fn test_listener_propagates_save_failures_as_transient() {
        let saver = Arc::new(RecordingSaver {
            fail_with_storage_error: true,
            ..Default::default()
        });
        let listener = OrderCreatedListener::new(saver.clone());

        let result = listener.on_delivery(&delivery(PEN_ORDER)).await;

        let error = result.unwrap_err();
        assert!(error.is_transient());
        assert_eq!(saver.saved.lock().await.len(), 1);
    }

    #[test]
    fn test_validation_failures_are_permanent() {
        let error = ListenerError::Save(ServiceError::Invalid(OrderError::EmptyProduct));
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn test_listener_with_order_service_persists_order() {
        let repository = Arc::new(InMemoryOrderRepository::new());
        let listener = listener_over(repository.clone());

        let order = listener.on_delivery(&delivery(PEN_ORDER)).await.unwrap();

        let stored = repository.find_by_customer(7).await.unwrap();
        assert_eq!(stored, vec![order]);
        assert_eq!(stored[0].total().to_string(), "5.00");
        assert_eq!(stored[0].items().len(), 1);
    }
}
