use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::CqlDecimal;

use crate::domain::order::{CustomerId, OrderEntity, OrderId, OrderItem, OrderRepository};

use super::decimal;

// ============================================================================
// ScyllaDB Order Store
// ============================================================================
//
// Orders live in one table partitioned by customer and clustered by order id,
// which is the only read path the service has. Saving the same order id again
// overwrites the row. Items are kept as JSON text with prices as decimal
// strings.
//
// ============================================================================

const CREATE_ORDERS_BY_CUSTOMER: &str = "CREATE TABLE IF NOT EXISTS orders_by_customer (
        customer_id bigint,
        order_id bigint,
        total decimal,
        items text,
        created_at timestamp,
        PRIMARY KEY ((customer_id), order_id)
    ) WITH CLUSTERING ORDER BY (order_id ASC)";

const INSERT_ORDER_BY_CUSTOMER: &str = "INSERT INTO orders_by_customer \
     (customer_id, order_id, total, items, created_at) VALUES (?, ?, ?, ?, ?)";

type OrderRow = (OrderId, CustomerId, CqlDecimal, String, DateTime<Utc>);

pub struct ScyllaOrderRepository {
    session: Arc<Session>,
}

impl ScyllaOrderRepository {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Connect to `node`, create the schema if missing and switch to `keyspace`
    pub async fn connect(node: &str, keyspace: &str) -> Result<Self> {
        tracing::info!(node = %node, "Connecting to ScyllaDB...");
        let session: Session = SessionBuilder::new()
            .known_node(node)
            .build()
            .await
            .with_context(|| format!("Failed to connect to ScyllaDB at {node}"))?;

        ensure_schema(&session, keyspace).await?;

        Ok(Self::new(Arc::new(session)))
    }
}

pub async fn ensure_schema(session: &Session, keyspace: &str) -> Result<()> {
    if keyspace.is_empty() || !keyspace.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid keyspace name: {keyspace:?}");
    }

    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
            ),
            &[],
        )
        .await?;

    session.use_keyspace(keyspace, false).await?;

    session.query_unpaged(CREATE_ORDERS_BY_CUSTOMER, &[]).await?;

    tracing::info!(keyspace = %keyspace, "Order schema ready");
    Ok(())
}

#[async_trait]
impl OrderRepository for ScyllaOrderRepository {
    async fn save(&self, order: &OrderEntity) -> Result<()> {
        let items = serde_json::to_string(order.items())?;
        let total = decimal::to_cql(order.total());

        self.session
            .query_unpaged(
                INSERT_ORDER_BY_CUSTOMER,
                (
                    order.customer_id(),
                    order.order_id(),
                    total,
                    items,
                    order.created_at(),
                ),
            )
            .await
            .with_context(|| format!("Failed to persist order {}", order.order_id()))?;

        tracing::debug!(
            order_id = order.order_id(),
            customer_id = order.customer_id(),
            "Persisted order"
        );
        Ok(())
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<OrderEntity>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT order_id, customer_id, total, items, created_at
                 FROM orders_by_customer
                 WHERE customer_id = ?",
                (customer_id,),
            )
            .await?;

        let rows_result = result.into_rows_result()?;
        let mut orders = Vec::new();
        for row in rows_result.rows::<OrderRow>()? {
            orders.push(order_from_row(row?)?);
        }

        tracing::debug!(customer_id = customer_id, count = orders.len(), "Loaded customer orders");
        Ok(orders)
    }
}

fn order_from_row(row: OrderRow) -> Result<OrderEntity> {
    let (order_id, customer_id, total, items_json, created_at) = row;

    let total = decimal::from_cql(&total)
        .with_context(|| format!("Stored total of order {order_id} is unreadable"))?;
    let items: Vec<OrderItem> = serde_json::from_str(&items_json)
        .with_context(|| format!("Stored items of order {order_id} are unreadable"))?;

    Ok(OrderEntity::new(order_id, customer_id, total, items).with_created_at(created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn stored_row(items_json: &str) -> OrderRow {
        (
            1001,
            7,
            decimal::to_cql(Decimal::from_str("19.999").unwrap()),
            items_json.to_string(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_order_from_row_restores_exact_values() {
        let order = order_from_row(stored_row(
            r#"[{"product":"pen","quantity":2,"price":"9.9995"}]"#,
        ))
        .unwrap();

        assert_eq!(order.order_id(), 1001);
        assert_eq!(order.customer_id(), 7);
        assert_eq!(order.total().to_string(), "19.999");
        assert_eq!(order.items()[0].product(), "pen");
        assert_eq!(order.items()[0].price().to_string(), "9.9995");
        assert_eq!(
            order.created_at(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_stored_items_match_entity_serialization() {
        let order = OrderEntity::new(
            1,
            7,
            Decimal::from_str("5.00").unwrap(),
            vec![OrderItem::new("pen", 2, Decimal::from_str("2.50").unwrap())],
        );
        let items_json = serde_json::to_string(order.items()).unwrap();

        let restored = order_from_row((
            order.order_id(),
            order.customer_id(),
            decimal::to_cql(order.total()),
            items_json,
            order.created_at(),
        ))
        .unwrap();

        assert_eq!(restored.items(), order.items());
        assert_eq!(restored.total().to_string(), "5.00");
    }

    #[test]
    fn test_order_from_row_rejects_corrupt_items() {
        let error = order_from_row(stored_row("not json")).unwrap_err();
        assert!(error.to_string().contains("order 1001"));
    }
}
