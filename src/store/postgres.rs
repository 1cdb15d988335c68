use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::OrderStore;
use crate::domain::aggregates::{LineItem, Order, PaymentResult};
use crate::domain::value_objects::{OrderId, ShippingAddress, UserId};
use crate::{EcommerceError, Result};

/// One row per order; line items, address and payment result live in JSONB columns.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    placed_by: String,
    line_items: Json<Vec<LineItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    payment_result: Option<Json<PaymentResult>>,
    total_price: Decimal,
    order_status: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = EcommerceError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Self {
            id: OrderId::from(row.id),
            placed_by: UserId::new(row.placed_by),
            line_items: row.line_items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row.payment_method.parse().map_err(EcommerceError::StorageError)?,
            payment_result: row.payment_result.map(|r| r.0),
            total_price: row.total_price,
            order_status: row.order_status.parse().map_err(EcommerceError::StorageError)?,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, o: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, placed_by, line_items, shipping_address, payment_method, payment_result, total_price, order_status, is_paid, paid_at, is_delivered, delivered_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(o.id.as_uuid()).bind(o.placed_by.as_str()).bind(Json(&o.line_items)).bind(Json(&o.shipping_address))
            .bind(o.payment_method.as_str()).bind(o.payment_result.as_ref().map(Json)).bind(o.total_price)
            .bind(o.order_status.as_str()).bind(o.is_paid).bind(o.paid_at).bind(o.is_delivered).bind(o.delivered_at)
            .bind(o.created_at).bind(o.updated_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.db).await?
            .map(Order::try_from).transpose()
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE placed_by = $1 ORDER BY created_at DESC, id DESC")
            .bind(owner.as_str()).fetch_all(&self.db).await?;
        into_orders(rows)
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.db).await?;
        into_orders(rows)
    }

    async fn update(&self, o: &Order) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET payment_result = $2, order_status = $3, is_paid = $4, paid_at = $5, is_delivered = $6, delivered_at = $7, updated_at = $8 WHERE id = $1")
            .bind(o.id.as_uuid()).bind(o.payment_result.as_ref().map(Json)).bind(o.order_status.as_str())
            .bind(o.is_paid).bind(o.paid_at).bind(o.is_delivered).bind(o.delivered_at).bind(o.updated_at)
            .execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id.as_uuid()).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_unpaid(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND is_paid = FALSE")
            .bind(id.as_uuid()).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::value_objects::PaymentMethod;

    fn row(payment_method: &str, order_status: &str) -> OrderRow {
        let now = Utc::now();
        OrderRow {
            id: Uuid::now_v7(),
            placed_by: "alice".into(),
            line_items: Json(vec![LineItem {
                product_ref: "p1".into(), name: "Widget".into(), image_url: None, unit_price: Decimal::new(2500, 2), quantity: 2,
            }]),
            shipping_address: Json(ShippingAddress {
                street: "1 Main St".into(), city: "Lagos".into(), postal_code: "100001".into(), country: "NG".into(),
            }),
            payment_method: payment_method.into(),
            payment_result: Some(Json(PaymentResult { id: "pi_123".into(), status: "succeeded".into(), amount: 5000, currency: "usd".into() })),
            total_price: Decimal::new(5000, 2),
            order_status: order_status.into(),
            is_paid: true,
            paid_at: Some(now),
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_maps_to_order() {
        let row = row(PaymentMethod::OnlineCard.as_str(), OrderStatus::Paid.as_str());
        let id = row.id;
        let order = Order::try_from(row).unwrap();
        assert_eq!(order.id.as_uuid(), id);
        assert_eq!(order.placed_by, UserId::new("alice"));
        assert_eq!(order.payment_method, PaymentMethod::OnlineCard);
        assert_eq!(order.order_status, OrderStatus::Paid);
        assert_eq!(order.total_price, Decimal::new(5000, 2));
        assert_eq!(order.line_items[0].quantity, 2);
        assert_eq!(order.payment_result.map(|r| r.id), Some("pi_123".to_string()));
    }

    #[test]
    fn test_every_stored_enum_value_parses_back() {
        for status in OrderStatus::ALL {
            for method in [PaymentMethod::OnlineCard, PaymentMethod::CashOnDelivery] {
                let order = Order::try_from(row(method.as_str(), status.as_str())).unwrap();
                assert_eq!((order.order_status, order.payment_method), (status, method));
            }
        }
    }

    #[test]
    fn test_unknown_values_are_storage_errors() {
        let err = Order::try_from(row("OnlineCard", "Lost")).unwrap_err();
        assert!(matches!(err, EcommerceError::StorageError(_)));
        let err = Order::try_from(row("Barter", "Pending")).unwrap_err();
        assert!(matches!(err, EcommerceError::StorageError(_)));
    }
}
