//! Order lifecycle orchestration.
//!
//! Every operation is one read-modify-write of a single order record. There is
//! no cross-order coordination and no locking: concurrent admin updates are
//! last-write-wins, and of two racing deletes the loser sees `NotFound`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::aggregates::{LineItem, Order, OrderStatus};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{OrderId, PaymentMethod, ShippingAddress};
use crate::identity::Actor;
use crate::notify::Notifier;
use crate::payment::PaymentIntentAdapter;
use crate::store::OrderStore;
use crate::{EcommerceError, Result};

/// Checkout submission. Prices are the client's snapshot; the total is derived server side.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default, alias = "lineItems")]
    #[validate]
    pub order_items: Vec<LineItem>,
    #[validate]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

pub struct OrderLifecycleService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<PaymentIntentAdapter>,
    notifier: Arc<dyn Notifier>,
}

impl OrderLifecycleService {
    pub fn new(orders: Arc<dyn OrderStore>, payments: Arc<PaymentIntentAdapter>, notifier: Arc<dyn Notifier>) -> Self {
        Self { orders, payments, notifier }
    }

    pub fn payments(&self) -> &PaymentIntentAdapter { &self.payments }

    #[instrument(skip(self, actor, request), fields(user = %actor.id))]
    pub async fn create_order(&self, actor: &Actor, request: NewOrder) -> Result<Order> {
        if request.order_items.is_empty() {
            return Err(EcommerceError::InvalidRequest("No order items found".into()));
        }
        request.validate()?;

        let order = Order::place(actor.id.clone(), request.order_items, request.shipping_address, request.payment_method)?;
        self.orders.insert(&order).await?;
        info!(order_id = %order.id, total = %order.total_price, method = order.payment_method.as_str(), "order placed");

        if actor.email.is_none() {
            warn!(order_id = %order.id, "user email missing, confirmation will have no recipient");
        }
        self.publish(OrderEvent::Placed {
            order_id: order.id,
            placed_by: order.placed_by.clone(),
            recipient: actor.email.clone(),
            total: order.total_price,
            status: order.order_status,
        }).await;
        Ok(order)
    }

    pub async fn get_order(&self, actor: &Actor, id: OrderId) -> Result<Order> {
        let order = self.load(id).await?;
        if !actor.is_admin() && !order.is_owned_by(&actor.id) {
            return Err(EcommerceError::Forbidden("Not authorized to view this order".into()));
        }
        Ok(order)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Order>> {
        self.orders.list_by_owner(&actor.id).await
    }

    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Order>> {
        actor.require_admin()?;
        self.orders.list_all().await
    }

    #[instrument(skip(self, actor), fields(admin = %actor.id))]
    pub async fn transition_status(&self, actor: &Actor, id: OrderId, next: OrderStatus) -> Result<Order> {
        actor.require_admin()?;
        let mut order = self.load(id).await?;
        if next == OrderStatus::Cancelled && order.is_paid {
            // Refunds are handled outside this service.
            warn!(order_id = %id, "paid order cancelled, refund must be issued manually");
        }
        let event = order.transition(next)?;
        self.save(&order).await?;
        info!(order_id = %id, status = %next, "order status changed");
        self.publish(event).await;
        Ok(order)
    }

    /// Owner withdraws an unpaid order. The record is deleted, not archived.
    #[instrument(skip(self, actor), fields(user = %actor.id))]
    pub async fn cancel_own(&self, actor: &Actor, id: OrderId) -> Result<OrderId> {
        let order = self.load(id).await?;
        if !order.is_owned_by(&actor.id) {
            return Err(EcommerceError::Forbidden("Not authorized to cancel this order".into()));
        }
        order.ensure_cancellable()?;
        if !self.orders.delete_unpaid(id).await? {
            // Paid or removed since it was loaded.
            return match self.orders.get(id).await? {
                Some(current) => {
                    current.ensure_cancellable()?;
                    Err(EcommerceError::InvalidState("Order changed while cancelling, try again".into()))
                }
                None => Err(EcommerceError::NotFound(id)),
            };
        }
        info!(order_id = %id, "order cancelled by owner");
        self.publish(OrderEvent::Deleted { order_id: id, by_owner: true }).await;
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(admin = %actor.id))]
    pub async fn delete_any(&self, actor: &Actor, id: OrderId) -> Result<OrderId> {
        actor.require_admin()?;
        if !self.orders.delete(id).await? {
            return Err(EcommerceError::NotFound(id));
        }
        info!(order_id = %id, "order deleted by admin");
        self.publish(OrderEvent::Deleted { order_id: id, by_owner: false }).await;
        Ok(id)
    }

    /// Marks an order paid once the gateway confirms the intent. Whatever the
    /// client relayed, only the gateway's own view of `intent_id` is trusted.
    #[instrument(skip(self, actor), fields(user = %actor.id))]
    pub async fn record_payment(&self, actor: &Actor, id: OrderId, intent_id: &str) -> Result<Order> {
        let mut order = self.load(id).await?;
        if !actor.is_admin() && !order.is_owned_by(&actor.id) {
            return Err(EcommerceError::Forbidden("Not authorized to pay for this order".into()));
        }
        order.ensure_payable()?;

        let result = self.payments.verified_payment(&order, intent_id).await?;
        let event = order.mark_paid(result)?;
        self.save(&order).await?;
        info!(order_id = %id, intent_id, "order paid");
        self.publish(event).await;
        Ok(order)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.orders.get(id).await?.ok_or(EcommerceError::NotFound(id))
    }

    async fn save(&self, order: &Order) -> Result<()> {
        if !self.orders.update(order).await? {
            return Err(EcommerceError::NotFound(order.id));
        }
        Ok(())
    }

    async fn publish(&self, event: OrderEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            warn!(order_id = %event.order_id(), kind = event.kind(), error = %e, "notification failed");
        }
    }
}
