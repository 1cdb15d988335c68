use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::{IntentRequest, IntentStatus, PaymentGateway, PaymentIntent};
use crate::domain::aggregates::{Order, PaymentResult};
use crate::domain::value_objects::{to_minor_units, OrderId};
use crate::identity::Actor;
use crate::store::OrderStore;
use crate::{EcommerceError, Result};

/// What the client needs to finish a card payment against the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentHandle {
    pub client_secret: String,
    pub intent_id: String,
}

/// Sizes gateway intents from stored orders and re-verifies them before payment is trusted.
/// Never mutates orders.
pub struct PaymentIntentAdapter {
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentIntentAdapter {
    pub fn new(orders: Arc<dyn OrderStore>, gateway: Arc<dyn PaymentGateway>, currency: impl Into<String>) -> Self {
        Self { orders, gateway, currency: currency.into().to_lowercase() }
    }

    pub fn currency(&self) -> &str { &self.currency }

    pub async fn create_intent(&self, actor: &Actor, order_id: OrderId) -> Result<IntentHandle> {
        let order = self.orders.get(order_id).await?.ok_or(EcommerceError::NotFound(order_id))?;
        if !actor.is_admin() && !order.is_owned_by(&actor.id) {
            return Err(EcommerceError::Forbidden("Not authorized to pay for this order".into()));
        }
        if order.is_paid {
            return Err(EcommerceError::InvalidState("Order is already paid".into()));
        }
        if !order.payment_method.requires_online_payment() {
            return Err(EcommerceError::InvalidState("Order is not payable online".into()));
        }

        let amount = minor_amount(&order)?;
        let intent = self.gateway
            .create_intent(&IntentRequest { order_id, amount, currency: self.currency.clone() })
            .await?;
        let client_secret = intent.client_secret.clone()
            .ok_or_else(|| EcommerceError::GatewayError("gateway returned no client secret".into()))?;
        info!(%order_id, intent_id = %intent.id, amount, "payment intent created");
        Ok(IntentHandle { client_secret, intent_id: intent.id })
    }

    /// Current gateway view of an intent.
    pub async fn confirm_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        self.gateway.retrieve_intent(intent_id).await
    }

    /// Re-fetches the intent and checks it actually settles `order`.
    pub async fn verified_payment(&self, order: &Order, intent_id: &str) -> Result<PaymentResult> {
        let intent = self.confirm_intent(intent_id).await?;
        if intent.status != IntentStatus::Succeeded {
            warn!(order_id = %order.id, intent_id, status = intent.status.as_str(), "payment not successful");
            return Err(EcommerceError::GatewayError("Payment not successful".into()));
        }
        if let Some(tagged) = intent.order_id() {
            if tagged != order.id.to_string() {
                warn!(order_id = %order.id, intent_id, tagged, "intent belongs to another order");
                return Err(EcommerceError::GatewayError("Payment intent does not belong to this order".into()));
            }
        }
        let expected = minor_amount(order)?;
        if intent.amount != expected || !intent.currency.eq_ignore_ascii_case(&self.currency) {
            warn!(order_id = %order.id, intent_id, paid = intent.amount, expected, "payment amount mismatch");
            return Err(EcommerceError::GatewayError("Payment amount does not match order total".into()));
        }
        Ok(intent.to_payment_result())
    }
}

fn minor_amount(order: &Order) -> Result<i64> {
    to_minor_units(order.total_price)
        .ok_or_else(|| EcommerceError::InvalidState(format!("Order total {} cannot be charged", order.total_price)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::LineItem;
    use crate::domain::value_objects::{PaymentMethod, ShippingAddress, UserId};
    use crate::payment::InMemoryGateway;
    use crate::store::InMemoryOrderStore;
    use rust_decimal::Decimal;

    async fn setup(method: PaymentMethod) -> (PaymentIntentAdapter, Arc<InMemoryGateway>, Order) {
        let store = Arc::new(InMemoryOrderStore::new());
        let gateway = Arc::new(InMemoryGateway::new());
        let order = Order::place(
            UserId::new("alice"),
            vec![LineItem { product_ref: "p1".into(), name: "Widget".into(), image_url: None, unit_price: Decimal::new(2500, 2), quantity: 2 }],
            ShippingAddress { street: "1 Main St".into(), city: "Lagos".into(), postal_code: "100001".into(), country: "NG".into() },
            method,
        ).unwrap();
        store.insert(&order).await.unwrap();
        (PaymentIntentAdapter::new(store, gateway.clone(), "USD"), gateway, order)
    }

    #[tokio::test]
    async fn test_intent_sized_in_minor_units() {
        let (adapter, gateway, order) = setup(PaymentMethod::OnlineCard).await;
        let handle = adapter.create_intent(&Actor::customer("alice"), order.id).await.unwrap();
        let intent = gateway.retrieve_intent(&handle.intent_id).await.unwrap();
        assert_eq!(intent.amount, 5000);
        assert_eq!(intent.currency, "usd");
        assert_eq!(intent.order_id(), Some(order.id.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_create_intent_rejections() {
        let (adapter, _, order) = setup(PaymentMethod::CashOnDelivery).await;
        let err = adapter.create_intent(&Actor::customer("alice"), order.id).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidState(_)));
        let err = adapter.create_intent(&Actor::customer("mallory"), order.id).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Forbidden(_)));
        let err = adapter.create_intent(&Actor::customer("alice"), OrderId::generate()).await.unwrap_err();
        assert!(matches!(err, EcommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let (adapter, gateway, order) = setup(PaymentMethod::OnlineCard).await;
        gateway.set_unavailable(true);
        let err = adapter.create_intent(&Actor::customer("alice"), order.id).await.unwrap_err();
        assert!(matches!(err, EcommerceError::GatewayError(_)));
    }

    #[tokio::test]
    async fn test_verified_payment_checks_status_and_amount() {
        let (adapter, gateway, order) = setup(PaymentMethod::OnlineCard).await;
        let handle = adapter.create_intent(&Actor::customer("alice"), order.id).await.unwrap();
        assert!(adapter.verified_payment(&order, &handle.intent_id).await.is_err());

        gateway.settle(&handle.intent_id, IntentStatus::Succeeded);
        let result = adapter.verified_payment(&order, &handle.intent_id).await.unwrap();
        assert_eq!(result.amount, 5000);
        assert_eq!(result.status, "succeeded");

        gateway.insert(PaymentIntent {
            id: "pi_cheap".into(), client_secret: None, status: IntentStatus::Succeeded,
            amount: 100, currency: "usd".into(), metadata: Default::default(),
        });
        assert!(matches!(adapter.verified_payment(&order, "pi_cheap").await, Err(EcommerceError::GatewayError(_))));
    }
}
