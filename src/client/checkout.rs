use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use super::{CartStorage, CartStore, ClientError, PaymentIntentResponse, StorefrontApi};
use crate::domain::aggregates::Order;
use crate::domain::value_objects::{PaymentMethod, ShippingAddress};
use crate::service::NewOrder;

/// Intent as reported back by the gateway after card confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedIntent {
    pub id: String,
    pub status: String,
}

/// Card entry happens directly between the customer and the gateway.
#[async_trait]
pub trait CardConfirmer: Send + Sync {
    /// Returns the gateway's error message on decline or failure.
    async fn confirm_card_payment(&self, client_secret: &str) -> Result<ConfirmedIntent, String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayment {
    pub order: Order,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Cash on delivery: the order is placed and the cart cleared.
    Placed(Order),
    /// Card payment still to be confirmed; the cart is kept until it succeeds.
    AwaitingPayment(PendingPayment),
}

pub struct CheckoutSession<A, C> {
    api: A,
    card: C,
}

impl<A: StorefrontApi, C: CardConfirmer> CheckoutSession<A, C> {
    pub fn new(api: A, card: C) -> Self { Self { api, card } }

    pub fn api(&self) -> &A { &self.api }

    /// Submits the cart. On any failure the cart is left intact for a retry.
    pub async fn place_order<S: CartStorage>(
        &self,
        cart: &mut CartStore<S>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Placement, ClientError> {
        if shipping_address.validate().is_err() {
            return Err(ClientError::Validation("Please fill in all shipping address fields".into()));
        }
        if cart.is_empty() { return Err(ClientError::EmptyCart); }

        let request = NewOrder { order_items: cart.to_line_items(), shipping_address, payment_method };
        let order = self.api.create_order(&request).await?;

        if !payment_method.requires_online_payment() {
            cart.clear()?;
            info!(order_id = %order.id, "cash order placed");
            return Ok(Placement::Placed(order));
        }

        match self.api.create_payment_intent(order.id).await {
            Ok(PaymentIntentResponse { client_secret, .. }) => Ok(Placement::AwaitingPayment(PendingPayment { order, client_secret })),
            Err(e) => {
                self.compensate(&order).await;
                Err(e)
            }
        }
    }

    /// Confirms the card, then relays the intent so the server can verify it.
    /// A declined card deletes the pending order and keeps the cart.
    pub async fn complete_payment<S: CartStorage>(
        &self,
        cart: &mut CartStore<S>,
        pending: PendingPayment,
    ) -> Result<Order, ClientError> {
        let intent = match self.card.confirm_card_payment(&pending.client_secret).await {
            Ok(intent) => intent,
            Err(message) => {
                warn!(order_id = %pending.order.id, %message, "card payment failed");
                self.compensate(&pending.order).await;
                return Err(ClientError::Payment(message));
            }
        };

        let order = self.api.pay_order(pending.order.id, &intent).await?;
        cart.clear()?;
        info!(order_id = %order.id, intent_id = %intent.id, "order paid");
        Ok(order)
    }

    async fn compensate(&self, order: &Order) {
        if let Err(e) = self.api.cancel_order(order.id).await {
            error!(order_id = %order.id, error = %e, "failed to cancel unpaid order");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryCartStorage;
    use crate::domain::aggregates::{CartItem, LineItem, OrderStatus};
    use crate::domain::value_objects::{OrderId, UserId};
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        fail_intent: bool,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
        fn record(&self, call: String) { self.calls.lock().unwrap().push(call); }
    }

    #[async_trait]
    impl StorefrontApi for FakeApi {
        async fn create_order(&self, request: &NewOrder) -> Result<Order, ClientError> {
            self.record("create".into());
            Order::place(UserId::new("alice"), request.order_items.clone(), request.shipping_address.clone(), request.payment_method)
                .map_err(|e| ClientError::Api { status: 400, message: e.to_string() })
        }

        async fn create_payment_intent(&self, _order_id: OrderId) -> Result<PaymentIntentResponse, ClientError> {
            self.record("intent".into());
            if self.fail_intent {
                return Err(ClientError::Api { status: 502, message: "gateway down".into() });
            }
            Ok(PaymentIntentResponse { client_secret: "pi_1_secret".into(), payment_intent_id: Some("pi_1".into()) })
        }

        async fn pay_order(&self, order_id: OrderId, intent: &ConfirmedIntent) -> Result<Order, ClientError> {
            self.record(format!("pay:{}", intent.id));
            Ok(paid_order(order_id))
        }

        async fn cancel_order(&self, order_id: OrderId) -> Result<OrderId, ClientError> {
            self.record("cancel".into());
            Ok(order_id)
        }
    }

    fn paid_order(order_id: OrderId) -> Order {
        let mut order = Order::place(
            UserId::new("alice"),
            vec![LineItem {
                product_ref: "p1".into(), name: "Widget".into(), image_url: None, unit_price: Decimal::ONE, quantity: 1,
            }],
            ShippingAddress::default(),
            PaymentMethod::OnlineCard,
        ).unwrap();
        order.id = order_id;
        order.order_status = OrderStatus::Paid;
        order.is_paid = true;
        order
    }

    struct Card(Result<ConfirmedIntent, String>);

    #[async_trait]
    impl CardConfirmer for Card {
        async fn confirm_card_payment(&self, client_secret: &str) -> Result<ConfirmedIntent, String> {
            assert_eq!(client_secret, "pi_1_secret");
            self.0.clone()
        }
    }

    fn approved() -> Card { Card(Ok(ConfirmedIntent { id: "pi_1".into(), status: "succeeded".into() })) }
    fn declined() -> Card { Card(Err("Your card was declined.".into())) }

    fn address() -> ShippingAddress {
        ShippingAddress { street: "1 Main St".into(), city: "Lagos".into(), postal_code: "100001".into(), country: "NG".into() }
    }

    fn cart() -> CartStore<MemoryCartStorage> {
        let mut cart = CartStore::open(MemoryCartStorage::default());
        cart.add(CartItem { id: "p1".into(), name: "Widget".into(), unit_price: Decimal::new(2500, 2), image_url: None, quantity: 2 }).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_cash_checkout_clears_cart() {
        let session = CheckoutSession::new(FakeApi::default(), approved());
        let mut cart = cart();
        let placement = session.place_order(&mut cart, address(), PaymentMethod::CashOnDelivery).await.unwrap();
        match placement {
            Placement::Placed(order) => assert_eq!(order.total_price, Decimal::new(5000, 2)),
            other => panic!("unexpected placement: {other:?}"),
        }
        assert!(cart.is_empty());
        assert_eq!(session.api().calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_card_checkout_success() {
        let session = CheckoutSession::new(FakeApi::default(), approved());
        let mut cart = cart();
        let Placement::AwaitingPayment(pending) = session.place_order(&mut cart, address(), PaymentMethod::OnlineCard).await.unwrap() else {
            panic!("expected pending payment");
        };
        assert!(!cart.is_empty());
        let order = session.complete_payment(&mut cart, pending).await.unwrap();
        assert!(order.is_paid);
        assert!(cart.is_empty());
        assert_eq!(session.api().calls(), vec!["create", "intent", "pay:pi_1"]);
    }

    #[tokio::test]
    async fn test_declined_card_cancels_order_and_keeps_cart() {
        let session = CheckoutSession::new(FakeApi::default(), declined());
        let mut cart = cart();
        let Placement::AwaitingPayment(pending) = session.place_order(&mut cart, address(), PaymentMethod::OnlineCard).await.unwrap() else {
            panic!("expected pending payment");
        };
        let err = session.complete_payment(&mut cart, pending).await.unwrap_err();
        assert!(matches!(err, ClientError::Payment(ref m) if m == "Your card was declined."));
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(session.api().calls(), vec!["create", "intent", "cancel"]);
    }

    #[tokio::test]
    async fn test_intent_failure_cancels_order() {
        let session = CheckoutSession::new(FakeApi { fail_intent: true, ..Default::default() }, approved());
        let mut cart = cart();
        let err = session.place_order(&mut cart, address(), PaymentMethod::OnlineCard).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 502, .. }));
        assert!(!cart.is_empty());
        assert_eq!(session.api().calls(), vec!["create", "intent", "cancel"]);
    }

    #[tokio::test]
    async fn test_client_side_validation() {
        let session = CheckoutSession::new(FakeApi::default(), approved());
        let mut cart = cart();
        let mut bad = address();
        bad.postal_code.clear();
        assert!(matches!(session.place_order(&mut cart, bad, PaymentMethod::CashOnDelivery).await, Err(ClientError::Validation(_))));

        let mut empty = CartStore::open(MemoryCartStorage::default());
        assert!(matches!(session.place_order(&mut empty, address(), PaymentMethod::CashOnDelivery).await, Err(ClientError::EmptyCart)));
        assert!(session.api().calls().is_empty());
    }
}
