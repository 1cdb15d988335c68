use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::checkout::ConfirmedIntent;
use super::ClientError;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::OrderId;
use crate::service::NewOrder;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Order endpoints the checkout flow calls.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn create_order(&self, request: &NewOrder) -> Result<Order, ClientError>;
    async fn create_payment_intent(&self, order_id: OrderId) -> Result<PaymentIntentResponse, ClientError>;
    async fn pay_order(&self, order_id: OrderId, intent: &ConfirmedIntent) -> Result<Order, ClientError>;
    async fn cancel_order(&self, order_id: OrderId) -> Result<OrderId, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelEnvelope {
    cancelled_order_id: OrderId,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

impl HttpStorefrontApi {
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), token: token.into() }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path)).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = response.json::<ErrorEnvelope>().await.ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("request failed with {status}"));
        Err(ClientError::Api { status: status.as_u16(), message })
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    async fn create_order(&self, request: &NewOrder) -> Result<Order, ClientError> {
        let envelope: OrderEnvelope = Self::send(self.request(Method::POST, "/api/orders").json(request)).await?;
        Ok(envelope.order)
    }

    async fn create_payment_intent(&self, order_id: OrderId) -> Result<PaymentIntentResponse, ClientError> {
        Self::send(self.request(Method::POST, "/api/payment/create-payment-intent").json(&json!({ "orderId": order_id }))).await
    }

    async fn pay_order(&self, order_id: OrderId, intent: &ConfirmedIntent) -> Result<Order, ClientError> {
        let path = format!("/api/orders/{order_id}/pay");
        let envelope: OrderEnvelope = Self::send(self.request(Method::PUT, &path).json(&json!({ "paymentIntent": intent }))).await?;
        Ok(envelope.order)
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<OrderId, ClientError> {
        let path = format!("/api/orders/{order_id}/cancel");
        let envelope: CancelEnvelope = Self::send(self.request(Method::DELETE, &path)).await?;
        Ok(envelope.cancelled_order_id)
    }
}
