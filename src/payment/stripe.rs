use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{IntentRequest, PaymentGateway, PaymentIntent, ORDER_ID_METADATA};
use crate::{EcommerceError, Result};

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Payment intents over the Stripe REST API. No retries: failures surface as `GatewayError`.
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self> {
        if config.secret_key.is_empty() {
            return Err(EcommerceError::GatewayError("Stripe secret key not configured".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EcommerceError::GatewayError(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent> {
        let status = response.status();
        if status.is_success() {
            return response.json::<PaymentIntent>().await
                .map_err(|e| EcommerceError::GatewayError(format!("unreadable intent: {e}")));
        }
        let message = response.json::<StripeErrorBody>().await.ok()
            .and_then(|body| body.error.message)
            .unwrap_or_else(|| format!("gateway returned {status}"));
        error!(%status, %message, "Stripe request failed");
        Err(EcommerceError::GatewayError(message))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        let metadata_key = format!("metadata[{ORDER_ID_METADATA}]");
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            (metadata_key.as_str(), request.order_id.to_string()),
        ];
        debug!(order_id = %request.order_id, amount = request.amount, "creating payment intent");
        let response = self.client
            .post(self.url("payment_intents"))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| EcommerceError::GatewayError(e.to_string()))?;
        Self::read_intent(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        if intent_id.is_empty() || !intent_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(EcommerceError::InvalidRequest(format!("Malformed payment intent id: {intent_id:?}")));
        }
        let response = self.client
            .get(self.url(&format!("payment_intents/{intent_id}")))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| EcommerceError::GatewayError(e.to_string()))?;
        Self::read_intent(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_secret_key() {
        assert!(matches!(StripeGateway::new(StripeConfig::default()), Err(EcommerceError::GatewayError(_))));
    }

    #[test]
    fn test_intent_deserializes_stripe_payload() {
        let payload = r#"{"id":"pi_123","object":"payment_intent","amount":5000,"currency":"usd",
            "client_secret":"pi_123_secret_abc","status":"succeeded","metadata":{"order_id":"x"}}"#;
        let intent: PaymentIntent = serde_json::from_str(payload).unwrap();
        assert_eq!(intent.status, super::super::IntentStatus::Succeeded);
        assert_eq!(intent.order_id(), Some("x"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_intent_id() {
        let gateway = StripeGateway::new(StripeConfig { secret_key: "sk_test".into(), ..Default::default() }).unwrap();
        let err = gateway.retrieve_intent("../customers").await.unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidRequest(_)));
    }
}
