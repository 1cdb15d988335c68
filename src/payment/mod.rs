//! Payment gateway integration.
//!
//! Card details never reach this service: it creates an intent sized to the
//! order total, the client confirms the card directly with the gateway, and the
//! intent is then re-fetched here before the order is marked paid.

mod adapter;
mod memory;
mod stripe;

pub use adapter::{IntentHandle, PaymentIntentAdapter};
pub use memory::InMemoryGateway;
pub use stripe::{StripeConfig, StripeGateway};

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::PaymentResult;
use crate::domain::value_objects::OrderId;
use crate::Result;

/// Metadata key linking a gateway intent back to its order.
pub const ORDER_ID_METADATA: &str = "order_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown => "unknown",
        }
    }
}

/// Gateway-side charge attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn order_id(&self) -> Option<&str> { self.metadata.get(ORDER_ID_METADATA).map(String::as_str) }

    pub fn to_payment_result(&self) -> PaymentResult {
        PaymentResult {
            id: self.id.clone(),
            status: self.status.as_str().to_string(),
            amount: self.amount,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentRequest {
    pub order_id: OrderId,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent>;
}
