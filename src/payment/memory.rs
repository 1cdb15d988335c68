use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{IntentRequest, IntentStatus, PaymentGateway, PaymentIntent, ORDER_ID_METADATA};
use crate::{EcommerceError, Result};

/// Gateway double that keeps intents in memory. Intents start in
/// `requires_payment_method`; [`InMemoryGateway::settle`] plays the card holder.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self { Self::default() }

    /// Moves an intent to `status`, as if the client had confirmed it.
    pub fn settle(&self, intent_id: &str, status: IntentStatus) -> Option<PaymentIntent> {
        let mut intents = self.intents.lock().ok()?;
        let intent = intents.get_mut(intent_id)?;
        intent.status = status;
        Some(intent.clone())
    }

    /// Stores an intent as-is, e.g. one created outside this service.
    pub fn insert(&self, intent: PaymentIntent) {
        if let Ok(mut intents) = self.intents.lock() {
            intents.insert(intent.id.clone(), intent);
        }
    }

    /// Makes every subsequent call fail with `GatewayError`.
    pub fn set_unavailable(&self, unavailable: bool) { self.unavailable.store(unavailable, Ordering::SeqCst); }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EcommerceError::GatewayError("gateway unavailable".to_string()));
        }
        Ok(())
    }

    fn lock_error() -> EcommerceError { EcommerceError::GatewayError("intent table poisoned".to_string()) }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        self.check_available()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_mem_{n}");
        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id,
            status: IntentStatus::RequiresPaymentMethod,
            amount: request.amount,
            currency: request.currency.clone(),
            metadata: HashMap::from([(ORDER_ID_METADATA.to_string(), request.order_id.to_string())]),
        };
        self.intents.lock().map_err(|_| Self::lock_error())?.insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        self.check_available()?;
        self.intents.lock().map_err(|_| Self::lock_error())?
            .get(intent_id)
            .cloned()
            .ok_or_else(|| EcommerceError::GatewayError(format!("No such payment_intent: '{intent_id}'")))
    }
}
