//! Order notifications (confirmation messages and lifecycle events).
//!
//! Delivery is best-effort: callers log failures and carry on.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::domain::events::OrderEvent;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to publish event: {0}")]
    Publish(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &OrderEvent) -> Result<(), NotifyError>;
}

/// Publishes JSON events on `{prefix}.{kind}`.
#[derive(Debug, Clone)]
pub struct NatsNotifier {
    client: async_nats::Client,
    prefix: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, prefix: impl Into<String>) -> Self {
        Self { client, prefix: prefix.into() }
    }

    pub fn subject_for(prefix: &str, event: &OrderEvent) -> String { format!("{}.{}", prefix, event.kind()) }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn notify(&self, event: &OrderEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(Self::subject_for(&self.prefix, event), payload.into())
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))
    }
}

/// Writes events to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &OrderEvent) -> Result<(), NotifyError> {
        info!(order_id = %event.order_id(), kind = event.kind(), event = %serde_json::to_string(event)?, "order event");
        Ok(())
    }
}
