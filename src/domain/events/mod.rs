//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::{OrderId, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed {
        order_id: OrderId,
        placed_by: UserId,
        recipient: Option<String>,
        total: Decimal,
        status: OrderStatus,
    },
    Paid { order_id: OrderId, amount: Decimal },
    StatusChanged { order_id: OrderId, from: OrderStatus, to: OrderStatus },
    Deleted { order_id: OrderId, by_owner: bool },
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Placed { order_id, .. }
            | Self::Paid { order_id, .. }
            | Self::StatusChanged { order_id, .. }
            | Self::Deleted { order_id, .. } => *order_id,
        }
    }

    /// Subject suffix used when the event is published on a message bus.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::Paid { .. } => "paid",
            Self::StatusChanged { .. } => "status_changed",
            Self::Deleted { .. } => "deleted",
        }
    }
}
