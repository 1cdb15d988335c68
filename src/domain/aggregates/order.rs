//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{non_negative, not_blank, OrderId, PaymentMethod, ShippingAddress, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub placed_by: UserId,
    #[serde(rename = "orderItems", alias = "lineItems")]
    pub line_items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_result: Option<PaymentResult>,
    pub total_price: Decimal,
    pub order_status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time snapshot of a product as it was when the order was submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(alias = "product")]
    #[validate(custom = "not_blank")]
    pub product_ref: String,
    pub name: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(alias = "price")]
    #[validate(custom = "non_negative")]
    pub unit_price: Decimal,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

impl LineItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> { self.unit_price.checked_mul(Decimal::from(self.quantity)) }
}

/// Normalized gateway response stored once an online payment succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled, Paid }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled, Self::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Paid => "Paid",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// States from which `self` may be entered.
    pub fn predecessors(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[],
            Paid => &[Pending],
            Processing => &[Pending, Paid],
            Shipped => &[Pending, Processing, Paid],
            Delivered => &[Pending, Processing, Shipped, Paid],
            Cancelled => &[Pending, Processing, Paid],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { next.predecessors().contains(self) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

impl Order {
    /// Builds a pending, unpaid order. The total is always derived from the line items.
    pub fn place(
        placed_by: UserId,
        line_items: Vec<LineItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, OrderError> {
        if line_items.is_empty() { return Err(OrderError::NoItems); }
        let total_price = line_items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| item.line_total().and_then(|line| total.checked_add(line)))
            .ok_or(OrderError::TotalOverflow)?;
        let now = Utc::now();
        Ok(Self {
            id: OrderId::generate(), placed_by, line_items, shipping_address, payment_method,
            payment_result: None, total_price, order_status: OrderStatus::Pending,
            is_paid: false, paid_at: None, is_delivered: false, delivered_at: None,
            created_at: now, updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool { &self.placed_by == user }

    pub fn ensure_cancellable(&self) -> Result<(), OrderError> {
        if self.is_paid { return Err(OrderError::AlreadyPaid); }
        Ok(())
    }

    pub fn ensure_payable(&self) -> Result<(), OrderError> {
        if self.is_paid { return Err(OrderError::AlreadyPaid); }
        if !self.order_status.can_transition_to(OrderStatus::Paid) {
            return Err(OrderError::IllegalTransition { from: self.order_status, to: OrderStatus::Paid });
        }
        Ok(())
    }

    /// Records a confirmed online payment.
    pub fn mark_paid(&mut self, result: PaymentResult) -> Result<OrderEvent, OrderError> {
        self.ensure_payable()?;
        let now = Utc::now();
        self.is_paid = true;
        self.paid_at = Some(now);
        self.order_status = OrderStatus::Paid;
        self.payment_result = Some(result);
        self.updated_at = now;
        Ok(OrderEvent::Paid { order_id: self.id, amount: self.total_price })
    }

    /// Admin-driven status change, checked against the transition table.
    pub fn transition(&mut self, next: OrderStatus) -> Result<OrderEvent, OrderError> {
        let from = self.order_status;
        if !from.can_transition_to(next) { return Err(OrderError::IllegalTransition { from, to: next }); }
        let now = Utc::now();
        self.order_status = next;
        if next == OrderStatus::Delivered {
            self.is_delivered = true;
            self.delivered_at = Some(now);
            // Cash is collected at the door.
            if self.payment_method == PaymentMethod::CashOnDelivery && !self.is_paid {
                self.is_paid = true;
                self.paid_at = Some(now);
            }
        }
        self.updated_at = now;
        Ok(OrderEvent::StatusChanged { order_id: self.id, from, to: next })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { NoItems, TotalOverflow, AlreadyPaid, IllegalTransition { from: OrderStatus, to: OrderStatus } }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "No order items found"),
            Self::TotalOverflow => write!(f, "Order total is too large"),
            Self::AlreadyPaid => write!(f, "Cannot cancel or pay an order that is already paid"),
            Self::IllegalTransition { from, to } => write!(f, "Cannot move order from {from} to {to}"),
        }
    }
}
