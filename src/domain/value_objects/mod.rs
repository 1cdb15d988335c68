//! Value Objects for the order lifecycle

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Order identifier. Time-ordered, so sorting by id follows creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn generate() -> Self { Self(Uuid::now_v7()) }
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self { Self(id) }
}

impl FromStr for OrderId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Opaque user reference issued by the identity service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// How the customer settles the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(alias = "Stripe")]
    OnlineCard,
    #[serde(alias = "Cash payment")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn requires_online_payment(&self) -> bool { matches!(self, Self::OnlineCard) }

    pub fn as_str(&self) -> &'static str {
        match self { Self::OnlineCard => "OnlineCard", Self::CashOnDelivery => "CashOnDelivery" }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OnlineCard" | "Stripe" => Ok(Self::OnlineCard),
            "CashOnDelivery" | "Cash payment" => Ok(Self::CashOnDelivery),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Delivery destination. All four parts are required free text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(alias = "address")]
    #[validate(custom = "not_blank")]
    pub street: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub postal_code: String,
    #[validate(custom = "not_blank")]
    pub country: String,
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { return Err(ValidationError::new("blank")); }
    Ok(())
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() { return Err(ValidationError::new("negative")); }
    Ok(())
}

/// Converts a major-unit amount into gateway minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Flat shipping fee shown at checkout.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
/// Display tax rate (0.5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Presentation-only totals. Never persisted: an order's stored total is the items subtotal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub items: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl PriceSummary {
    pub fn for_subtotal(items: Decimal) -> Self {
        let tax = (items * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self { items, shipping: SHIPPING_FEE, tax, grand_total: items.saturating_add(SHIPPING_FEE).saturating_add(tax) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(Decimal::new(5000, 2)), Some(5000));
        assert_eq!(to_minor_units(Decimal::new(19995, 3)), Some(2000));
        assert_eq!(to_minor_units(Decimal::new(10005, 4)), Some(100));
        assert_eq!(to_minor_units(Decimal::MAX), None);
        assert_eq!(to_minor_units(Decimal::new(i64::MAX, 0)), None);
    }

    #[test]
    fn test_payment_method_aliases() {
        let m: PaymentMethod = serde_json::from_str("\"Stripe\"").unwrap();
        assert_eq!(m, PaymentMethod::OnlineCard);
        let m: PaymentMethod = serde_json::from_str("\"Cash payment\"").unwrap();
        assert_eq!(m, PaymentMethod::CashOnDelivery);
        assert!(serde_json::from_str::<PaymentMethod>("\"Bitcoin\"").is_err());
    }

    #[test]
    fn test_shipping_address_requires_all_fields() {
        let mut address = ShippingAddress {
            street: "1 Main St".into(), city: "Lagos".into(), postal_code: "100001".into(), country: "NG".into(),
        };
        assert!(address.validate().is_ok());
        address.city = "  ".into();
        let errors = address.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("city"));
    }

    #[test]
    fn test_price_summary() {
        let s = PriceSummary::for_subtotal(Decimal::new(5000, 2));
        assert_eq!(s.tax, Decimal::new(25, 2));
        assert_eq!(s.grand_total, Decimal::new(6025, 2));
    }
}
