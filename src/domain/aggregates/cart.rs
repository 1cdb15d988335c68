//! Cart Snapshot
//!
//! Client-held mapping of product id to quantity and a price/name/image snapshot.
//! Pure state: persistence is the job of [`crate::client::CartStore`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::LineItem;
use crate::domain::value_objects::PriceSummary;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.unit_price.saturating_mul(Decimal::from(self.quantity)) }
}

impl CartSnapshot {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a snapshot from stored entries, merging duplicates and coercing quantities.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items { cart.add_item(item); }
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn get(&self, product_id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.id == product_id) }

    pub fn total_quantity(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn subtotal(&self) -> Decimal { self.items.iter().map(CartItem::line_total).fold(Decimal::ZERO, Decimal::saturating_add) }
    pub fn summary(&self) -> PriceSummary { PriceSummary::for_subtotal(self.subtotal()) }

    /// Adds a product; an existing entry has its quantity incremented instead of being duplicated.
    pub fn add_item(&mut self, mut item: CartItem) {
        item.quantity = item.quantity.max(1);
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    pub fn increase(&mut self, product_id: &str) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.id == product_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = item.quantity.saturating_add(1);
        Ok(())
    }

    /// Decrements a quantity, never below one.
    pub fn decrease(&mut self, product_id: &str) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.id == product_id).ok_or(CartError::ItemNotFound)?;
        if item.quantity > 1 { item.quantity -= 1; }
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Line items to submit at checkout.
    pub fn to_line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(|i| LineItem {
            product_ref: i.id.clone(),
            name: i.name.clone(),
            image_url: i.image_url.clone(),
            unit_price: i.unit_price,
            quantity: i.quantity,
        }).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found in cart") }
}
