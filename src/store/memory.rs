use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::OrderStore;
use crate::domain::aggregates::Order;
use crate::domain::value_objects::{OrderId, UserId};
use crate::Result;

/// Process-local store, used by tests and local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.orders.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.orders.read().await.is_empty() }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.values().filter(|o| &o.placed_by == owner).cloned().collect()))
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(newest_first(self.orders.read().await.values().cloned().collect()))
    }

    async fn update(&self, order: &Order) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored) => { *stored = order.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn delete_unpaid(&self, id: OrderId) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get(&id) {
            Some(order) if !order.is_paid => Ok(orders.remove(&id).is_some()),
            _ => Ok(false),
        }
    }
}
