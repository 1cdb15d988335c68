//! Order persistence.
//!
//! Every mutation is a single-record write; concurrent updates are last-write-wins.

mod memory;
mod postgres;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;

use crate::domain::aggregates::Order;
use crate::domain::value_objects::{OrderId, UserId};
use crate::Result;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Orders placed by `owner`, most recent first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Order>>;

    /// Every order, most recent first.
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// Overwrites the stored record. Returns `false` if it no longer exists.
    async fn update(&self, order: &Order) -> Result<bool>;

    /// Hard delete. Returns `false` if nothing was removed.
    async fn delete(&self, id: OrderId) -> Result<bool>;

    /// Hard delete only while the stored record is still unpaid. The paid
    /// check and the removal are one atomic step.
    async fn delete_unpaid(&self, id: OrderId) -> Result<bool>;
}
