use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::warn;

use super::ClientError;
use crate::domain::aggregates::{CartItem, CartSnapshot, LineItem};
use crate::domain::value_objects::PriceSummary;

/// Device-local persistence for the cart.
pub trait CartStorage {
    fn load(&self) -> Result<Vec<CartItem>, ClientError>;
    fn save(&mut self, items: &[CartItem]) -> Result<(), ClientError>;
    fn clear(&mut self) -> Result<(), ClientError>;
}

/// Cart kept as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
}

impl JsonFileCartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> Result<Vec<CartItem>, ClientError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, items: &[CartItem]) -> Result<(), ClientError> {
        fs::write(&self.path, serde_json::to_vec(items)?)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    items: Vec<CartItem>,
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Vec<CartItem>, ClientError> { Ok(self.items.clone()) }

    fn save(&mut self, items: &[CartItem]) -> Result<(), ClientError> {
        self.items = items.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        self.items.clear();
        Ok(())
    }
}

/// Cart state container. Every mutation is written through to storage.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    snapshot: CartSnapshot,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Restores the cart from storage. Unreadable contents start an empty cart.
    pub fn open(storage: S) -> Self {
        let snapshot = match storage.load() {
            Ok(items) => CartSnapshot::from_items(items),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cart");
                CartSnapshot::new()
            }
        };
        Self { snapshot, storage }
    }

    pub fn snapshot(&self) -> &CartSnapshot { &self.snapshot }
    pub fn is_empty(&self) -> bool { self.snapshot.is_empty() }
    pub fn total_quantity(&self) -> u32 { self.snapshot.total_quantity() }
    pub fn summary(&self) -> PriceSummary { self.snapshot.summary() }
    pub fn to_line_items(&self) -> Vec<LineItem> { self.snapshot.to_line_items() }
    pub fn storage(&self) -> &S { &self.storage }

    pub fn add(&mut self, item: CartItem) -> Result<(), ClientError> {
        self.snapshot.add_item(item);
        self.persist()
    }

    pub fn remove(&mut self, product_id: &str) -> Result<(), ClientError> {
        self.snapshot.remove_item(product_id)?;
        self.persist()
    }

    pub fn increase(&mut self, product_id: &str) -> Result<(), ClientError> {
        self.snapshot.increase(product_id)?;
        self.persist()
    }

    pub fn decrease(&mut self, product_id: &str) -> Result<(), ClientError> {
        self.snapshot.decrease(product_id)?;
        self.persist()
    }

    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.snapshot.clear();
        self.storage.clear()
    }

    fn persist(&mut self) -> Result<(), ClientError> { self.storage.save(self.snapshot.items()) }
}
