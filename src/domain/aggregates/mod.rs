//! Aggregates module
pub mod order;
pub mod cart;

pub use order::{Order, OrderError, OrderStatus, LineItem, PaymentResult};
pub use cart::{CartSnapshot, CartError, CartItem};
