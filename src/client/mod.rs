//! Storefront client side of the order lifecycle.
//!
//! The cart lives on the customer's device and is only a snapshot: once
//! submitted, the server owns the order. Checkout drives the order API and the
//! card confirmation, and deletes the just-created order if payment fails.

mod cart_store;
mod checkout;
mod http;

pub use cart_store::{CartStorage, CartStore, JsonFileCartStorage, MemoryCartStorage};
pub use checkout::{CardConfirmer, CheckoutSession, ConfirmedIntent, PendingPayment, Placement};
pub use http::{HttpStorefrontApi, PaymentIntentResponse, StorefrontApi};

use thiserror::Error;

use crate::domain::aggregates::CartError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Cart storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cart data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
