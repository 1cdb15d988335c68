//! OpenSASE Orders
//!
//! Order and payment lifecycle for the OpenSASE storefront.
//!
//! ## Features
//! - Order placement from a submitted cart snapshot
//! - Owner/admin authorization on every order operation
//! - Card payments through a payment-intent gateway, re-verified server side
//! - Admin status transitions over a closed state machine
//! - Best-effort order notifications
//! - Client-side cart store and checkout orchestration

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod identity;
pub mod notify;
pub mod payment;
pub mod service;
pub mod store;

use thiserror::Error;

use crate::domain::aggregates::{CartError, OrderError};
use crate::domain::value_objects::OrderId;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("{0}")]
    InvalidState(String),

    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<OrderError> for EcommerceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NoItems | OrderError::TotalOverflow => Self::InvalidRequest(err.to_string()),
            OrderError::AlreadyPaid | OrderError::IllegalTransition { .. } => {
                Self::InvalidState(err.to_string())
            }
        }
    }
}

impl From<CartError> for EcommerceError {
    fn from(err: CartError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidRequest(format!("Invalid request: {err}"))
    }
}

impl From<sqlx::Error> for EcommerceError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
