//! HTTP surface.

mod auth;
mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::identity::IdentityService;
use crate::service::OrderLifecycleService;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderLifecycleService>,
    pub identity: Arc<dyn IdentityService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/orders", post(handlers::create_order))
        .route("/api/orders/myorders", get(handlers::my_orders))
        .route("/api/orders/allorders", get(handlers::all_orders))
        .route("/api/orders/:id", get(handlers::get_order).delete(handlers::delete_order))
        .route("/api/orders/:id/status", put(handlers::update_status))
        .route("/api/orders/:id/pay", put(handlers::pay_order))
        .route("/api/orders/:id/cancel", delete(handlers::cancel_order))
        .route("/api/payment/create-payment-intent", post(handlers::create_payment_intent))
        .route("/api/payment/confirm", post(handlers::confirm_payment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
