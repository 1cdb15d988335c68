use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::{OrderId, PriceSummary};
use crate::identity::Actor;
use crate::service::NewOrder;
use crate::{EcommerceError, Result};

fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse().map_err(|_| EcommerceError::InvalidRequest(format!("Invalid order id: {raw}")))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "opensase-orders" }))
}

pub async fn create_order(State(s): State<AppState>, actor: Actor, body: std::result::Result<Json<NewOrder>, JsonRejection>) -> Result<(StatusCode, Json<Value>)> {
    let Json(request) = body?;
    let order = s.orders.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "order": order }))))
}

pub async fn my_orders(State(s): State<AppState>, actor: Actor) -> Result<Json<Value>> {
    let orders = s.orders.list_mine(&actor).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

pub async fn all_orders(State(s): State<AppState>, actor: Actor) -> Result<Json<Value>> {
    let all_orders = s.orders.list_all(&actor).await?;
    Ok(Json(json!({ "success": true, "allOrders": all_orders })))
}

pub async fn get_order(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Value>> {
    let order = s.orders.get_order(&actor, parse_order_id(&id)?).await?;
    let summary = PriceSummary::for_subtotal(order.total_price);
    Ok(Json(json!({ "success": true, "order": order, "summary": summary })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub order_status: String,
}

pub async fn update_status(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, body: std::result::Result<Json<StatusRequest>, JsonRejection>) -> Result<Json<Value>> {
    let Json(request) = body?;
    let id = parse_order_id(&id)?;
    let next: OrderStatus = request.order_status.parse().map_err(EcommerceError::InvalidRequest)?;
    let order = s.orders.transition_status(&actor, id, next).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// Whatever the client relays about the intent, only its id is used.
#[derive(Debug, Deserialize)]
pub struct RelayedIntent {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_intent: RelayedIntent,
}

pub async fn pay_order(State(s): State<AppState>, actor: Actor, Path(id): Path<String>, body: std::result::Result<Json<PayRequest>, JsonRejection>) -> Result<Json<Value>> {
    let Json(request) = body?;
    let order = s.orders.record_payment(&actor, parse_order_id(&id)?, &request.payment_intent.id).await?;
    Ok(Json(json!({ "success": true, "message": "Order paid successfully", "order": order })))
}

pub async fn cancel_order(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Value>> {
    let cancelled = s.orders.cancel_own(&actor, parse_order_id(&id)?).await?;
    Ok(Json(json!({ "success": true, "message": "Order cancelled successfully", "cancelledOrderId": cancelled })))
}

pub async fn delete_order(State(s): State<AppState>, actor: Actor, Path(id): Path<String>) -> Result<Json<Value>> {
    let deleted = s.orders.delete_any(&actor, parse_order_id(&id)?).await?;
    Ok(Json(json!({ "success": true, "message": "Order deleted successfully", "deletedOrderId": deleted })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequestBody {
    pub order_id: Option<String>,
}

pub async fn create_payment_intent(State(s): State<AppState>, actor: Actor, body: std::result::Result<Json<IntentRequestBody>, JsonRejection>) -> Result<Json<Value>> {
    let Json(request) = body?;
    let raw = request.order_id.ok_or_else(|| EcommerceError::InvalidRequest("Order ID is required".into()))?;
    let handle = s.orders.payments().create_intent(&actor, parse_order_id(&raw)?).await?;
    Ok(Json(json!({ "success": true, "clientSecret": handle.client_secret, "paymentIntentId": handle.intent_id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_intent_id: String,
    pub order_id: String,
}

pub async fn confirm_payment(State(s): State<AppState>, actor: Actor, body: std::result::Result<Json<ConfirmRequest>, JsonRejection>) -> Result<Json<Value>> {
    let Json(request) = body?;
    let order = s.orders.record_payment(&actor, parse_order_id(&request.order_id)?, &request.payment_intent_id).await?;
    Ok(Json(json!({ "success": true, "message": "Payment successful & order updated", "order": order })))
}
