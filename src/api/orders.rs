//! Order endpoints: checkout, customer and admin views, status changes.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::{created, ok, ApiResult, Envelope};
use crate::api::views::{LegacySale, OrderView};
use crate::api::AppState;
use crate::domain::aggregates::{
    CancelledBy, Cart, CartItem, CustomerInfo, Fulfillment, OrderStatus, OrderType, PaymentMethod,
};
use crate::domain::value_objects::Quantity;
use crate::GroceryError;

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderLineRequest {
    #[serde(alias = "product_id")]
    pub id: Uuid,
    #[serde(alias = "quantity")]
    pub qty: u32,
}

/// Checkout body. Field names follow the storefront's form.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineRequest>,
    #[serde(alias = "payment_method")]
    pub payment: String,
    #[serde(rename = "type", alias = "order_type")]
    pub order_type: String,
    #[serde(default, alias = "shipping_address")]
    pub address: Option<String>,
    #[serde(default, alias = "transaction_number")]
    pub trnumber: Option<String>,
    #[serde(default, alias = "contact_number")]
    pub contact: Option<String>,
    #[serde(default, alias = "username")]
    pub createdbyuser: Option<String>,
}

pub async fn create_order(State(s): State<AppState>, ApiJson(r): ApiJson<CreateOrderRequest>) -> ApiResult<(StatusCode, Json<Envelope>)> {
    r.validate()?;
    let payment: PaymentMethod = r.payment.parse()?;
    let fulfillment = match r.order_type.parse::<OrderType>()? {
        OrderType::Delivery => Fulfillment::delivery(r.address.unwrap_or_default())?,
        OrderType::Pickup => Fulfillment::Pickup,
    };
    let user_id = match r.createdbyuser.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => s.users.find_by_username(username).await?.map(|u| u.id()),
        None => None,
    };
    let mut cart = Cart::new();
    for line in r.items {
        let quantity = Quantity::new(line.qty).map_err(|e| GroceryError::validation(e.to_string()))?;
        cart.add_item(CartItem { product_id: line.id, quantity });
    }
    let customer = CustomerInfo { user_id, payment, transaction_ref: r.trnumber, fulfillment, contact_number: r.contact };

    let order = s.orders.create_order(cart, customer).await?;
    let order_id = order.id().to_string();
    Ok(created("Order placed successfully", json!({ "orderId": order_id, "id": order_id, "order": OrderView::new(&order, None) })))
}

pub async fn get_order(State(s): State<AppState>, ApiPath(order_id): ApiPath<String>) -> ApiResult {
    let order = s.orders.get_order(&order_id).await?;
    Ok(ok("Order retrieved", json!({ "order": OrderView::new(&order, None) })))
}

pub async fn list_admin_orders(State(s): State<AppState>) -> ApiResult {
    let usernames: HashMap<Uuid, String> = s.users.list_users().await?.into_iter().map(|u| (u.id, u.username)).collect();
    let orders: Vec<OrderView> = s.orders.list_orders().await?.iter()
        .map(|o| OrderView::new(o, o.user_id().and_then(|id| usernames.get(&id).cloned())))
        .collect();
    Ok(ok("Orders retrieved", json!({ "orders": orders })))
}

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub username: Option<String>,
}

pub async fn list_customer_orders(State(s): State<AppState>, ApiQuery(q): ApiQuery<CustomerQuery>) -> ApiResult {
    let username = q.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
        .ok_or_else(|| GroceryError::validation("Username required"))?;
    let user = s.users.find_by_username(username).await?
        .ok_or_else(|| GroceryError::not_found("User", username))?;
    let orders: Vec<OrderView> = s.orders.list_customer_orders(user.id()).await?.iter()
        .map(|o| OrderView::new(o, Some(user.username().to_string())))
        .collect();
    Ok(ok("Orders retrieved", json!({ "orders": orders })))
}

/// Flat view for older clients.
pub async fn list_sales(State(s): State<AppState>) -> ApiResult {
    let users: HashMap<_, _> = s.users.list_users().await?.into_iter().map(|u| (u.id, u)).collect();
    let sales: Vec<LegacySale> = s.orders.list_orders().await?.iter().map(|o| LegacySale::new(o, &users)).collect();
    Ok(ok("Orders retrieved", json!({ "sales": sales })))
}

pub async fn sales_report(State(s): State<AppState>) -> ApiResult {
    let report = s.orders.sales_summary().await?;
    Ok(ok("Sales report", json!({ "report": report })))
}

pub async fn accept_order(State(s): State<AppState>, ApiPath(order_id): ApiPath<String>) -> ApiResult {
    let order = s.orders.accept_order(&order_id).await?;
    Ok(ok("Order accepted", json!({ "order": OrderView::new(&order, None) })))
}

#[derive(Debug, Deserialize)]
pub struct AdminCancelRequest {
    pub reason: Option<String>,
    pub status: Option<String>,
}

pub async fn cancel_order(
    State(s): State<AppState>, ApiPath(order_id): ApiPath<String>, ApiJson(r): ApiJson<AdminCancelRequest>,
) -> ApiResult {
    let target = match r.status.as_deref() {
        Some(status) => status.parse::<OrderStatus>()?,
        None => OrderStatus::Cancelled,
    };
    let outcome = s.orders.cancel_order(&order_id, CancelledBy::Admin, target, r.reason).await?;
    let message = format!("Order {} and stock restored", target.as_str().to_lowercase());
    Ok(ok(message, json!({ "order": OrderView::new(&outcome.order, None) })))
}

#[derive(Debug, Deserialize)]
pub struct CustomerCancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel_order_by_customer(
    State(s): State<AppState>, ApiPath(order_id): ApiPath<String>, ApiJson(r): ApiJson<CustomerCancelRequest>,
) -> ApiResult {
    let outcome = s.orders.cancel_order(&order_id, CancelledBy::Customer, OrderStatus::Cancelled, r.reason).await?;
    let message = if outcome.refund_request.is_some() {
        "Order cancelled successfully. A refund request has been created for your GCash payment."
    } else {
        "Order cancelled successfully"
    };
    Ok(ok(message, json!({
        "order": OrderView::new(&outcome.order, None),
        "refundRequestId": outcome.refund_request,
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default, alias = "estimated_delivery")]
    pub estimated_delivery_datetime: Option<DateTime<Utc>>,
}

pub async fn advance_status(
    State(s): State<AppState>, ApiPath(order_id): ApiPath<String>, ApiJson(r): ApiJson<StatusRequest>,
) -> ApiResult {
    let to: OrderStatus = r.status.parse()?;
    let order = s.orders.advance_status(&order_id, to, r.estimated_delivery_datetime).await?;
    Ok(ok(format!("Order status updated to {to}"), json!({ "order": OrderView::new(&order, None) })))
}

pub async fn mark_received(State(s): State<AppState>, ApiPath(order_id): ApiPath<String>) -> ApiResult {
    let order = s.orders.mark_received(&order_id).await?;
    Ok(ok("Order marked as received", json!({ "order": OrderView::new(&order, None) })))
}
