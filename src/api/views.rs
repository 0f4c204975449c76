//! JSON shapes handed to clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::order::PICKUP_ADDRESS_PLACEHOLDER;
use crate::domain::aggregates::{Fulfillment, Order, OrderItem, PublicUser};

#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
}

impl From<&OrderItem> for OrderLineView {
    fn from(i: &OrderItem) -> Self {
        Self {
            product_id: i.product_id, name: i.product_name.clone(), price: i.unit_price.amount(),
            quantity: i.quantity.value(), total: i.line_total.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub order_status: &'static str,
    pub order_type: &'static str,
    pub payment_method: &'static str,
    pub shipping_address: String,
    pub contact_number: Option<String>,
    pub transaction_number: Option<String>,
    pub total_amount: Decimal,
    pub cancellation_reason: Option<String>,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub estimated_delivery_datetime: Option<DateTime<Utc>>,
    pub allowed_next: Vec<&'static str>,
    pub items: Vec<OrderLineView>,
}

impl OrderView {
    pub fn new(order: &Order, username: Option<String>) -> Self {
        let (out_at, eta) = order.fulfillment().delivery_details()
            .map_or((None, None), |d| (d.out_for_delivery_at, d.estimated_delivery_at));
        Self {
            order_id: order.id().to_string(),
            user_id: order.user_id(),
            username,
            order_status: order.status().as_str(),
            order_type: order.order_type().as_str(),
            payment_method: order.payment().as_str(),
            shipping_address: display_address(order.fulfillment()),
            contact_number: order.contact_number().map(str::to_string),
            transaction_number: order.transaction_ref().map(str::to_string),
            total_amount: order.total().amount(),
            cancellation_reason: order.cancellation_reason().map(str::to_string),
            order_date: order.created_at(),
            updated_at: order.updated_at(),
            out_for_delivery_at: out_at,
            estimated_delivery_datetime: eta,
            allowed_next: order.allowed_next().iter().map(|s| s.as_str()).collect(),
            items: order.items().iter().map(OrderLineView::from).collect(),
        }
    }
}

fn display_address(f: &Fulfillment) -> String {
    match f {
        Fulfillment::Delivery(d) => d.address.clone(),
        Fulfillment::Pickup => PICKUP_ADDRESS_PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct LegacySaleLine {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub qty: u32,
    pub total: Decimal,
}

/// The flat order shape older storefront and cashier screens read.
#[derive(Debug, Serialize)]
pub struct LegacySale {
    pub id: String,
    pub order_id: String,
    pub customer: String,
    pub address: String,
    pub payment: &'static str,
    pub status: &'static str,
    pub total: Decimal,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub trnumber: Option<String>,
    pub contact: Option<String>,
    pub createdbyuser: Option<String>,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery_datetime: Option<DateTime<Utc>>,
    pub items: Vec<LegacySaleLine>,
    pub reason: Option<String>,
}

impl LegacySale {
    /// `users` resolves order owners to a display name; guests fall back to
    /// the contact number, then "Guest".
    pub fn new(order: &Order, users: &HashMap<Uuid, PublicUser>) -> Self {
        let owner = order.user_id().and_then(|id| users.get(&id));
        let customer = owner
            .and_then(|u| match (&u.profile.firstname, &u.profile.lastname) {
                (Some(first), Some(last)) => Some(format!("{first} {last}").trim().to_string()),
                _ => None,
            })
            .or_else(|| owner.map(|u| u.username.clone()))
            .or_else(|| order.contact_number().map(str::to_string))
            .unwrap_or_else(|| "Guest".to_string());
        Self {
            id: order.id().to_string(),
            order_id: order.id().to_string(),
            customer,
            address: display_address(order.fulfillment()),
            payment: order.payment().as_str(),
            status: order.status().as_str(),
            total: order.total().amount(),
            order_type: order.order_type().as_str(),
            trnumber: order.transaction_ref().map(str::to_string),
            contact: order.contact_number().map(str::to_string),
            createdbyuser: owner.map(|u| u.username.clone()),
            order_date: order.created_at(),
            updated_at: order.updated_at(),
            estimated_delivery_datetime: order.fulfillment().delivery_details().and_then(|d| d.estimated_delivery_at),
            items: order.items().iter().map(|i| LegacySaleLine {
                id: i.product_id, name: i.product_name.clone(), price: i.unit_price.amount(),
                qty: i.quantity.value(), total: i.line_total.amount(),
            }).collect(),
            reason: order.cancellation_reason().map(str::to_string),
        }
    }
}
