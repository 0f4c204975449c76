//! Order Aggregate
//!
//! Status graph per order type:
//!
//! ```text
//! Delivery: Pending -> In Process -> Out for Delivery -> Delivered
//! Pickup:   Pending -> In Process -> Ready for Pick up -> Completed
//! Both:     Pending -> Cancelled | Rejected, In Process -> Cancelled
//! ```
//!
//! `Returned` is only entered through the return workflow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::product::Product;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, OrderId, Quantity};

pub const MIN_CUSTOMER_CANCEL_REASON: usize = 5;
pub const PICKUP_ADDRESS_PLACEHOLDER: &str = "Store Pickup";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    #[serde(rename = "In Process")]
    InProcess,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    #[serde(rename = "Ready for Pick up")]
    ReadyForPickup,
    Completed,
    Cancelled,
    Rejected,
    Returned,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        Self::Pending, Self::InProcess, Self::OutForDelivery, Self::Delivered, Self::ReadyForPickup,
        Self::Completed, Self::Cancelled, Self::Rejected, Self::Returned,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProcess => "In Process",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::ReadyForPickup => "Ready for Pick up",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Rejected => "Rejected",
            Self::Returned => "Returned",
        }
    }

    /// Statuses that hand the reserved stock back to the shelf.
    pub fn releases_stock(&self) -> bool { matches!(self, Self::Cancelled | Self::Rejected) }

    /// Statuses a return/refund request may be filed against.
    pub fn is_fulfilled(&self) -> bool { matches!(self, Self::Delivered | Self::Completed) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Delivery,
    #[serde(alias = "Pick up")]
    Pickup,
}

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self { Self::Delivery => "Delivery", Self::Pickup => "Pickup" }
    }

    pub fn next_statuses(&self, from: OrderStatus) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match (self, from) {
            (_, Pending) => &[InProcess, Cancelled, Rejected],
            (Self::Delivery, InProcess) => &[OutForDelivery, Cancelled],
            (Self::Pickup, InProcess) => &[ReadyForPickup, Cancelled],
            (Self::Delivery, OutForDelivery) => &[Delivered],
            (Self::Pickup, ReadyForPickup) => &[Completed],
            _ => &[],
        }
    }
}

impl FromStr for OrderType {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Delivery" => Ok(Self::Delivery),
            "Pickup" | "Pick up" => Ok(Self::Pickup),
            other => Err(OrderError::UnknownOrderType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Cash On Delivery")]
    CashOnDelivery,
    GCash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self { Self::CashOnDelivery => "Cash On Delivery", Self::GCash => "GCash" }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash On Delivery" => Ok(Self::CashOnDelivery),
            "GCash" => Ok(Self::GCash),
            other => Err(OrderError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub address: String,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
}

/// Per-type data: only delivery orders carry an address and delivery stamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fulfillment {
    Delivery(DeliveryDetails),
    Pickup,
}

impl Fulfillment {
    pub fn delivery(address: impl Into<String>) -> Result<Self, OrderError> {
        let address = address.into().trim().to_string();
        if address.is_empty() { return Err(OrderError::MissingAddress); }
        Ok(Self::Delivery(DeliveryDetails { address, out_for_delivery_at: None, estimated_delivery_at: None }))
    }

    pub fn order_type(&self) -> OrderType {
        match self { Self::Delivery(_) => OrderType::Delivery, Self::Pickup => OrderType::Pickup }
    }

    pub fn address(&self) -> &str {
        match self { Self::Delivery(d) => &d.address, Self::Pickup => PICKUP_ADDRESS_PLACEHOLDER }
    }

    pub fn delivery_details(&self) -> Option<&DeliveryDetails> {
        match self { Self::Delivery(d) => Some(d), Self::Pickup => None }
    }
}

/// Snapshot of a product line at purchase time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    pub line_total: Money,
}

impl OrderItem {
    pub fn snapshot(product: &Product, quantity: Quantity) -> Self {
        Self {
            product_id: product.id(), product_name: product.name().to_string(), unit_price: product.price(),
            quantity, line_total: product.price().multiply(quantity.value()),
        }
    }
}

/// Checkout data that is not part of the cart.
#[derive(Clone, Debug)]
pub struct CustomerInfo {
    pub user_id: Option<Uuid>,
    pub payment: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub fulfillment: Fulfillment,
    pub contact_number: Option<String>,
}

/// Who asked for a cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelledBy { Admin, Customer }

/// Result of `advance`, so callers can tell a real move from an estimate edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved { from: OrderStatus },
    EstimateUpdated,
}

/// Row-level parts used to rebuild an order loaded from storage.
#[derive(Clone, Debug)]
pub struct OrderParts {
    pub id: OrderId,
    pub user_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub fulfillment: Fulfillment,
    pub contact_number: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Order {
    id: OrderId,
    user_id: Option<Uuid>,
    items: Vec<OrderItem>,
    total: Money,
    status: OrderStatus,
    payment: PaymentMethod,
    transaction_ref: Option<String>,
    fulfillment: Fulfillment,
    contact_number: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    pub fn place(id: OrderId, customer: CustomerInfo, items: Vec<OrderItem>, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let transaction_ref = customer.transaction_ref.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if customer.payment == PaymentMethod::GCash && transaction_ref.is_none() {
            return Err(OrderError::MissingTransactionRef);
        }
        let total = items.iter().fold(Money::ZERO, |acc, i| acc.add(i.line_total));
        let mut order = Self {
            id, user_id: customer.user_id, items, total, status: OrderStatus::Pending,
            payment: customer.payment, transaction_ref, fulfillment: customer.fulfillment,
            contact_number: customer.contact_number, cancellation_reason: None,
            created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(OrderEvent::Placed { order_id: order.id.to_string(), user_id: order.user_id });
        Ok(order)
    }

    pub fn rehydrate(parts: OrderParts) -> Self {
        Self {
            id: parts.id, user_id: parts.user_id, items: parts.items, total: parts.total, status: parts.status,
            payment: parts.payment, transaction_ref: parts.transaction_ref, fulfillment: parts.fulfillment,
            contact_number: parts.contact_number, cancellation_reason: parts.cancellation_reason,
            created_at: parts.created_at, updated_at: parts.updated_at, events: vec![],
        }
    }

    pub fn id(&self) -> &OrderId { &self.id }
    pub fn user_id(&self) -> Option<Uuid> { self.user_id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn total(&self) -> Money { self.total }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment(&self) -> PaymentMethod { self.payment }
    pub fn transaction_ref(&self) -> Option<&str> { self.transaction_ref.as_deref() }
    pub fn fulfillment(&self) -> &Fulfillment { &self.fulfillment }
    pub fn order_type(&self) -> OrderType { self.fulfillment.order_type() }
    pub fn contact_number(&self) -> Option<&str> { self.contact_number.as_deref() }
    pub fn cancellation_reason(&self) -> Option<&str> { self.cancellation_reason.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn allowed_next(&self) -> &'static [OrderStatus] { self.order_type().next_statuses(self.status) }

    /// Pending -> In Process.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        self.transition(OrderStatus::InProcess, now)?;
        self.raise_event(OrderEvent::Accepted { order_id: self.id.to_string(), user_id: self.user_id });
        Ok(())
    }

    /// Pending -> Cancelled (or Rejected, admin only). Stock must be released by the caller
    /// in the same unit of work.
    pub fn cancel(&mut self, by: CancelledBy, target: OrderStatus, reason: Option<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        match (by, target) {
            (CancelledBy::Admin, OrderStatus::Cancelled | OrderStatus::Rejected) => {}
            (CancelledBy::Customer, OrderStatus::Cancelled) => {
                let long_enough = reason.as_ref().is_some_and(|r| r.chars().count() >= MIN_CUSTOMER_CANCEL_REASON);
                if !long_enough { return Err(OrderError::ReasonTooShort { min: MIN_CUSTOMER_CANCEL_REASON }); }
            }
            (_, other) => return Err(OrderError::InvalidCancelTarget(other)),
        }
        if self.status != OrderStatus::Pending {
            let allowed = self.allowed_next().iter().copied().filter(|s| !s.releases_stock()).collect();
            return Err(OrderError::InvalidTransition { from: self.status, to: target, allowed });
        }
        self.transition(target, now)?;
        self.cancellation_reason = reason.clone();
        self.raise_event(OrderEvent::Cancelled { order_id: self.id.to_string(), status: target, reason });
        Ok(())
    }

    /// Admin/cashier status change along the graph. Re-sending `Out for Delivery`
    /// with an estimate while already out only edits the estimate.
    pub fn advance(&mut self, to: OrderStatus, estimate: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<Advance, OrderError> {
        if to == OrderStatus::OutForDelivery && self.status == OrderStatus::OutForDelivery {
            if let (Some(estimate), Fulfillment::Delivery(details)) = (estimate, &mut self.fulfillment) {
                details.estimated_delivery_at = Some(estimate);
                self.touch(now);
                self.raise_event(OrderEvent::EstimateUpdated { order_id: self.id.to_string() });
                return Ok(Advance::EstimateUpdated);
            }
        }
        let from = self.transition(to, now)?;
        if to == OrderStatus::OutForDelivery {
            if let Fulfillment::Delivery(details) = &mut self.fulfillment {
                details.out_for_delivery_at = Some(now);
                if estimate.is_some() { details.estimated_delivery_at = estimate; }
            }
        }
        if to.releases_stock() {
            self.raise_event(OrderEvent::Cancelled { order_id: self.id.to_string(), status: to, reason: None });
        }
        Ok(Advance::Moved { from })
    }

    /// Customer confirms receipt: Out for Delivery -> Delivered.
    pub fn mark_received(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status != OrderStatus::OutForDelivery {
            return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Delivered, allowed: vec![] });
        }
        self.transition(OrderStatus::Delivered, now).map(|_| ())
    }

    pub fn is_delivery_overdue(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.status == OrderStatus::OutForDelivery
            && self.fulfillment.delivery_details()
                .and_then(|d| d.out_for_delivery_at)
                .is_some_and(|at| at < now - max_age)
    }

    /// Sweeper path: deliver an order that has been out too long.
    pub fn auto_deliver(&mut self, now: DateTime<Utc>, max_age: Duration) -> Result<(), OrderError> {
        if !self.is_delivery_overdue(now, max_age) {
            return Err(OrderError::NotOverdue);
        }
        self.transition(OrderStatus::Delivered, now).map(|_| ())
    }

    /// Forced by the return workflow; bypasses the graph.
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> OrderStatus {
        let from = self.status;
        self.status = OrderStatus::Returned;
        self.touch(now);
        self.raise_event(OrderEvent::StatusChanged { order_id: self.id.to_string(), from, to: OrderStatus::Returned });
        from
    }

    fn transition(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        let allowed = self.allowed_next();
        if !allowed.contains(&to) {
            return Err(OrderError::InvalidTransition { from: self.status, to, allowed: allowed.to_vec() });
        }
        let from = self.status;
        self.status = to;
        self.touch(now);
        self.raise_event(OrderEvent::StatusChanged { order_id: self.id.to_string(), from, to });
        Ok(from)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
    fn touch(&mut self, now: DateTime<Utc>) { self.updated_at = now; }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    NoItems,
    MissingAddress,
    MissingTransactionRef,
    ReasonTooShort { min: usize },
    InvalidCancelTarget(OrderStatus),
    InvalidTransition { from: OrderStatus, to: OrderStatus, allowed: Vec<OrderStatus> },
    NotOverdue,
    UnknownStatus(String),
    UnknownOrderType(String),
    UnknownPaymentMethod(String),
}

impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "Cart is empty"),
            Self::MissingAddress => write!(f, "Shipping address is required for delivery orders"),
            Self::MissingTransactionRef => write!(f, "Transaction number is required for GCash payments"),
            Self::ReasonTooShort { min } => write!(f, "Cancellation reason is required (at least {min} characters)"),
            Self::InvalidCancelTarget(s) => write!(f, "Orders cannot be cancelled into \"{s}\""),
            Self::InvalidTransition { from, to, .. } => write!(f, "Cannot change status from \"{from}\" to \"{to}\""),
            Self::NotOverdue => write!(f, "Order is not overdue for auto-completion"),
            Self::UnknownStatus(s) => write!(f, "Unknown order status: {s}"),
            Self::UnknownOrderType(s) => write!(f, "Unknown order type: {s}"),
            Self::UnknownPaymentMethod(s) => write!(f, "Unknown payment method: {s}"),
        }
    }
}

impl From<OrderError> for crate::GroceryError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition { from, to, allowed } => Self::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::NewProduct;
    use rust_decimal::Decimal;

    fn milk() -> Product {
        Product::create(NewProduct {
            name: "Milk".into(), price: Money::new(Decimal::new(80, 0)).unwrap(), stock: 10,
            category: Some("Dairy".into()), description: None, image: None,
        }, Utc::now()).unwrap()
    }

    fn order(fulfillment: Fulfillment, payment: PaymentMethod) -> Order {
        let items = vec![OrderItem::snapshot(&milk(), Quantity::new(2).unwrap())];
        let customer = CustomerInfo {
            user_id: None, payment, transaction_ref: Some("TX-1".into()), fulfillment, contact_number: None,
        };
        let id = OrderId::sequential(Utc::now().date_naive(), 1);
        Order::place(id, customer, items, Utc::now()).unwrap()
    }

    fn delivery() -> Order { order(Fulfillment::delivery("12 Mabini St").unwrap(), PaymentMethod::CashOnDelivery) }
    fn pickup() -> Order { order(Fulfillment::Pickup, PaymentMethod::CashOnDelivery) }

    #[test]
    fn test_place_totals_snapshot() {
        let o = delivery();
        assert_eq!(o.status(), OrderStatus::Pending);
        assert_eq!(o.total().to_string(), "160.00");
        assert_eq!(o.items()[0].quantity.value(), 2);
    }

    #[test]
    fn test_place_rejects_empty_and_missing_fields() {
        let customer = CustomerInfo {
            user_id: None, payment: PaymentMethod::GCash, transaction_ref: Some("  ".into()),
            fulfillment: Fulfillment::Pickup, contact_number: None,
        };
        let id = OrderId::sequential(Utc::now().date_naive(), 1);
        assert_eq!(Order::place(id.clone(), customer.clone(), vec![], Utc::now()).unwrap_err(), OrderError::NoItems);
        let items = vec![OrderItem::snapshot(&milk(), Quantity::new(1).unwrap())];
        assert_eq!(Order::place(id, customer, items, Utc::now()).unwrap_err(), OrderError::MissingTransactionRef);
        assert_eq!(Fulfillment::delivery("   ").unwrap_err(), OrderError::MissingAddress);
    }

    #[test]
    fn test_delivery_workflow() {
        let mut o = delivery();
        let now = Utc::now();
        o.accept(now).unwrap();
        assert_eq!(o.status(), OrderStatus::InProcess);
        o.advance(OrderStatus::OutForDelivery, None, now).unwrap();
        assert_eq!(o.fulfillment().delivery_details().unwrap().out_for_delivery_at, Some(now));
        o.mark_received(now).unwrap();
        assert_eq!(o.status(), OrderStatus::Delivered);
        assert!(o.allowed_next().is_empty());
    }

    #[test]
    fn test_pickup_workflow_rejects_delivery_states() {
        let mut o = pickup();
        let now = Utc::now();
        o.accept(now).unwrap();
        let err = o.advance(OrderStatus::OutForDelivery, None, now).unwrap_err();
        assert_eq!(err, OrderError::InvalidTransition {
            from: OrderStatus::InProcess, to: OrderStatus::OutForDelivery,
            allowed: vec![OrderStatus::ReadyForPickup, OrderStatus::Cancelled],
        });
        o.advance(OrderStatus::ReadyForPickup, None, now).unwrap();
        o.advance(OrderStatus::Completed, None, now).unwrap();
        assert_eq!(o.status(), OrderStatus::Completed);
    }

    #[test]
    fn test_reachable_statuses_match_graph() {
        use std::collections::HashSet;
        for (ty, expected) in [
            (OrderType::Delivery, vec!["Pending", "In Process", "Out for Delivery", "Delivered", "Cancelled", "Rejected"]),
            (OrderType::Pickup, vec!["Pending", "In Process", "Ready for Pick up", "Completed", "Cancelled", "Rejected"]),
        ] {
            let mut seen = HashSet::from([OrderStatus::Pending]);
            let mut frontier = vec![OrderStatus::Pending];
            while let Some(s) = frontier.pop() {
                for next in ty.next_statuses(s) {
                    if seen.insert(*next) { frontier.push(*next); }
                }
            }
            let names: HashSet<&str> = seen.iter().map(|s| s.as_str()).collect();
            assert_eq!(names, expected.into_iter().collect::<HashSet<_>>());
        }
    }

    #[test]
    fn test_same_state_retry_is_rejected() {
        let mut o = delivery();
        o.accept(Utc::now()).unwrap();
        assert!(matches!(o.accept(Utc::now()), Err(OrderError::InvalidTransition { .. })));
        assert_eq!(o.status(), OrderStatus::InProcess);
    }

    #[test]
    fn test_estimate_update_keeps_out_for_delivery_stamp() {
        let mut o = delivery();
        let t0 = Utc::now();
        o.accept(t0).unwrap();
        o.advance(OrderStatus::OutForDelivery, None, t0).unwrap();
        let later = t0 + Duration::hours(2);
        let eta = t0 + Duration::hours(5);
        assert_eq!(o.advance(OrderStatus::OutForDelivery, Some(eta), later).unwrap(), Advance::EstimateUpdated);
        let details = o.fulfillment().delivery_details().unwrap();
        assert_eq!(details.out_for_delivery_at, Some(t0));
        assert_eq!(details.estimated_delivery_at, Some(eta));
        assert!(o.advance(OrderStatus::OutForDelivery, None, later).is_err());
    }

    #[test]
    fn test_customer_cancel_needs_reason() {
        let mut o = delivery();
        let err = o.cancel(CancelledBy::Customer, OrderStatus::Cancelled, Some(" no ".into()), Utc::now()).unwrap_err();
        assert_eq!(err, OrderError::ReasonTooShort { min: MIN_CUSTOMER_CANCEL_REASON });
        assert_eq!(
            o.cancel(CancelledBy::Customer, OrderStatus::Rejected, Some("changed my mind".into()), Utc::now()).unwrap_err(),
            OrderError::InvalidCancelTarget(OrderStatus::Rejected)
        );
        o.cancel(CancelledBy::Customer, OrderStatus::Cancelled, Some("changed my mind".into()), Utc::now()).unwrap();
        assert_eq!(o.status(), OrderStatus::Cancelled);
        assert_eq!(o.cancellation_reason(), Some("changed my mind"));
    }

    #[test]
    fn test_cancel_only_from_pending() {
        let mut o = delivery();
        o.accept(Utc::now()).unwrap();
        let err = o.cancel(CancelledBy::Admin, OrderStatus::Rejected, None, Utc::now()).unwrap_err();
        assert_eq!(err, OrderError::InvalidTransition {
            from: OrderStatus::InProcess, to: OrderStatus::Rejected, allowed: vec![OrderStatus::OutForDelivery],
        });
    }

    #[test]
    fn test_auto_deliver_respects_age() {
        let mut o = delivery();
        let t0 = Utc::now();
        o.accept(t0).unwrap();
        o.advance(OrderStatus::OutForDelivery, None, t0).unwrap();
        assert_eq!(o.auto_deliver(t0 + Duration::hours(23), Duration::hours(24)), Err(OrderError::NotOverdue));
        o.auto_deliver(t0 + Duration::hours(25), Duration::hours(24)).unwrap();
        assert_eq!(o.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_status_strings_round_trip() {
        for s in OrderStatus::ALL {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
            assert_eq!(serde_json::to_value(s).unwrap(), serde_json::Value::String(s.as_str().into()));
        }
        assert_eq!("Pick up".parse::<OrderType>().unwrap(), OrderType::Pickup);
    }
}
