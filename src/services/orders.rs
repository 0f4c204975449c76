//! Order lifecycle: checkout, acceptance, cancellation, status changes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{
    Advance, Cart, CancelledBy, CustomerInfo, Order, OrderItem, OrderStatus, PaymentMethod, ReturnRequest,
};
use crate::domain::value_objects::Money;
use crate::notify::Notifier;
use crate::services::announce;
use crate::store::{inventory, orders, returns, Store};
use crate::{GroceryError, Result};

/// What a cancellation produced besides the order itself.
#[derive(Debug)]
pub struct CancelOutcome {
    pub order: Order,
    pub refund_request: Option<Uuid>,
}

/// Sales totals over all orders. Cancelled, rejected and returned orders are
/// counted but bring in no revenue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_sales: usize,
    pub total_revenue: Money,
    pub status_counts: BTreeMap<&'static str, usize>,
    pub payment_summary: BTreeMap<&'static str, Money>,
}

impl SalesSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut status_counts: BTreeMap<_, _> = OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut payment_summary: BTreeMap<_, _> = [PaymentMethod::CashOnDelivery, PaymentMethod::GCash]
            .iter()
            .map(|p| (p.as_str(), Money::ZERO))
            .collect();
        let mut total_revenue = Money::ZERO;
        for order in orders {
            *status_counts.entry(order.status().as_str()).or_insert(0) += 1;
            if order.status().releases_stock() || order.status() == OrderStatus::Returned {
                continue;
            }
            total_revenue = total_revenue.add(order.total());
            let by_payment = payment_summary.entry(order.payment().as_str()).or_insert(Money::ZERO);
            *by_payment = by_payment.add(order.total());
        }
        Self { total_sales: orders.len(), total_revenue, status_counts, payment_summary }
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Store,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    pub fn new(store: Store, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Places an order and debits every line in one transaction. Any failure
    /// (unknown product, short stock, bad checkout data) leaves nothing behind.
    pub async fn create_order(&self, cart: Cart, customer: CustomerInfo) -> Result<Order> {
        if cart.is_empty() {
            return Err(GroceryError::validation("Order must contain at least one item"));
        }
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;

        let mut items = Vec::with_capacity(cart.item_count());
        for line in cart.items() {
            let product = inventory::get_product(tx.conn(), line.product_id).await?;
            inventory::adjust_stock(tx.conn(), product.id(), -i64::from(line.quantity.value()), now).await?;
            items.push(OrderItem::snapshot(&product, line.quantity));
        }
        let id = orders::next_order_id(tx.conn(), now).await?;
        let mut order = Order::place(id, customer, items, now)?;
        orders::insert(tx.conn(), &order).await?;
        tx.commit().await?;

        announce(&self.store, &self.notifier, order.take_events()).await;
        Ok(order)
    }

    pub async fn accept_order(&self, order_id: &str) -> Result<Order> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let mut order = orders::get(tx.conn(), order_id).await?;
        order.accept(now)?;
        orders::save(tx.conn(), &order).await?;
        tx.commit().await?;

        announce(&self.store, &self.notifier, order.take_events()).await;
        Ok(order)
    }

    /// Cancels or rejects a pending order and returns its stock. A customer
    /// cancelling a GCash order also gets a refund request opened for them.
    pub async fn cancel_order(
        &self, order_id: &str, by: CancelledBy, target: OrderStatus, reason: Option<String>,
    ) -> Result<CancelOutcome> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let mut order = orders::get(tx.conn(), order_id).await?;
        order.cancel(by, target, reason, now)?;
        release_stock(tx.conn(), &order, now).await?;
        orders::save(tx.conn(), &order).await?;
        tx.commit().await?;
        announce(&self.store, &self.notifier, order.take_events()).await;

        let refund_request = if by == CancelledBy::Customer && order.payment() == PaymentMethod::GCash {
            self.open_auto_refund(&order, now).await
        } else {
            None
        };
        Ok(CancelOutcome { order, refund_request })
    }

    async fn open_auto_refund(&self, order: &Order, now: DateTime<Utc>) -> Option<Uuid> {
        let attempt = async {
            let mut request = ReturnRequest::auto_refund(order, order.cancellation_reason().unwrap_or_default(), now)?;
            let mut tx = self.store.begin_write().await?;
            returns::insert(tx.conn(), &request).await?;
            tx.commit().await?;
            announce(&self.store, &self.notifier, request.take_events()).await;
            Ok::<_, GroceryError>(request.id())
        };
        match attempt.await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(order_id = %order.id(), error = %e, "could not open refund request for cancelled order");
                None
            }
        }
    }

    /// Moves an order along its status graph. Entering Cancelled or Rejected
    /// returns the stock in the same transaction.
    pub async fn advance_status(
        &self, order_id: &str, to: OrderStatus, estimated_delivery: Option<DateTime<Utc>>,
    ) -> Result<Order> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let mut order = orders::get(tx.conn(), order_id).await?;
        let outcome = order.advance(to, estimated_delivery, now)?;
        if matches!(outcome, Advance::Moved { .. }) && to.releases_stock() {
            release_stock(tx.conn(), &order, now).await?;
        }
        orders::save(tx.conn(), &order).await?;
        tx.commit().await?;

        announce(&self.store, &self.notifier, order.take_events()).await;
        Ok(order)
    }

    pub async fn mark_received(&self, order_id: &str) -> Result<Order> {
        let now = Utc::now();
        let mut tx = self.store.begin_write().await?;
        let mut order = orders::get(tx.conn(), order_id).await?;
        order.mark_received(now)?;
        orders::save(tx.conn(), &order).await?;
        tx.commit().await?;

        announce(&self.store, &self.notifier, order.take_events()).await;
        Ok(order)
    }

    /// Delivers one order if it is still out and overdue at `now`. Returns
    /// `false` when something else moved it first.
    pub async fn auto_deliver(&self, order_id: &str, now: DateTime<Utc>, max_age: Duration) -> Result<bool> {
        let mut tx = self.store.begin_write().await?;
        let mut order = orders::get(tx.conn(), order_id).await?;
        if !order.is_delivery_overdue(now, max_age) {
            return Ok(false);
        }
        order.auto_deliver(now, max_age)?;
        orders::save(tx.conn(), &order).await?;
        tx.commit().await?;

        announce(&self.store, &self.notifier, order.take_events()).await;
        Ok(true)
    }

    pub async fn overdue_deliveries(&self, now: DateTime<Utc>, max_age: Duration) -> Result<Vec<String>> {
        let mut conn = self.store.pool().acquire().await?;
        let out = orders::list_by_status(&mut conn, OrderStatus::OutForDelivery).await?;
        Ok(out.into_iter().filter(|o| o.is_delivery_overdue(now, max_age)).map(|o| o.id().to_string()).collect())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        let mut conn = self.store.pool().acquire().await?;
        orders::get(&mut conn, order_id).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut conn = self.store.pool().acquire().await?;
        orders::list(&mut conn, None).await
    }

    pub async fn list_customer_orders(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let mut conn = self.store.pool().acquire().await?;
        orders::list(&mut conn, Some(user_id)).await
    }

    pub async fn sales_summary(&self) -> Result<SalesSummary> {
        Ok(SalesSummary::from_orders(&self.list_orders().await?))
    }
}

async fn release_stock(conn: &mut SqliteConnection, order: &Order, now: DateTime<Utc>) -> Result<()> {
    for item in order.items() {
        inventory::adjust_stock(&mut *conn, item.product_id, i64::from(item.quantity.value()), now).await?;
    }
    Ok(())
}
