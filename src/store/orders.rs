//! Order header and line persistence.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

use crate::domain::aggregates::order::{DeliveryDetails, OrderParts};
use crate::domain::aggregates::{Fulfillment, Order, OrderItem, OrderStatus, OrderType, PaymentMethod};
use crate::domain::value_objects::{Money, OrderId, Quantity};
use crate::{GroceryError, Result};

/// Sequential candidates tried before falling back to an epoch-derived id.
pub const MAX_SEQUENCE_ATTEMPTS: u32 = 100;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    user_id: Option<Uuid>,
    total_cents: i64,
    status: String,
    payment_method: String,
    order_type: String,
    shipping_address: Option<String>,
    contact_number: Option<String>,
    transaction_ref: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    out_for_delivery_at: Option<DateTime<Utc>>,
    estimated_delivery_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: Uuid,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = GroceryError;
    fn try_from(r: OrderItemRow) -> Result<Self> {
        let quantity = u32::try_from(r.quantity).ok().and_then(|q| Quantity::new(q).ok())
            .ok_or_else(|| GroceryError::Corrupt(format!("order line quantity {}", r.quantity)))?;
        Ok(OrderItem {
            product_id: r.product_id, product_name: r.product_name, unit_price: Money::from_cents(r.unit_price_cents),
            quantity, line_total: Money::from_cents(r.line_total_cents),
        })
    }
}

fn into_order(row: OrderRow, items: Vec<OrderItem>) -> Result<Order> {
    let corrupt = |e: crate::domain::aggregates::OrderError| GroceryError::Corrupt(format!("order {}: {e}", row.order_id));
    let status: OrderStatus = row.status.parse().map_err(corrupt)?;
    let payment: PaymentMethod = row.payment_method.parse().map_err(corrupt)?;
    let fulfillment = match row.order_type.parse::<OrderType>().map_err(corrupt)? {
        OrderType::Delivery => Fulfillment::Delivery(DeliveryDetails {
            address: row.shipping_address.clone().unwrap_or_default(),
            out_for_delivery_at: row.out_for_delivery_at,
            estimated_delivery_at: row.estimated_delivery_at,
        }),
        OrderType::Pickup => Fulfillment::Pickup,
    };
    Ok(Order::rehydrate(OrderParts {
        id: OrderId::from(row.order_id), user_id: row.user_id, items, total: Money::from_cents(row.total_cents),
        status, payment, transaction_ref: row.transaction_ref, fulfillment, contact_number: row.contact_number,
        cancellation_reason: row.cancellation_reason, created_at: row.created_at, updated_at: row.updated_at,
    }))
}

async fn exists(conn: &mut SqliteConnection, id: &OrderId) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_id = ?1")
        .bind(id.as_str()).fetch_optional(conn).await?;
    Ok(found.is_some())
}

/// Next free `ORD-YYYYMMDD-NNNN` for the day of `now`. Must run inside the
/// write transaction that inserts the order.
pub async fn next_order_id(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<OrderId> {
    let date = now.date_naive();
    let prefix = OrderId::day_prefix(date);
    let latest: Option<String> = sqlx::query_scalar(
        "SELECT order_id FROM orders WHERE order_id LIKE ?1 || '%' AND length(order_id) = ?2 ORDER BY order_id DESC LIMIT 1",
    )
    .bind(&prefix).bind(prefix.len() as i64 + 4)
    .fetch_optional(&mut *conn).await?;

    let mut sequence = latest.map(OrderId::from).and_then(|id| id.sequence()).map_or(1, |s| s + 1);
    for _ in 0..MAX_SEQUENCE_ATTEMPTS {
        let candidate = OrderId::sequential(date, sequence);
        if !exists(&mut *conn, &candidate).await? {
            return Ok(candidate);
        }
        sequence += 1;
    }

    let mut millis = now.timestamp_millis();
    for _ in 0..MAX_SEQUENCE_ATTEMPTS {
        let candidate = OrderId::fallback(date, millis);
        if !exists(&mut *conn, &candidate).await? {
            tracing::warn!(order_id = %candidate, "order sequence exhausted, using timestamp id");
            return Ok(candidate);
        }
        millis += 1;
    }
    Err(GroceryError::Conflict(format!("could not allocate an order id for {date}")))
}

pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> Result<()> {
    let (address, out_at, eta) = match order.fulfillment() {
        Fulfillment::Delivery(d) => (Some(d.address.as_str()), d.out_for_delivery_at, d.estimated_delivery_at),
        Fulfillment::Pickup => (None, None, None),
    };
    sqlx::query(
        "INSERT INTO orders (order_id, user_id, total_cents, status, payment_method, order_type, shipping_address, \
         contact_number, transaction_ref, cancellation_reason, created_at, updated_at, out_for_delivery_at, estimated_delivery_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(order.id().as_str()).bind(order.user_id()).bind(order.total().cents()).bind(order.status().as_str())
    .bind(order.payment().as_str()).bind(order.order_type().as_str()).bind(address).bind(order.contact_number())
    .bind(order.transaction_ref()).bind(order.cancellation_reason()).bind(order.created_at()).bind(order.updated_at())
    .bind(out_at).bind(eta)
    .execute(&mut *conn).await?;

    for item in order.items() {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price_cents, line_total_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(order.id().as_str()).bind(item.product_id).bind(&item.product_name).bind(i64::from(item.quantity.value()))
        .bind(item.unit_price.cents()).bind(item.line_total.cents())
        .execute(&mut *conn).await?;
    }
    Ok(())
}

/// Persists the mutable header fields after a transition.
pub async fn save(conn: &mut SqliteConnection, order: &Order) -> Result<()> {
    let (out_at, eta) = order.fulfillment().delivery_details()
        .map_or((None, None), |d| (d.out_for_delivery_at, d.estimated_delivery_at));
    let result = sqlx::query(
        "UPDATE orders SET status = ?2, cancellation_reason = ?3, updated_at = ?4, out_for_delivery_at = ?5, \
         estimated_delivery_at = ?6 WHERE order_id = ?1",
    )
    .bind(order.id().as_str()).bind(order.status().as_str()).bind(order.cancellation_reason())
    .bind(order.updated_at()).bind(out_at).bind(eta)
    .execute(conn).await?;
    if result.rows_affected() == 0 { return Err(GroceryError::not_found("Order", order.id())); }
    Ok(())
}

async fn items_of(conn: &mut SqliteConnection, order_id: &str) -> Result<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT product_id, product_name, quantity, unit_price_cents, line_total_cents FROM order_items WHERE order_id = ?1 ORDER BY id",
    )
    .bind(order_id).fetch_all(conn).await?;
    rows.into_iter().map(OrderItem::try_from).collect()
}

async fn hydrate(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items_of(&mut *conn, &row.order_id).await?;
        orders.push(into_order(row, items)?);
    }
    Ok(orders)
}

pub async fn find(conn: &mut SqliteConnection, id: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE order_id = ?1").bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn get(conn: &mut SqliteConnection, id: &str) -> Result<Order> {
    find(conn, id).await?.ok_or_else(|| GroceryError::not_found("Order", id))
}

/// Newest first; all orders, or only those owned by `user_id`.
pub async fn list(conn: &mut SqliteConnection, user_id: Option<Uuid>) -> Result<Vec<Order>> {
    let rows = match user_id {
        Some(user_id) => sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, order_id DESC")
            .bind(user_id).fetch_all(&mut *conn).await?,
        None => sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, order_id DESC")
            .fetch_all(&mut *conn).await?,
    };
    hydrate(conn, rows).await
}

pub async fn list_by_status(conn: &mut SqliteConnection, status: OrderStatus) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE status = ?1 ORDER BY order_id")
        .bind(status.as_str()).fetch_all(&mut *conn).await?;
    hydrate(conn, rows).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_store;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_next_order_id_sequences_per_day() {
        let store = test_store().await;
        let mut conn = store.pool().acquire().await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
        assert_eq!(next_order_id(&mut conn, now).await.unwrap().as_str(), "ORD-20240502-0001");

        sqlx::query("INSERT INTO orders (order_id, total_cents, status, payment_method, order_type, created_at, updated_at) VALUES (?1, 0, 'Pending', 'GCash', 'Pickup', ?2, ?2)")
            .bind("ORD-20240502-0007").bind(now).execute(&mut *conn).await.unwrap();
        sqlx::query("INSERT INTO orders (order_id, total_cents, status, payment_method, order_type, created_at, updated_at) VALUES (?1, 0, 'Pending', 'GCash', 'Pickup', ?2, ?2)")
            .bind("ORD-20240502-99999999").bind(now).execute(&mut *conn).await.unwrap();
        assert_eq!(next_order_id(&mut conn, now).await.unwrap().as_str(), "ORD-20240502-0008");

        let next_day = now + chrono::Duration::days(1);
        assert_eq!(next_order_id(&mut conn, next_day).await.unwrap().as_str(), "ORD-20240503-0001");
    }
}
