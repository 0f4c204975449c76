//! Catalogue rows and the inventory ledger.
//!
//! The ledger keeps only the running `stock` per product. Restocks are also
//! appended to `stock_entries`; sales are accounted for by order lines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;
use crate::{GroceryError, Result};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price_cents: i64,
    stock: i64,
    category: Option<String>,
    description: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product::rehydrate(
            r.id, r.name, Money::from_cents(r.price_cents), r.stock, r.category, r.description, r.image,
            r.created_at, r.updated_at,
        )
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockEntry {
    pub id: i64,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_added: i64,
    pub added_at: DateTime<Utc>,
}

pub async fn insert_product(conn: &mut SqliteConnection, p: &Product) -> Result<()> {
    sqlx::query("INSERT INTO products (id, name, price_cents, stock, category, description, image, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)")
        .bind(p.id()).bind(p.name()).bind(p.price().cents()).bind(p.stock()).bind(p.category()).bind(p.description())
        .bind(p.image()).bind(p.created_at()).bind(p.updated_at())
        .execute(conn).await?;
    Ok(())
}

pub async fn update_product(conn: &mut SqliteConnection, p: &Product) -> Result<()> {
    sqlx::query("UPDATE products SET name = ?2, price_cents = ?3, stock = ?4, category = ?5, description = ?6, image = ?7, updated_at = ?8 WHERE id = ?1")
        .bind(p.id()).bind(p.name()).bind(p.price().cents()).bind(p.stock()).bind(p.category()).bind(p.description())
        .bind(p.image()).bind(p.updated_at())
        .execute(conn).await?;
    Ok(())
}

pub async fn find_product(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?1").bind(id).fetch_optional(conn).await?;
    Ok(row.map(Product::from))
}

pub async fn get_product(conn: &mut SqliteConnection, id: Uuid) -> Result<Product> {
    find_product(conn, id).await?.ok_or_else(|| GroceryError::not_found("Product", id))
}

pub async fn list_products(conn: &mut SqliteConnection) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY name").fetch_all(conn).await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Deletes a product nobody has ordered yet; ordered products stay for history.
pub async fn delete_product(conn: &mut SqliteConnection, id: Uuid) -> Result<()> {
    let referenced: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?1")
        .bind(id).fetch_one(&mut *conn).await?;
    if referenced > 0 {
        return Err(GroceryError::Conflict(format!("Product {id} appears on {referenced} order line(s) and cannot be deleted")));
    }
    let result = sqlx::query("DELETE FROM products WHERE id = ?1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 { return Err(GroceryError::not_found("Product", id)); }
    Ok(())
}

/// `stock := stock + delta`, refused atomically when the result would be negative.
pub async fn adjust_stock(conn: &mut SqliteConnection, product_id: Uuid, delta: i64, now: DateTime<Utc>) -> Result<i64> {
    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1 AND stock + ?2 >= 0 RETURNING stock",
    )
    .bind(product_id).bind(delta).bind(now)
    .fetch_optional(&mut *conn).await?;
    if let Some(stock) = updated {
        return Ok(stock);
    }
    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id).fetch_optional(conn).await?;
    match available {
        None => Err(GroceryError::not_found("Product", product_id)),
        Some(available) => Err(GroceryError::InsufficientStock { product_id, available, requested: -delta }),
    }
}

pub async fn add_stock_entry(conn: &mut SqliteConnection, product_id: Uuid, quantity: i64, now: DateTime<Utc>) -> Result<i64> {
    if quantity <= 0 { return Err(GroceryError::validation("Quantity added must be greater than zero")); }
    let stock = adjust_stock(&mut *conn, product_id, quantity, now).await?;
    sqlx::query("INSERT INTO stock_entries (product_id, quantity_added, entry_date, added_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(product_id).bind(quantity).bind(now.date_naive().to_string()).bind(now)
        .execute(conn).await?;
    Ok(stock)
}

pub async fn stock_entries_on(conn: &mut SqliteConnection, day: NaiveDate) -> Result<Vec<StockEntry>> {
    let rows = sqlx::query_as::<_, StockEntry>(
        "SELECT s.id, s.product_id, p.name AS product_name, s.quantity_added, s.added_at \
         FROM stock_entries s JOIN products p ON p.id = s.product_id \
         WHERE s.entry_date = ?1 ORDER BY s.id",
    )
    .bind(day.to_string())
    .fetch_all(conn).await?;
    Ok(rows)
}
