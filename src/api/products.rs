//! Catalogue and stock endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::{created, ok, ApiResult, Envelope};
use crate::api::AppState;
use crate::domain::aggregates::NewProduct;
use crate::domain::value_objects::Money;
use crate::GroceryError;

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[serde(alias = "names")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl TryFrom<ProductRequest> for NewProduct {
    type Error = GroceryError;
    fn try_from(r: ProductRequest) -> Result<Self, GroceryError> {
        let price = Money::new(r.price).map_err(|e| GroceryError::validation(e.to_string()))?;
        Ok(NewProduct { name: r.name, price, stock: r.stock, category: r.category, description: r.description, image: r.image })
    }
}

pub async fn list_products(State(s): State<AppState>) -> ApiResult {
    let items = s.catalog.list_products().await?;
    Ok(ok("Items retrieved", json!({ "items": items })))
}

pub async fn get_product(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult {
    let item = s.catalog.get_product(id).await?;
    Ok(ok("Item retrieved", json!({ "item": item })))
}

pub async fn create_product(State(s): State<AppState>, ApiJson(r): ApiJson<ProductRequest>) -> ApiResult<(StatusCode, Json<Envelope>)> {
    r.validate()?;
    let item = s.catalog.create_product(r.try_into()?).await?;
    Ok(created("Item added", json!({ "item": item })))
}

pub async fn update_product(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<ProductRequest>) -> ApiResult {
    r.validate()?;
    let item = s.catalog.update_product(id, r.try_into()?).await?;
    Ok(ok("Item updated", json!({ "item": item })))
}

pub async fn delete_product(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult {
    s.catalog.delete_product(id).await?;
    Ok(ok("Item deleted", json!({ "id": id })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockEntryRequest {
    #[serde(alias = "item_id")]
    pub product_id: Uuid,
    #[serde(alias = "quantity")]
    #[validate(range(min = 1))]
    pub quantity_added: i64,
}

pub async fn add_stock_entry(State(s): State<AppState>, ApiJson(r): ApiJson<StockEntryRequest>) -> ApiResult {
    r.validate()?;
    let stock = s.catalog.add_stock(r.product_id, r.quantity_added).await?;
    Ok(ok("Stock added", json!({ "product_id": r.product_id, "stock": stock })))
}

#[derive(Debug, Deserialize)]
pub struct StockReportQuery {
    pub date: Option<NaiveDate>,
}

pub async fn stock_report(State(s): State<AppState>, ApiQuery(q): ApiQuery<StockReportQuery>) -> ApiResult {
    let day = q.date.unwrap_or_else(|| Utc::now().date_naive());
    let entries = s.catalog.stock_report(day).await?;
    Ok(ok("Stock report", json!({ "date": day, "entries": entries })))
}
