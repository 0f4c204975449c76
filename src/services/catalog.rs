//! Product catalogue and restocking.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::aggregates::{NewProduct, Product};
use crate::store::inventory::{self, StockEntry};
use crate::store::Store;
use crate::Result;

#[derive(Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self { Self { store } }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let mut conn = self.store.pool().acquire().await?;
        inventory::list_products(&mut conn).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        let mut conn = self.store.pool().acquire().await?;
        inventory::get_product(&mut conn, id).await
    }

    pub async fn create_product(&self, fields: NewProduct) -> Result<Product> {
        let product = Product::create(fields, Utc::now())?;
        let mut tx = self.store.begin_write().await?;
        inventory::insert_product(tx.conn(), &product).await?;
        tx.commit().await?;
        tracing::info!(product_id = %product.id(), name = product.name(), "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, fields: NewProduct) -> Result<Product> {
        let mut tx = self.store.begin_write().await?;
        let mut product = inventory::get_product(tx.conn(), id).await?;
        product.update(fields, Utc::now())?;
        inventory::update_product(tx.conn(), &product).await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        let mut tx = self.store.begin_write().await?;
        inventory::delete_product(tx.conn(), id).await?;
        tx.commit().await
    }

    /// Credits the ledger and records the restock. Returns the new stock level.
    pub async fn add_stock(&self, product_id: Uuid, quantity: i64) -> Result<i64> {
        let mut tx = self.store.begin_write().await?;
        let stock = inventory::add_stock_entry(tx.conn(), product_id, quantity, Utc::now()).await?;
        tx.commit().await?;
        tracing::info!(%product_id, quantity, stock, "stock added");
        Ok(stock)
    }

    pub async fn stock_report(&self, day: NaiveDate) -> Result<Vec<StockEntry>> {
        let mut conn = self.store.pool().acquire().await?;
        inventory::stock_entries_on(&mut conn, day).await
    }
}
