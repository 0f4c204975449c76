//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    id: Uuid,
    name: String,
    price: Money,
    stock: i64,
    category: Option<String>,
    description: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Editable product fields, used for both creation and admin edits.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl NewProduct {
    fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.stock < 0 { return Err(ProductError::NegativeStock); }
        Ok(())
    }
}

impl Product {
    pub fn create(fields: NewProduct, now: DateTime<Utc>) -> Result<Self, ProductError> {
        fields.validate()?;
        Ok(Self {
            id: Uuid::now_v7(), name: fields.name.trim().to_string(), price: fields.price, stock: fields.stock,
            category: fields.category, description: fields.description, image: fields.image,
            created_at: now, updated_at: now,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: Uuid, name: String, price: Money, stock: i64, category: Option<String>, description: Option<String>,
        image: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, name, price, stock, category, description, image, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> Money { self.price }
    pub fn stock(&self) -> i64 { self.stock }
    pub fn category(&self) -> Option<&str> { self.category.as_deref() }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn image(&self) -> Option<&str> { self.image.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Admin edit. Absolute stock edits are allowed but never below zero.
    pub fn update(&mut self, fields: NewProduct, now: DateTime<Utc>) -> Result<(), ProductError> {
        fields.validate()?;
        self.name = fields.name.trim().to_string();
        self.price = fields.price;
        self.stock = fields.stock;
        self.category = fields.category;
        self.description = fields.description;
        self.image = fields.image;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, NegativeStock }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Product name is required"),
            Self::NegativeStock => write!(f, "Stock cannot be negative"),
        }
    }
}

impl From<ProductError> for crate::GroceryError {
    fn from(e: ProductError) -> Self { Self::Validation(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn fields(stock: i64) -> NewProduct {
        NewProduct {
            name: " Eggs ".into(), price: Money::new(Decimal::new(1250, 2)).unwrap(), stock,
            category: None, description: None, image: None,
        }
    }

    #[test]
    fn test_product_create() {
        let p = Product::create(fields(12), Utc::now()).unwrap();
        assert_eq!(p.name(), "Eggs");
        assert_eq!(p.stock(), 12);
    }

    #[test]
    fn test_negative_stock_rejected() {
        assert_eq!(Product::create(fields(-1), Utc::now()).unwrap_err(), ProductError::NegativeStock);
        let mut p = Product::create(fields(0), Utc::now()).unwrap();
        assert_eq!(p.stock(), 0);
        assert_eq!(p.update(fields(-3), Utc::now()).unwrap_err(), ProductError::NegativeStock);
    }
}
