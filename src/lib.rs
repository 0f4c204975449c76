//! EazzyMart grocery backend
//!
//! REST backend for a small grocery store: storefront checkout, cashier and
//! admin order handling, inventory, and return/refund processing.
//!
//! ## Features
//! - Product catalogue with an audited stock ledger
//! - Order lifecycle per order type (Delivery / Pickup) with stock reservation
//! - Return and refund workflow for completed orders
//! - Background auto-completion of stale deliveries
//! - Customer accounts with hashed passwords and e-mail OTP

use thiserror::Error;
use uuid::Uuid;

pub mod api;
pub mod config;
pub mod domain;
pub mod notify;
pub mod services;
pub mod store;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum GroceryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cannot change status from \"{from}\" to \"{to}\". Valid next statuses: {}", list_or_none(.allowed))]
    InvalidTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        available: i64,
        requested: i64,
    },

    #[error("Return/Refund can only be requested for completed orders. Order {order_id} is {status}")]
    OrderNotEligible { order_id: String, status: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl GroceryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<validator::ValidationErrors> for GroceryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

fn list_or_none(allowed: &[String]) -> String {
    if allowed.is_empty() {
        "None (order is in a final state)".to_string()
    } else {
        allowed.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, GroceryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_lists_next_states() {
        let err = GroceryError::InvalidTransition {
            from: "Pending".into(),
            to: "Delivered".into(),
            allowed: vec!["In Process".into(), "Cancelled".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cannot change status from \"Pending\" to \"Delivered\". Valid next statuses: In Process, Cancelled"
        );
    }

    #[test]
    fn test_invalid_transition_from_terminal() {
        let err = GroceryError::InvalidTransition { from: "Cancelled".into(), to: "Cancelled".into(), allowed: vec![] };
        assert!(err.to_string().ends_with("None (order is in a final state)"));
    }
}
