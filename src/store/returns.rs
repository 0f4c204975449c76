//! Return/refund request persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

use crate::domain::aggregates::ReturnRequest;
use crate::domain::value_objects::Money;
use crate::{GroceryError, Result};

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: Uuid,
    order_id: String,
    user_id: Option<Uuid>,
    reason: String,
    image_path: Option<String>,
    request_type: String,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for ReturnRequest {
    type Error = GroceryError;
    fn try_from(r: ReturnRow) -> Result<Self> {
        let corrupt = |e: crate::domain::aggregates::ReturnError| GroceryError::Corrupt(format!("request {}: {e}", r.id));
        let request_type = r.request_type.parse().map_err(corrupt)?;
        let status = r.status.parse().map_err(corrupt)?;
        Ok(ReturnRequest::rehydrate(
            r.id, r.order_id, r.user_id, r.reason, r.image_path, request_type, status, r.admin_notes, r.created_at, r.updated_at,
        ))
    }
}

/// Request joined with the order and customer it belongs to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReturnRequestView {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Option<Uuid>,
    pub reason: String,
    pub image_path: Option<String>,
    pub status: String,
    pub request_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub admin_notes: Option<String>,
    #[serde(skip)]
    pub total_cents: Option<i64>,
    #[sqlx(skip)]
    pub total_amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub order_status: Option<String>,
    pub customer_name: Option<String>,
}

pub async fn insert(conn: &mut SqliteConnection, r: &ReturnRequest) -> Result<()> {
    sqlx::query(
        "INSERT INTO return_refund_requests (id, order_id, user_id, reason, image_path, request_type, status, admin_notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(r.id()).bind(r.order_id()).bind(r.user_id()).bind(r.reason()).bind(r.image_path())
    .bind(r.request_type().as_str()).bind(r.status().as_str()).bind(r.admin_notes())
    .bind(r.created_at()).bind(r.updated_at())
    .execute(conn).await?;
    Ok(())
}

pub async fn save(conn: &mut SqliteConnection, r: &ReturnRequest) -> Result<()> {
    sqlx::query("UPDATE return_refund_requests SET status = ?2, admin_notes = ?3, updated_at = ?4 WHERE id = ?1")
        .bind(r.id()).bind(r.status().as_str()).bind(r.admin_notes()).bind(r.updated_at())
        .execute(conn).await?;
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: Uuid) -> Result<ReturnRequest> {
    sqlx::query_as::<_, ReturnRow>("SELECT * FROM return_refund_requests WHERE id = ?1")
        .bind(id).fetch_optional(conn).await?
        .ok_or_else(|| GroceryError::not_found("Return/Refund request", id))?
        .try_into()
}

/// Newest first; everything, or what belongs to `user_id` as requester or order owner.
pub async fn list(conn: &mut SqliteConnection, user_id: Option<Uuid>) -> Result<Vec<ReturnRequestView>> {
    let base = "SELECT r.id, r.order_id, r.user_id, r.reason, r.image_path, r.status, r.request_type, r.created_at, \
                r.updated_at, r.admin_notes, o.total_cents, o.payment_method, o.status AS order_status, \
                NULLIF(TRIM(COALESCE(u.firstname, '') || ' ' || COALESCE(u.lastname, '')), '') AS customer_name \
                FROM return_refund_requests r \
                LEFT JOIN orders o ON r.order_id = o.order_id \
                LEFT JOIN users u ON r.user_id = u.id";
    let mut rows = match user_id {
        Some(user_id) => {
            let sql = format!("{base} WHERE r.user_id = ?1 OR o.user_id = ?1 ORDER BY r.created_at DESC");
            sqlx::query_as::<_, ReturnRequestView>(&sql).bind(user_id).fetch_all(conn).await?
        }
        None => {
            let sql = format!("{base} ORDER BY r.created_at DESC");
            sqlx::query_as::<_, ReturnRequestView>(&sql).fetch_all(conn).await?
        }
    };
    for row in &mut rows {
        row.total_amount = row.total_cents.map(|c| Money::from_cents(c).amount());
    }
    Ok(rows)
}
