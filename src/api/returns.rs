//! Return/refund endpoints.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::response::{created, ok, ApiResult, Envelope};
use crate::api::AppState;
use crate::domain::aggregates::{RequestType, ReturnStatus};
use crate::services::Evidence;
use crate::GroceryError;

fn multipart_error(e: axum::extract::multipart::MultipartError) -> GroceryError {
    GroceryError::validation(format!("Multipart error: {e}"))
}

/// `multipart/form-data` with `order_id`, `reason`, optional `request_type`
/// and an optional `image` file.
pub async fn submit_request(
    State(s): State<AppState>, form: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Envelope>)> {
    let mut form = form?;
    let (mut order_id, mut reason, mut request_type, mut evidence) = (None, None, None, None);
    while let Some(field) = form.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    evidence = Some(Evidence { file_name, bytes: bytes.to_vec() });
                }
            }
            "order_id" => order_id = Some(field.text().await.map_err(multipart_error)?),
            "reason" => reason = Some(field.text().await.map_err(multipart_error)?),
            "request_type" => request_type = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let order_id = order_id.filter(|o| !o.trim().is_empty());
    let reason = reason.filter(|r| !r.trim().is_empty());
    let (Some(order_id), Some(reason)) = (order_id, reason) else {
        return Err(GroceryError::validation("Order ID and reason are required"));
    };
    let request_type = match request_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => Some(t.parse::<RequestType>()?),
        None => None,
    };

    let request = s.returns.submit_request(order_id.trim(), &reason, request_type, evidence).await?;
    Ok(created("Return/Refund request submitted successfully", json!({ "requestId": request.id(), "request": {
        "id": request.id(),
        "order_id": request.order_id(),
        "status": request.status().as_str(),
        "request_type": request.request_type().as_str(),
        "image_path": request.image_path(),
    }})))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub username: Option<String>,
    pub user_id: Option<Uuid>,
}

pub async fn list_requests(State(s): State<AppState>, ApiQuery(q): ApiQuery<ListQuery>) -> ApiResult {
    let owner = match (q.username.as_deref().map(str::trim).filter(|u| !u.is_empty()), q.user_id) {
        (Some(username), _) => match s.users.find_by_username(username).await? {
            Some(user) => Some(user.id()),
            None => return Ok(ok("Return/Refund requests retrieved", json!({ "requests": [] }))),
        },
        (None, user_id) => user_id,
    };
    let requests = s.returns.list_requests(owner).await?;
    Ok(ok("Return/Refund requests retrieved", json!({ "requests": requests })))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    pub admin_notes: Option<String>,
    #[serde(default, rename = "override")]
    pub admin_override: bool,
}

pub async fn set_status(
    State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<SetStatusRequest>,
) -> ApiResult {
    let to: ReturnStatus = r.status.parse()?;
    let request = s.returns.set_status(id, to, r.admin_notes, r.admin_override).await?;
    Ok(ok(
        format!("Return/Refund request status updated to {to}"),
        json!({ "id": request.id(), "status": request.status().as_str(), "admin_notes": request.admin_notes() }),
    ))
}
