//! Response envelope and error mapping.
//!
//! Every body is `{ "success": bool, "message": string, ...data }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::GroceryError;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

pub type ApiResult<T = Json<Envelope>> = std::result::Result<T, GroceryError>;

/// Success body. `data` must serialize to a JSON object (or null); its keys
/// are merged next to `success` and `message`.
pub fn ok(message: impl Into<String>, data: Value) -> Json<Envelope> {
    Json(Envelope { success: true, message: message.into(), data: into_map(data) })
}

pub fn created(message: impl Into<String>, data: Value) -> (StatusCode, Json<Envelope>) {
    (StatusCode::CREATED, ok(message, data))
}

fn into_map(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => Map::from_iter([("data".to_string(), other)]),
    }
}

impl IntoResponse for GroceryError {
    fn into_response(self) -> Response {
        let (status, extra) = match &self {
            GroceryError::NotFound { .. } => (StatusCode::NOT_FOUND, Value::Null),
            GroceryError::InvalidTransition { from, to, allowed } => (
                StatusCode::BAD_REQUEST,
                json!({ "current_status": from, "requested_status": to, "allowed_next": allowed }),
            ),
            GroceryError::Validation(_) => (StatusCode::BAD_REQUEST, Value::Null),
            GroceryError::OrderNotEligible { order_id, status } => {
                (StatusCode::BAD_REQUEST, json!({ "order_id": order_id, "current_status": status }))
            }
            GroceryError::InsufficientStock { product_id, available, requested } => (
                StatusCode::CONFLICT,
                json!({ "product_id": product_id, "available": available, "requested": requested }),
            ),
            GroceryError::Conflict(_) => (StatusCode::CONFLICT, Value::Null),
            GroceryError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, Value::Null),
            GroceryError::Database(_) | GroceryError::Storage(_) | GroceryError::Corrupt(_) => {
                tracing::error!(error = %self, "request failed");
                let body = Envelope { success: false, message: "Internal server error".into(), data: Map::new() };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        let body = Envelope { success: false, message: self.to_string(), data: into_map(extra) };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_flattens_data() {
        let Json(body) = ok("Order accepted", json!({ "orderId": "ORD-20240502-0001" }));
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, json!({ "success": true, "message": "Order accepted", "orderId": "ORD-20240502-0001" }));
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (GroceryError::not_found("Order", "x"), StatusCode::NOT_FOUND),
            (GroceryError::validation("bad"), StatusCode::BAD_REQUEST),
            (GroceryError::Conflict("dup".into()), StatusCode::CONFLICT),
            (GroceryError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (GroceryError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                GroceryError::OrderNotEligible { order_id: "x".into(), status: "Pending".into() },
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
