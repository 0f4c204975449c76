//! HTTP surface.

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::notify::{Notifier, OtpStore};
use crate::services::{CatalogService, OrderService, ReturnService, UserService};
use crate::store::evidence::EvidenceStore;
use crate::store::Store;

pub mod extract;
pub mod orders;
pub mod products;
pub mod response;
pub mod returns;
pub mod users;
pub mod views;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub returns: ReturnService,
    pub users: UserService,
}

impl AppState {
    pub fn new(store: Store, notifier: Arc<dyn Notifier>, config: &Config) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone(), notifier.clone()),
            returns: ReturnService::new(store.clone(), EvidenceStore::new(&config.upload_dir), notifier.clone()),
            users: UserService::new(store, Arc::new(OtpStore::new(config.otp_ttl)), notifier),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "message": "healthy", "service": "eazzymart" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ping", get(health))
        .route("/api/items", get(products::list_products).post(products::create_product))
        .route("/api/items/:id", get(products::get_product).put(products::update_product).delete(products::delete_product))
        .route("/api/stock-entry", post(products::add_stock_entry))
        .route("/api/stock-report", get(products::stock_report))
        .route("/api/customer/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/customer/login", post(users::login))
        .route("/api/reset-password", post(users::reset_password))
        .route("/api/user", get(users::list_users).post(users::create_user))
        .route("/api/user/:id", put(users::update_user).delete(users::delete_user))
        .route("/send-otp", post(users::send_otp))
        .route("/verify-otp", post(users::verify_otp))
        .route("/api/orders", post(orders::create_order))
        .route("/api/sales", get(orders::list_sales).post(orders::create_order))
        .route("/api/sales/report", get(orders::sales_report))
        .route("/api/orders/admin", get(orders::list_admin_orders))
        .route("/api/orders/customer", get(orders::list_customer_orders))
        .route("/api/orders/:order_id", get(orders::get_order))
        .route("/api/orders/:order_id/accept", put(orders::accept_order))
        .route("/api/orders/:order_id/cancel", put(orders::cancel_order))
        .route("/api/orders/:order_id/cancel-customer", put(orders::cancel_order_by_customer))
        .route("/api/orders/:order_id/status", put(orders::advance_status))
        .route("/api/orders/:order_id/received", put(orders::mark_received))
        .route("/api/return-refund", get(returns::list_requests).post(returns::submit_request))
        .route("/api/return-refund/:id/status", put(returns::set_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogNotifier;
    use crate::store::test_store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> (Router, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("eazzymart-api-{}", uuid::Uuid::now_v7()));
        let config = Config { upload_dir: root.clone(), ..Config::default() };
        let state = AppState::new(test_store().await, Arc::new(LogNotifier), &config);
        (router(state), root)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn seed_item(app: &Router, name: &str, price: &str, stock: i64) -> String {
        let (status, body) = call(app, "POST", "/api/items", Some(json!({ "name": name, "price": price, "stock": stock }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["item"]["id"].as_str().unwrap().to_string()
    }

    async fn place(app: &Router, item: &str, qty: u32) -> (StatusCode, Value) {
        call(app, "POST", "/api/orders", Some(json!({
            "items": [{ "id": item, "qty": qty }],
            "payment": "Cash On Delivery",
            "type": "Delivery",
            "address": "12 Mabini St",
            "contact": "09171234567",
        }))).await
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app().await;
        let (status, body) = call(&app, "GET", "/api/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_order_flow_over_http() {
        let (app, _) = app().await;
        let rice = seed_item(&app, "Rice", "50.00", 10).await;

        let (status, body) = place(&app, &rice, 2).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let order_id = body["orderId"].as_str().unwrap().to_string();
        assert!(order_id.starts_with("ORD-"));
        assert_eq!(body["order"]["total_amount"], "100.00");

        let (status, body) = call(&app, "PUT", &format!("/api/orders/{order_id}/status"), Some(json!({ "status": "Delivered" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["current_status"], "Pending");
        assert_eq!(body["allowed_next"], json!(["In Process", "Cancelled", "Rejected"]));

        let (status, _) = call(&app, "PUT", &format!("/api/orders/{order_id}/accept"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, "PUT", &format!("/api/orders/{order_id}/status"), Some(json!({
            "status": "Out for Delivery", "estimated_delivery_datetime": "2030-01-01T10:00:00Z",
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["order_status"], "Out for Delivery");
        let (status, body) = call(&app, "PUT", &format!("/api/orders/{order_id}/received"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["order_status"], "Delivered");

        let (_, body) = call(&app, "GET", "/api/orders/admin", None).await;
        assert_eq!(body["orders"].as_array().unwrap().len(), 1);
        let (_, body) = call(&app, "GET", "/api/sales", None).await;
        let sale = &body["sales"][0];
        assert_eq!(sale["order_id"], order_id.as_str());
        assert_eq!(sale["customer"], "09171234567");
        assert_eq!(sale["type"], "Delivery");
        assert_eq!(sale["items"][0]["qty"], 2);
    }

    #[tokio::test]
    async fn test_short_stock_is_conflict() {
        let (app, _) = app().await;
        let eggs = seed_item(&app, "Eggs", "30.00", 1).await;
        let (status, body) = place(&app, &eggs, 3).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["available"], 1);
        assert_eq!(body["requested"], 3);
        let (_, body) = call(&app, "GET", &format!("/api/items/{eggs}"), None).await;
        assert_eq!(body["item"]["stock"], 1);
    }

    #[tokio::test]
    async fn test_malformed_requests_use_envelope() {
        let (app, _) = app().await;
        let (status, body) = call(&app, "POST", "/api/orders", Some(json!({ "items": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));

        let (status, body) = call(&app, "GET", "/api/items/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(&app, "GET", "/api/stock-report?date=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(&app, "POST", "/api/orders", Some(json!({
            "items": [], "payment": "Cash On Delivery", "type": "Delivery", "address": "12 Mabini St",
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("at least one item"));
    }

    #[tokio::test]
    async fn test_sales_report() {
        let (app, _) = app().await;
        let rice = seed_item(&app, "Rice", "50.00", 10).await;
        place(&app, &rice, 2).await;
        let (_, body) = place(&app, &rice, 1).await;
        let order_id = body["orderId"].as_str().unwrap().to_string();
        let (status, _) = call(&app, "PUT", &format!("/api/orders/{order_id}/cancel"), Some(json!({ "reason": "out of stock" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", "/api/sales/report", None).await;
        assert_eq!(status, StatusCode::OK);
        let report = &body["report"];
        assert_eq!(report["totalSales"], 2);
        assert_eq!(report["totalRevenue"], "100.00");
        assert_eq!(report["statusCounts"]["Cancelled"], 1);
        assert_eq!(report["paymentSummary"]["Cash On Delivery"], "100.00");
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let (app, _) = app().await;
        let (status, body) = call(&app, "PUT", "/api/orders/ORD-20240101-0001/accept", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_customer_cancel_restores_stock() {
        let (app, _) = app().await;
        let milk = seed_item(&app, "Milk", "90.00", 5).await;
        let (_, body) = place(&app, &milk, 2).await;
        let order_id = body["orderId"].as_str().unwrap().to_string();

        let uri = format!("/api/orders/{order_id}/cancel-customer");
        let (status, _) = call(&app, "PUT", &uri, Some(json!({ "reason": "no" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = call(&app, "PUT", &uri, Some(json!({ "reason": "ordered by mistake" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["order_status"], "Cancelled");
        assert_eq!(body["refundRequestId"], Value::Null);

        let (_, body) = call(&app, "GET", &format!("/api/items/{milk}"), None).await;
        assert_eq!(body["item"]["stock"], 5);
    }

    #[tokio::test]
    async fn test_return_request_needs_fulfilled_order() {
        let (app, root) = app().await;
        let soap = seed_item(&app, "Soap", "35.00", 5).await;
        let (_, body) = place(&app, &soap, 1).await;
        let order_id = body["orderId"].as_str().unwrap().to_string();

        let boundary = "X-EAZZYMART-BOUNDARY";
        let form = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"order_id\"\r\n\r\n{order_id}\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"reason\"\r\n\r\nDamaged\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"box.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
        );
        let submit = |form: String| {
            Request::builder()
                .method("POST")
                .uri("/api/return-refund")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(form))
                .unwrap()
        };

        let response = app.clone().oneshot(submit(form.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!root.join("return-refund").exists());

        for step in ["accept", "status", "received"] {
            let body = (step == "status").then(|| json!({ "status": "Out for Delivery" }));
            let (status, _) = call(&app, "PUT", &format!("/api/orders/{order_id}/{step}"), body).await;
            assert_eq!(status, StatusCode::OK);
        }
        let response = app.clone().oneshot(submit(form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["request"]["status"], "Pending");
        assert_eq!(body["request"]["request_type"], "Return");
        let request_id = body["requestId"].as_str().unwrap().to_string();

        let (_, body) = call(&app, "GET", "/api/return-refund", None).await;
        assert_eq!(body["requests"].as_array().unwrap().len(), 1);

        let uri = format!("/api/return-refund/{request_id}/status");
        let (status, body) = call(&app, "PUT", &uri, Some(json!({ "status": "Shipped" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("Pending, Approved, Returned, Refunded, Rejected"));
        let (status, _) = call(&app, "PUT", &uri, Some(json!({ "status": "Returned", "override": true }))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", &format!("/api/orders/{order_id}"), None).await;
        assert_eq!(body["order"]["order_status"], "Returned");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_register_login_and_customer_orders() {
        let (app, _) = app().await;
        let (status, _) = call(&app, "POST", "/api/customer/register", Some(json!({
            "username": "maria.santos", "password": "secret-pass", "firstname": "Maria", "lastname": "Santos",
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(&app, "POST", "/api/customer/register", Some(json!({
            "username": "maria.santos", "password": "secret-pass",
        }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&app, "POST", "/api/login", Some(json!({ "username": "maria.santos", "password": "secret-pass" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["firstname"], "Maria");
        assert!(body["user"].get("password_hash").is_none());
        let (status, _) = call(&app, "POST", "/api/login", Some(json!({ "username": "maria.santos", "password": "wrong-pass" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let bread = seed_item(&app, "Bread", "45.00", 5).await;
        let (status, _) = call(&app, "POST", "/api/sales", Some(json!({
            "items": [{ "product_id": bread, "quantity": 1 }],
            "payment": "GCash", "trnumber": "GC-1234", "type": "Pick up", "createdbyuser": "maria.santos",
        }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(&app, "GET", "/api/orders/customer?username=maria.santos", None).await;
        let orders = body["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["shipping_address"], "Store Pickup");
        assert_eq!(orders[0]["allowed_next"], json!(["In Process", "Cancelled", "Rejected"]));
        let (status, _) = call(&app, "GET", "/api/orders/customer", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&app, "GET", "/api/sales", None).await;
        assert_eq!(body["sales"][0]["customer"], "Maria Santos");
    }
}
