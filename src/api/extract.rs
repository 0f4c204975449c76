//! Extractors whose rejections come back as the JSON envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{FromRequest, FromRequestParts};

use crate::GroceryError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(GroceryError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(GroceryError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(GroceryError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for GroceryError {
    fn from(rejection: JsonRejection) -> Self {
        GroceryError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for GroceryError {
    fn from(rejection: PathRejection) -> Self {
        GroceryError::validation(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for GroceryError {
    fn from(rejection: QueryRejection) -> Self {
        GroceryError::validation(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for GroceryError {
    fn from(rejection: MultipartRejection) -> Self {
        GroceryError::validation(format!("Invalid form: {}", rejection.body_text()))
    }
}
