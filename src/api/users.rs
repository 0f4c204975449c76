//! Accounts, login and OTP endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::response::{created, ok, ApiResult, Envelope};
use crate::api::AppState;
use crate::domain::aggregates::{Profile, Role};
use crate::services::UserUpdate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 6, max = 50, message = "Username must be 6-50 characters long."))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

pub async fn register(State(s): State<AppState>, ApiJson(r): ApiJson<RegisterRequest>) -> ApiResult<(StatusCode, Json<Envelope>)> {
    r.validate()?;
    let user = s.users.register(&r.username, &r.password, r.profile).await?;
    Ok(created("Registration successful", json!({ "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(State(s): State<AppState>, ApiJson(r): ApiJson<LoginRequest>) -> ApiResult {
    let user = s.users.login(&r.username, &r.password).await?;
    Ok(ok("Login successful", json!({ "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub otp: String,
    #[serde(alias = "newPassword", alias = "password")]
    pub new_password: String,
}

pub async fn reset_password(State(s): State<AppState>, ApiJson(r): ApiJson<ResetPasswordRequest>) -> ApiResult {
    s.users.reset_password(&r.username, &r.otp, &r.new_password).await?;
    Ok(ok("Password reset successful", json!({})))
}

pub async fn list_users(State(s): State<AppState>) -> ApiResult {
    let users = s.users.list_users().await?;
    Ok(ok("Users retrieved", json!({ "users": users })))
}

/// Admin create; the role defaults to cashier.
pub async fn create_user(State(s): State<AppState>, ApiJson(r): ApiJson<RegisterRequest>) -> ApiResult<(StatusCode, Json<Envelope>)> {
    r.validate()?;
    let role = match r.role.as_deref() {
        Some(role) => role.parse()?,
        None => Role::Cashier,
    };
    let user = s.users.create_user(&r.username, &r.password, role, r.profile).await?;
    Ok(created("User created", json!({ "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_verified: Option<bool>,
    pub password: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
}

pub async fn update_user(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>, ApiJson(r): ApiJson<UpdateUserRequest>) -> ApiResult {
    let role: Option<Role> = r.role.as_deref().map(str::parse).transpose()?;
    let touches_profile = r.firstname.is_some() || r.lastname.is_some() || r.gender.is_some() || r.birth_date.is_some();
    let profile = touches_profile.then(|| Profile {
        firstname: r.firstname, lastname: r.lastname, gender: r.gender, birth_date: r.birth_date,
    });
    let user = s.users.update_user(id, UserUpdate { profile, role, is_verified: r.is_verified, password: r.password }).await?;
    Ok(ok("User updated", json!({ "user": user })))
}

pub async fn delete_user(State(s): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult {
    s.users.delete_user(id).await?;
    Ok(ok("User deleted", json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

pub async fn send_otp(State(s): State<AppState>, ApiJson(r): ApiJson<SendOtpRequest>) -> ApiResult {
    s.users.send_otp(&r.email)?;
    Ok(ok("OTP sent successfully", json!({})))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

pub async fn verify_otp(State(s): State<AppState>, ApiJson(r): ApiJson<VerifyOtpRequest>) -> ApiResult {
    s.users.verify_otp(&r.email, &r.otp).await?;
    Ok(ok("OTP verified successfully", json!({})))
}
