//! Customer and staff accounts, login and e-mail OTP.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Profile, PublicUser, Role, User};
use crate::notify::otp::OtpCheck;
use crate::notify::{self, Notifier, OtpStore};
use crate::store::{users, Store};
use crate::{GroceryError, Result};

const BAD_CREDENTIALS: &str = "Invalid password";

/// Admin edit of an account. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub profile: Option<Profile>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Store,
    otp: Arc<OtpStore>,
    notifier: Arc<dyn Notifier>,
}

impl UserService {
    pub fn new(store: Store, otp: Arc<OtpStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, otp, notifier }
    }

    /// Storefront sign-up; always a customer.
    pub async fn register(&self, username: &str, password: &str, profile: Profile) -> Result<PublicUser> {
        self.create_user(username, password, Role::Customer, profile).await
    }

    pub async fn create_user(&self, username: &str, password: &str, role: Role, profile: Profile) -> Result<PublicUser> {
        let user = User::register(username, password, role, profile, Utc::now())?;
        let mut tx = self.store.begin_write().await?;
        users::insert(tx.conn(), &user).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id(), role = user.role().as_str(), "user created");
        Ok(user.public())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser> {
        let mut conn = self.store.pool().acquire().await?;
        let user = users::find_by_username(&mut conn, username).await?
            .ok_or_else(|| GroceryError::not_found("User", username.trim()))?;
        if !user.verify_password(password) {
            return Err(GroceryError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        Ok(user.public())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut conn = self.store.pool().acquire().await?;
        users::find_by_username(&mut conn, username).await
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>> {
        let mut conn = self.store.pool().acquire().await?;
        Ok(users::list(&mut conn).await?.iter().map(User::public).collect())
    }

    pub async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<PublicUser> {
        let mut tx = self.store.begin_write().await?;
        let mut user = users::get(tx.conn(), id).await?;
        let profile = update.profile.unwrap_or_else(|| user.profile().clone());
        let role = update.role.unwrap_or(user.role());
        let is_verified = update.is_verified.unwrap_or(user.is_verified());
        user.update(profile, role, is_verified);
        if let Some(password) = update.password.as_deref().filter(|p| !p.is_empty()) {
            user.set_password(password)?;
        }
        users::save(tx.conn(), &user).await?;
        tx.commit().await?;
        Ok(user.public())
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        let mut tx = self.store.begin_write().await?;
        users::delete(tx.conn(), id).await?;
        tx.commit().await
    }

    /// Mails a fresh code. The code itself is never returned to the caller.
    pub fn send_otp(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if !validator::validate_email(email) {
            return Err(GroceryError::validation("A valid email is required"));
        }
        let code = self.otp.issue(email);
        let minutes = (self.otp.ttl().as_secs() / 60).max(1);
        notify::dispatch(self.notifier.clone(), notify::otp_code(email, &code, minutes));
        Ok(())
    }

    /// Checks a code and marks the matching account verified, if there is one.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<()> {
        self.check_otp(email, code)?;
        let mut tx = self.store.begin_write().await?;
        if let Some(mut user) = users::find_by_username(tx.conn(), email).await? {
            user.mark_verified();
            users::save(tx.conn(), &user).await?;
        }
        tx.commit().await
    }

    /// The code is only spent once the account and the new password check out.
    pub async fn reset_password(&self, username: &str, code: &str, new_password: &str) -> Result<()> {
        let mut tx = self.store.begin_write().await?;
        let mut user = users::find_by_username(tx.conn(), username).await?
            .ok_or_else(|| GroceryError::not_found("User", username))?;
        user.set_password(new_password)?;
        self.check_otp(username, code)?;
        users::save(tx.conn(), &user).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id(), "password reset");
        Ok(())
    }

    fn check_otp(&self, email: &str, code: &str) -> Result<()> {
        match self.otp.verify(email, code) {
            OtpCheck::Valid => Ok(()),
            OtpCheck::Invalid => Err(GroceryError::validation("Invalid OTP")),
            OtpCheck::Expired => Err(GroceryError::validation("OTP has expired")),
            OtpCheck::Missing => Err(GroceryError::validation("No OTP was requested for this email")),
        }
    }
}
